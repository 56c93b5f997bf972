//! Realtime notification fan-out.
//!
//! One user can hold several live WebSocket connections (phone plus
//! laptop). The registry maps a user id to every open connection's event
//! channel. Sends go through bounded channels; the socket task on the
//! other end does the actual network write, so the registry lock is never
//! held across I/O.

use std::collections::HashMap;
use std::sync::Mutex;

use rusqlite::Connection;
use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::db::repository::notification as notification_repo;
use crate::db::DatabaseError;
use crate::models::Notification;

/// Per-connection event buffer. A slow reader that falls this far behind
/// loses events rather than blocking the sender.
const EVENT_BUFFER: usize = 32;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsEvent {
    Connected { user_id: Uuid },
    Notification { notification: Notification },
}

struct ConnectionHandle {
    id: Uuid,
    tx: mpsc::Sender<WsEvent>,
}

#[derive(Default)]
pub struct ConnectionRegistry {
    inner: Mutex<HashMap<Uuid, Vec<ConnectionHandle>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection for the user and hand back its event receiver.
    pub fn register(&self, user_id: Uuid) -> (Uuid, mpsc::Receiver<WsEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let conn_id = Uuid::new_v4();
        let mut inner = self.inner.lock().expect("registry lock");
        inner
            .entry(user_id)
            .or_default()
            .push(ConnectionHandle { id: conn_id, tx });
        (conn_id, rx)
    }

    /// Drop one connection; the user's entry disappears with its last
    /// connection.
    pub fn unregister(&self, user_id: &Uuid, conn_id: &Uuid) {
        let mut inner = self.inner.lock().expect("registry lock");
        if let Some(handles) = inner.get_mut(user_id) {
            handles.retain(|h| h.id != *conn_id);
            if handles.is_empty() {
                inner.remove(user_id);
            }
        }
    }

    pub fn connection_count(&self, user_id: &Uuid) -> usize {
        self.inner
            .lock()
            .expect("registry lock")
            .get(user_id)
            .map_or(0, Vec::len)
    }

    /// Push an event to every open connection of the user. Returns how many
    /// connections accepted it. Closed connections found along the way are
    /// pruned; a full buffer drops the event for that connection only.
    pub fn notify(&self, user_id: &Uuid, event: &WsEvent) -> usize {
        let senders: Vec<(Uuid, mpsc::Sender<WsEvent>)> = {
            let inner = self.inner.lock().expect("registry lock");
            match inner.get(user_id) {
                Some(handles) => handles.iter().map(|h| (h.id, h.tx.clone())).collect(),
                None => return 0,
            }
        };

        let mut delivered = 0;
        let mut closed = Vec::new();
        for (id, tx) in senders {
            match tx.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Closed(_)) => closed.push(id),
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(%user_id, connection = %id, "event buffer full, dropping event");
                }
            }
        }

        for id in &closed {
            self.unregister(user_id, id);
        }
        delivered
    }
}

/// Persist a notification, then push it to live connections.
///
/// The insert happens first so the notification survives even when the
/// user is offline; a failed push never fails the write.
pub fn create_notification(
    conn: &Connection,
    registry: &ConnectionRegistry,
    notification: &Notification,
) -> Result<(), DatabaseError> {
    notification_repo::insert_notification(conn, notification)?;
    let delivered = registry.notify(
        &notification.user_id,
        &WsEvent::Notification {
            notification: notification.clone(),
        },
    );
    tracing::debug!(
        user_id = %notification.user_id,
        delivered,
        "notification stored and pushed"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::models::enums::NotificationType;
    use chrono::Utc;

    fn event() -> WsEvent {
        WsEvent::Connected {
            user_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn fan_out_reaches_every_connection_of_the_user() {
        let registry = ConnectionRegistry::new();
        let user = Uuid::new_v4();
        let (_c1, mut rx1) = registry.register(user);
        let (_c2, mut rx2) = registry.register(user);

        assert_eq!(registry.notify(&user, &event()), 2);
        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn notify_is_scoped_to_one_user() {
        let registry = ConnectionRegistry::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let (_c, mut alice_rx) = registry.register(alice);
        let (_c, mut bob_rx) = registry.register(bob);

        assert_eq!(registry.notify(&alice, &event()), 1);
        assert!(alice_rx.try_recv().is_ok());
        assert!(bob_rx.try_recv().is_err());
    }

    #[test]
    fn unregister_removes_empty_entries() {
        let registry = ConnectionRegistry::new();
        let user = Uuid::new_v4();
        let (conn_id, _rx) = registry.register(user);
        assert_eq!(registry.connection_count(&user), 1);

        registry.unregister(&user, &conn_id);
        assert_eq!(registry.connection_count(&user), 0);
        assert_eq!(registry.notify(&user, &event()), 0);
    }

    #[test]
    fn closed_connections_are_pruned_on_notify() {
        let registry = ConnectionRegistry::new();
        let user = Uuid::new_v4();
        let (_c1, rx1) = registry.register(user);
        let (_c2, mut rx2) = registry.register(user);
        drop(rx1);

        assert_eq!(registry.notify(&user, &event()), 1);
        assert!(rx2.try_recv().is_ok());
        assert_eq!(registry.connection_count(&user), 1);
    }

    #[test]
    fn notification_is_stored_even_with_no_listeners() {
        let conn = open_memory_database().unwrap();
        let registry = ConnectionRegistry::new();
        let user_id = Uuid::new_v4();
        conn.execute(
            "INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at)
             VALUES (?1, 'N', 'n@example.com', 'h', 'patient', ?2, ?2)",
            rusqlite::params![user_id.to_string(), Utc::now().to_rfc3339()],
        )
        .unwrap();

        let n = Notification {
            id: Uuid::new_v4(),
            user_id,
            kind: NotificationType::SystemAlert,
            title: "t".into(),
            message: "m".into(),
            read: false,
            created_at: Utc::now(),
        };
        create_notification(&conn, &registry, &n).unwrap();

        let stored = notification_repo::list_for_user(&conn, &user_id).unwrap();
        assert_eq!(stored.len(), 1);
        assert!(!stored[0].read);
    }
}
