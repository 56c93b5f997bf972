//! Realtime notification socket.
//!
//! Connection lifecycle:
//! 1. Client opens `GET /ws/notifications?token=xxx`. The access token is
//!    validated before the upgrade, so a bad token is an HTTP 401 and the
//!    connection never opens.
//! 2. On upgrade the connection is registered for the user and a
//!    `connected` event is sent.
//! 3. A sender task forwards registry events (channel → socket); the main
//!    loop watches for the peer closing.
//! 4. On close the connection is unregistered. Close is terminal; clients
//!    reconnect with a fresh token.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::{ApiContext, ApiError};
use crate::authz;
use crate::registry::WsEvent;

#[derive(Deserialize)]
pub struct WsAuthQuery {
    token: String,
}

pub async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(ctx): State<ApiContext>,
    Query(query): Query<WsAuthQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user = {
        let conn = ctx.db.lock().expect("db lock");
        authz::authenticate(&conn, &ctx.codec, &query.token)?
    };

    tracing::info!(user_id = %user.id, "websocket upgrade accepted");
    Ok(ws.on_upgrade(move |socket| handle_ws(socket, ctx, user.id)))
}

async fn handle_ws(socket: WebSocket, ctx: ApiContext, user_id: Uuid) {
    let (ws_sink, mut ws_stream) = socket.split();
    let (conn_id, rx) = ctx.registry.register(user_id);

    // Sender task: registry events → socket.
    let sender_handle = tokio::spawn(async move {
        let mut sink = ws_sink;
        let mut rx = rx;
        while let Some(event) = rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(j) => j,
                Err(_) => continue,
            };
            if sink.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    ctx.registry
        .notify(&user_id, &WsEvent::Connected { user_id });

    // Inbound messages carry no commands; the loop exists to observe the
    // peer going away.
    while let Some(msg) = ws_stream.next().await {
        match msg {
            Ok(Message::Close(_)) | Err(_) => break,
            _ => {}
        }
    }

    ctx.registry.unregister(&user_id, &conn_id);
    let _ = sender_handle.await;
    tracing::info!(user_id = %user_id, "websocket disconnected");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use futures_util::StreamExt;
    use tokio::net::TcpListener;
    use uuid::Uuid;

    use crate::api::router::build_router;
    use crate::api::ApiContext;
    use crate::db::repository::user as user_repo;
    use crate::models::enums::{NotificationType, Role};
    use crate::models::{Notification, User};
    use crate::registry;

    async fn setup_server() -> (String, ApiContext, tokio::task::JoinHandle<()>) {
        let ctx = ApiContext::for_tests();
        let app = build_router(ctx.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("ws://127.0.0.1:{}", addr.port()), ctx, handle)
    }

    fn seed_user(ctx: &ApiContext) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: "Sock".into(),
            email: format!("{}@example.com", Uuid::new_v4()),
            password_hash: "h".into(),
            role: Role::Patient,
            phone: None,
            created_at: now,
            updated_at: now,
        };
        let conn = ctx.db.lock().unwrap();
        user_repo::insert_user(&conn, &user).unwrap();
        user
    }

    #[tokio::test]
    async fn connect_receives_connected_event() {
        let (base, ctx, server) = setup_server().await;
        let user = seed_user(&ctx);
        let token = ctx.codec.issue_access(user.id, user.role, 30);

        let url = format!("{base}/ws/notifications?token={token}");
        let (mut ws, _) = tokio_tungstenite::connect_async(&url)
            .await
            .expect("ws connect failed");

        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timeout waiting for connected event")
            .expect("stream ended")
            .expect("ws error");
        let parsed: serde_json::Value =
            serde_json::from_str(&msg.into_text().unwrap()).unwrap();
        assert_eq!(parsed["type"], "connected");
        assert_eq!(parsed["user_id"], user.id.to_string());

        let _ = ws.close(None).await;
        server.abort();
    }

    #[tokio::test]
    async fn stored_notification_arrives_over_socket() {
        let (base, ctx, server) = setup_server().await;
        let user = seed_user(&ctx);
        let token = ctx.codec.issue_access(user.id, user.role, 30);

        let url = format!("{base}/ws/notifications?token={token}");
        let (mut ws, _) = tokio_tungstenite::connect_async(&url)
            .await
            .expect("ws connect failed");

        // Skip the connected event.
        let _ = ws.next().await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: user.id,
            kind: NotificationType::PrescriptionUploaded,
            title: "New prescription".into(),
            message: "A patient uploaded a prescription".into(),
            read: false,
            created_at: Utc::now(),
        };
        {
            let conn = ctx.db.lock().unwrap();
            registry::create_notification(&conn, &ctx.registry, &notification).unwrap();
        }

        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timeout waiting for notification")
            .expect("stream ended")
            .expect("ws error");
        let parsed: serde_json::Value =
            serde_json::from_str(&msg.into_text().unwrap()).unwrap();
        assert_eq!(parsed["type"], "notification");
        assert_eq!(
            parsed["notification"]["id"],
            notification.id.to_string()
        );
        assert_eq!(parsed["notification"]["kind"], "prescription_uploaded");

        let _ = ws.close(None).await;
        server.abort();
    }

    #[tokio::test]
    async fn invalid_token_rejects_upgrade() {
        let (base, _ctx, server) = setup_server().await;
        let url = format!("{base}/ws/notifications?token=not-a-token");
        let result = tokio_tungstenite::connect_async(&url).await;
        assert!(result.is_err(), "bad token must fail the handshake");
        server.abort();
    }

    #[tokio::test]
    async fn disconnect_unregisters_connection() {
        let (base, ctx, server) = setup_server().await;
        let user = seed_user(&ctx);
        let token = ctx.codec.issue_access(user.id, user.role, 30);

        let url = format!("{base}/ws/notifications?token={token}");
        let (mut ws, _) = tokio_tungstenite::connect_async(&url)
            .await
            .expect("ws connect failed");
        let _ = ws.next().await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(ctx.registry.connection_count(&user.id), 1);

        ws.close(None).await.unwrap();
        // Give the server loop a moment to observe the close frame.
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(ctx.registry.connection_count(&user.id), 0);

        server.abort();
    }
}
