//! Bearer-token middleware for the protected route tree.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::{ApiContext, ApiError};
use crate::authz;
use crate::models::User;

/// The authenticated caller, injected into request extensions.
#[derive(Clone)]
pub struct AuthUser(pub User);

pub async fn require_auth(
    State(ctx): State<ApiContext>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())
        .ok_or(ApiError::Unauthenticated("missing bearer token"))?;

    let user = {
        let conn = ctx.db.lock().expect("db lock");
        authz::authenticate(&conn, &ctx.codec, &token)?
    };

    req.extensions_mut().insert(AuthUser(user));
    Ok(next.run(req).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_prefix_is_required() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(bearer_token(&headers).is_none());

        headers.remove(AUTHORIZATION);
        assert!(bearer_token(&headers).is_none());
    }
}
