//! services/api/src/web/middleware.rs
//!
//! Authentication and authorization middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{error, warn};
use tutor_core::access::{ensure_active, ensure_admin};
use tutor_core::ports::PortError;

use crate::error::{port_error, HttpError};
use crate::web::state::{AppState, CurrentUser};

pub const SESSION_COOKIE: &str = "session";

/// Extracts the auth session ID from the `Cookie` header, if any.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .find_map(|c| {
            c.trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .filter(|id| !id.is_empty())
}

/// Middleware that validates the auth session cookie and loads the current user.
///
/// The user record is read on every request and checked for a ban, so banning
/// takes effect immediately for sessions that are already open. On success the
/// record is inserted into request extensions as `CurrentUser`.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, HttpError> {
    // 1. Parse session ID from cookie
    let auth_session_id = session_id_from_headers(req.headers())
        .ok_or((StatusCode::UNAUTHORIZED, "Not signed in".to_string()))?;

    // 2. Validate auth session in database, get user_id
    let user_id = state
        .db
        .validate_auth_session(auth_session_id)
        .await
        .map_err(|e| match e {
            PortError::Unauthorized => (StatusCode::UNAUTHORIZED, "Session expired".to_string()),
            other => {
                error!("Failed to validate auth session: {:?}", other);
                port_error(other, "Failed to validate session")
            }
        })?;

    // 3. Load the current user record
    let user = state.db.get_user_by_id(user_id).await.map_err(|e| match e {
        PortError::NotFound(_) => (StatusCode::UNAUTHORIZED, "Session expired".to_string()),
        other => port_error(other, "Failed to load user"),
    })?;

    // 4. Enforce the ban flag
    if let Err(e) = ensure_active(&user) {
        warn!("Rejected request from banned user {}", user.user_id);
        return Err(port_error(e, "Access denied"));
    }

    // 5. Insert the user into request extensions and continue to the handler
    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

/// Middleware for admin-only routes. Must run after `require_auth`.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, HttpError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or((StatusCode::UNAUTHORIZED, "Not signed in".to_string()))?;

    if let Err(e) = ensure_admin(&user.0) {
        warn!("Rejected admin request from user {}", user.0.user_id);
        return Err(port_error(e, "Access denied"));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn finds_session_among_other_cookies() {
        let headers = headers("theme=dark; session=abc123; lang=en");
        assert_eq!(session_id_from_headers(&headers), Some("abc123"));
    }

    #[test]
    fn ignores_lookalike_cookie_names() {
        let headers = headers("session_hint=nope");
        assert_eq!(session_id_from_headers(&headers), None);
    }

    #[test]
    fn empty_session_is_missing() {
        assert_eq!(session_id_from_headers(&headers("session=")), None);
        assert_eq!(session_id_from_headers(&HeaderMap::new()), None);
    }
}
