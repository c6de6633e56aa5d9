//! services/api/src/web/mod.rs
//!
//! The HTTP surface: handlers, middleware and the router that ties them together.

pub mod admin;
pub mod auth;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod tutor;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::error::ApiError;
use crate::web::middleware::{require_admin, require_auth};
use crate::web::state::AppState;

pub use middleware::SESSION_COOKIE;
pub use rest::ApiDoc;

/// Attachments travel inline as data URIs, so bodies can be large.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Builds the API router with all routes, auth layers and request tracing.
pub fn router(state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/verify-email", post(auth::verify_email_handler))
        .route("/auth/verify-email/resend", post(auth::resend_verification_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/password-reset", post(auth::request_password_reset_handler))
        .route(
            "/auth/password-reset/confirm",
            post(auth::confirm_password_reset_handler),
        );

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route("/tutor/chat", post(tutor::chat_handler))
        .route("/tutor/analyze-notes", post(tutor::analyze_notes_handler))
        .route("/tutor/study-materials", post(tutor::study_materials_handler))
        .route("/tutor/evaluate", post(tutor::evaluate_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    // Admin routes (auth + admin role required). The last layer added runs first.
    let admin_routes = Router::new()
        .route("/admin/users", get(admin::list_users_handler))
        .route("/admin/users/{user_id}/ban", put(admin::set_ban_handler))
        .layer(axum_middleware::from_fn(require_admin))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the configured browser origin, with credentials so the session cookie is sent.
pub fn cors_layer(config: &Config) -> Result<CorsLayer, ApiError> {
    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS_ORIGIN '{}': {}", config.cors_origin, e))
    })?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]))
}
