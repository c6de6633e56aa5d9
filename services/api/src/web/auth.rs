//! services/api/src/web/auth.rs
//!
//! Authentication endpoints: signup, email verification, login, logout and
//! password reset.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use tutor_core::access::ensure_active;
use tutor_core::domain::{NewUser, Role, TokenPurpose, UserRecord};
use tutor_core::ports::PortError;
use tutor_core::validation::{normalize_email, validate_password};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{port_error, HttpError};
use crate::web::middleware::{session_id_from_headers, SESSION_COOKIE};
use crate::web::rest::{MessageResponse, UserProfile};
use crate::web::state::{AppState, CurrentUser};

const INVALID_CREDENTIALS: &str = "Invalid email or password. Please try again.";
const EMAIL_TAKEN: &str = "This email is already registered. Please log in or use a different email.";
const EMAIL_NOT_VERIFIED: &str = "Please verify your email address before logging in.";

const VERIFY_TOKEN_HOURS: i64 = 24;
const RESET_TOKEN_HOURS: i64 = 1;

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct TokenRequest {
    pub token: String,
}

#[derive(Deserialize, ToSchema)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetConfirmRequest {
    pub token: String,
    pub new_password: String,
}

//=========================================================================================
// Helpers
//=========================================================================================

fn hash_password(password: &str) -> Result<String, HttpError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to hash password".to_string())
        })
}

fn password_matches(password: &str, hashed_password: &str) -> Result<bool, HttpError> {
    let parsed_hash = PasswordHash::new(hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Authentication error".to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

fn session_cookie(auth_session_id: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE, auth_session_id, max_age_secs
    )
}

/// Stores a fresh single-use token for `user_id` and returns it.
async fn issue_email_token(
    state: &AppState,
    user_id: Uuid,
    purpose: TokenPurpose,
    valid_for: Duration,
) -> Result<String, HttpError> {
    let token = Uuid::new_v4().simple().to_string();
    state
        .db
        .create_email_token(&token, user_id, purpose, Utc::now() + valid_for)
        .await
        .map_err(|e| port_error(e, "Failed to create token"))?;
    Ok(token)
}

async fn send_verification(state: &AppState, user: &UserRecord) -> Result<(), HttpError> {
    let token = issue_email_token(
        state,
        user.user_id,
        TokenPurpose::VerifyEmail,
        Duration::hours(VERIFY_TOKEN_HOURS),
    )
    .await?;
    let link = format!("{}/verify-email?token={}", state.config.app_base_url, token);
    state
        .mailer
        .send_email_verification(&user.email, &link)
        .await
        .map_err(|e| port_error(e, "Failed to send verification email"))
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new student account
#[utoipa::path(
    post,
    path = "/auth/signup",
    tag = "Auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created; a verification email was sent", body = UserProfile),
        (status = 400, description = "Invalid name, email, domain or password"),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, HttpError> {
    // 1. Validate before touching the store
    let signup = state
        .signup_policy
        .validate(&req.name, &req.email, &req.password)
        .map_err(|e| port_error(e, "Invalid signup"))?;

    // 2. Hash the password
    let hashed_password = hash_password(&req.password)?;

    // 3. Create user in database
    let role = if state.config.is_admin_email(&signup.email) {
        Role::Admin
    } else {
        Role::Student
    };
    let user = state
        .db
        .create_user(NewUser {
            name: signup.name,
            email: signup.email,
            hashed_password,
            role,
        })
        .await
        .map_err(|e| match e {
            PortError::Conflict(_) => (StatusCode::CONFLICT, EMAIL_TAKEN.to_string()),
            other => port_error(other, "Failed to create user"),
        })?;
    info!(user_id = %user.user_id, role = %user.role, "User signed up.");

    // 4. Send the verification email. The account exists either way; a failed
    // delivery can be retried through /auth/verify-email/resend.
    if let Err((_, msg)) = send_verification(&state, &user).await {
        warn!("Verification email for {} not sent: {}", user.user_id, msg);
    }

    Ok((StatusCode::CREATED, Json(UserProfile::from(user))))
}

/// POST /auth/verify-email - Confirm an email address with a mailed token
#[utoipa::path(
    post,
    path = "/auth/verify-email",
    tag = "Auth",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Invalid or expired token")
    )
)]
pub async fn verify_email_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TokenRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let user_id = state
        .db
        .consume_email_token(req.token.trim(), TokenPurpose::VerifyEmail)
        .await
        .map_err(|e| port_error(e, "Failed to verify email"))?;

    state
        .db
        .mark_email_verified(user_id)
        .await
        .map_err(|e| port_error(e, "Failed to verify email"))?;
    info!(user_id = %user_id, "Email verified.");

    Ok(Json(MessageResponse::new("Email verified. You can now log in.")))
}

/// POST /auth/verify-email/resend - Send a new verification email
#[utoipa::path(
    post,
    path = "/auth/verify-email/resend",
    tag = "Auth",
    request_body = EmailRequest,
    responses(
        (status = 202, description = "A verification email is sent if the account is unverified", body = MessageResponse),
        (status = 400, description = "Malformed email")
    )
)]
pub async fn resend_verification_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EmailRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let email = normalize_email(&req.email).map_err(|e| port_error(e, "Invalid email"))?;

    match state.db.get_user_by_email(&email).await {
        Ok(creds) => {
            let user = state
                .db
                .get_user_by_id(creds.user_id)
                .await
                .map_err(|e| port_error(e, "Failed to load user"))?;
            if !user.email_verified {
                if let Err((_, msg)) = send_verification(&state, &user).await {
                    warn!("Verification email for {} not sent: {}", user.user_id, msg);
                }
            }
        }
        Err(PortError::NotFound(_)) => {}
        Err(e) => return Err(port_error(e, "Failed to load user")),
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse::new(
            "If the account exists and is unverified, a new verification email is on its way.",
        )),
    ))
}

/// POST /auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = UserProfile),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account disabled or email not verified"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let invalid = || (StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS.to_string());

    // 1. Get user by email
    let email = normalize_email(&req.email).map_err(|_| invalid())?;
    let user_creds = state.db.get_user_by_email(&email).await.map_err(|e| match e {
        PortError::NotFound(_) => invalid(),
        other => port_error(other, "Failed to log in"),
    })?;

    // 2. Verify password
    if !password_matches(&req.password, &user_creds.hashed_password)? {
        warn!("Rejected login for {}: wrong password", user_creds.user_id);
        return Err(invalid());
    }

    // 3. Check account status
    let user = state
        .db
        .get_user_by_id(user_creds.user_id)
        .await
        .map_err(|e| port_error(e, "Failed to log in"))?;
    if let Err(e) = ensure_active(&user) {
        warn!("Rejected login for banned user {}", user.user_id);
        return Err(port_error(e, "Access denied"));
    }
    if !user.email_verified {
        return Err((StatusCode::FORBIDDEN, EMAIL_NOT_VERIFIED.to_string()));
    }

    // 4. Create auth session in database
    let auth_session_id = Uuid::new_v4().to_string();
    let ttl = Duration::days(state.config.session_ttl_days);
    let expires_at = Utc::now().checked_add_signed(ttl).ok_or_else(|| {
        error!("Session lifetime of {} days is out of range", state.config.session_ttl_days);
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session".to_string())
    })?;
    state
        .db
        .create_auth_session(&auth_session_id, user.user_id, expires_at)
        .await
        .map_err(|e| port_error(e, "Failed to create session"))?;
    info!(user_id = %user.user_id, "User logged in.");

    // 5. Return response with cookie
    let cookie = session_cookie(&auth_session_id, ttl.num_seconds());
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(UserProfile::from(user)),
    ))
}

/// POST /auth/logout - Logout and invalidate session
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active session")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpError> {
    // 1. Parse session ID from cookie
    let auth_session_id = session_id_from_headers(&headers)
        .ok_or((StatusCode::UNAUTHORIZED, "No session found".to_string()))?;

    // 2. Delete auth session from database
    state
        .db
        .delete_auth_session(auth_session_id)
        .await
        .map_err(|e| port_error(e, "Failed to logout"))?;

    // 3. Clear cookie
    Ok((StatusCode::OK, [(header::SET_COOKIE, session_cookie("", 0))]))
}

/// POST /auth/password-reset - Email a password reset link
#[utoipa::path(
    post,
    path = "/auth/password-reset",
    tag = "Auth",
    request_body = EmailRequest,
    responses(
        (status = 202, description = "A reset link is sent if the account exists", body = MessageResponse),
        (status = 400, description = "Malformed email")
    )
)]
pub async fn request_password_reset_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EmailRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let email = normalize_email(&req.email).map_err(|e| port_error(e, "Invalid email"))?;

    // The response is the same whether or not the account exists.
    match state.db.get_user_by_email(&email).await {
        Ok(creds) => {
            let token = issue_email_token(
                &state,
                creds.user_id,
                TokenPurpose::PasswordReset,
                Duration::hours(RESET_TOKEN_HOURS),
            )
            .await?;
            let link = format!("{}/reset-password?token={}", state.config.app_base_url, token);
            match state.mailer.send_password_reset(&creds.email, &link).await {
                Ok(()) => info!(user_id = %creds.user_id, "Password reset requested."),
                Err(e) => {
                    let (_, msg) = port_error(e, "Failed to send password reset email");
                    warn!("Password reset email for {} not sent: {}", creds.user_id, msg);
                }
            }
        }
        Err(PortError::NotFound(_)) => {}
        Err(e) => return Err(port_error(e, "Failed to request password reset")),
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse::new(
            "If an account exists for that email, a reset link is on its way.",
        )),
    ))
}

/// POST /auth/password-reset/confirm - Set a new password with a mailed token
#[utoipa::path(
    post,
    path = "/auth/password-reset/confirm",
    tag = "Auth",
    request_body = PasswordResetConfirmRequest,
    responses(
        (status = 200, description = "Password changed; all sessions were signed out", body = MessageResponse),
        (status = 400, description = "Invalid or expired token, or password too short")
    )
)]
pub async fn confirm_password_reset_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PasswordResetConfirmRequest>,
) -> Result<impl IntoResponse, HttpError> {
    validate_password(&req.new_password).map_err(|e| port_error(e, "Invalid password"))?;

    let user_id = state
        .db
        .consume_email_token(req.token.trim(), TokenPurpose::PasswordReset)
        .await
        .map_err(|e| port_error(e, "Failed to reset password"))?;

    let hashed_password = hash_password(&req.new_password)?;
    state
        .db
        .update_password(user_id, &hashed_password)
        .await
        .map_err(|e| port_error(e, "Failed to reset password"))?;
    state
        .db
        .delete_auth_sessions_for_user(user_id)
        .await
        .map_err(|e| port_error(e, "Failed to reset password"))?;
    info!(user_id = %user_id, "Password reset completed.");

    Ok(Json(MessageResponse::new("Password updated. Please log in again.")))
}

/// GET /auth/me - The signed-in user's profile
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user", body = UserProfile),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Account disabled")
    )
)]
pub async fn me_handler(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<UserProfile> {
    Json(UserProfile::from(user))
}
