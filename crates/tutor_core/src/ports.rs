//! crates/tutor_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::data_uri::DataUri;
use crate::domain::{NewUser, TokenPurpose, UserCredentials, UserRecord};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    Invalid(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Record Store
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- User Management ---
    /// Fails with `Conflict` when the email is already registered.
    async fn create_user(&self, user: NewUser) -> PortResult<UserRecord>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<UserRecord>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    /// All users, newest first.
    async fn list_users(&self) -> PortResult<Vec<UserRecord>>;

    async fn set_user_banned(&self, user_id: Uuid, banned: bool) -> PortResult<UserRecord>;

    async fn mark_email_verified(&self, user_id: Uuid) -> PortResult<()>;

    async fn update_password(&self, user_id: Uuid, hashed_password: &str) -> PortResult<()>;

    // --- Auth Sessions ---
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Returns the owner of an unexpired session.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    async fn delete_auth_sessions_for_user(&self, user_id: Uuid) -> PortResult<()>;

    // --- Email Tokens ---
    async fn create_email_token(
        &self,
        token: &str,
        user_id: Uuid,
        purpose: TokenPurpose,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Deletes the token and returns its user when it exists, matches `purpose`
    /// and has not expired. Tokens are single use.
    async fn consume_email_token(&self, token: &str, purpose: TokenPurpose) -> PortResult<Uuid>;
}

//=========================================================================================
// Mail Delivery
//=========================================================================================

#[async_trait]
pub trait MailService: Send + Sync {
    async fn send_email_verification(&self, email: &str, link: &str) -> PortResult<()>;
    async fn send_password_reset(&self, email: &str, link: &str) -> PortResult<()>;
}

//=========================================================================================
// Generation Service
//=========================================================================================

/// The JSON shape the generation service is asked to return.
#[derive(Debug, Clone)]
pub struct OutputContract {
    pub name: String,
    pub description: String,
    pub schema: Value,
}

/// A callable capability the generation service may ask to invoke instead of answering.
#[derive(Debug, Clone)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// One outbound generation call.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub document: Option<DataUri>,
    pub output: OutputContract,
    pub tools: Vec<ToolDeclaration>,
}

/// What the generation service sent back.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationReply {
    /// Data intended to conform to the request's output contract.
    Structured(Value),
    /// A request to run one of the declared tools.
    ToolInvocation { name: String, arguments: Value },
}

#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Submits exactly one call. Implementations must not retry.
    async fn generate(&self, request: GenerationRequest) -> PortResult<GenerationReply>;
}
