//! services/api/src/web/rest.rs
//!
//! Contains the shared REST payloads and the master definition for the
//! OpenAPI specification.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tutor_core::domain::{
    AnswerEvaluation, AnswerEvaluationRequest, ChatTurn, KeywordDefinition, Role, Sender,
    SimpleAnswer, StudyMaterialBundle, TutorResponse, UserRecord,
};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::web::{admin, auth, tutor};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::verify_email_handler,
        auth::resend_verification_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::request_password_reset_handler,
        auth::confirm_password_reset_handler,
        auth::me_handler,
        tutor::chat_handler,
        tutor::analyze_notes_handler,
        tutor::study_materials_handler,
        tutor::evaluate_handler,
        admin::list_users_handler,
        admin::set_ban_handler,
    ),
    components(
        schemas(
            UserProfile,
            MessageResponse,
            Role,
            Sender,
            ChatTurn,
            KeywordDefinition,
            StudyMaterialBundle,
            SimpleAnswer,
            TutorResponse,
            AnswerEvaluationRequest,
            AnswerEvaluation,
        )
    ),
    tags(
        (name = "Auth", description = "Sign-up, email verification, sessions and password reset."),
        (name = "Tutor", description = "Study materials, document questions and answer evaluation."),
        (name = "Admin", description = "User management for administrators.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response Structs
//=========================================================================================

/// A user's profile as shown to the user themselves and to administrators.
#[derive(Serialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_banned: bool,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<UserRecord> for UserProfile {
    fn from(user: UserRecord) -> Self {
        Self {
            user_id: user.user_id,
            name: user.name,
            email: user.email,
            role: user.role,
            is_banned: user.is_banned,
            email_verified: user.email_verified,
            created_at: user.created_at,
        }
    }
}

/// A plain acknowledgement for operations with nothing else to return.
#[derive(Serialize, ToSchema, Debug)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
