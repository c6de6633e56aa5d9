//! crates/tutor_core/src/domain.rs
//!
//! Defines the core data structures for the tutor.
//! Records are independent of the database; the generated-content types carry
//! serde derives because they are the JSON contract with the generation service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::data_uri::DataUri;
use crate::ports::{PortError, PortResult};

//=========================================================================================
// Users and Credentials
//=========================================================================================

/// The role attached to a user record. Checked server-side on every admin route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "admin" => Ok(Role::Admin),
            other => Err(PortError::Unexpected(format!("Unknown role '{}'", other))),
        }
    }
}

/// A persisted user profile, keyed by `user_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_banned: bool,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// The fields needed to create a user at sign-up.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub hashed_password: String,
    pub role: Role,
}

// Only used internally for login and password reset - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

/// What a single-use email token may be redeemed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenPurpose {
    VerifyEmail,
    PasswordReset,
}

impl TokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::VerifyEmail => "verify_email",
            TokenPurpose::PasswordReset => "password_reset",
        }
    }
}

//=========================================================================================
// Chat
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// One line of the chat transcript. Held by the client, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct ChatTurn {
    pub sender: Sender,
    pub text: String,
}

/// Renders a transcript into the plain-text history embedded in tutor prompts.
pub fn render_history(turns: &[ChatTurn]) -> String {
    turns
        .iter()
        .map(|turn| {
            let label = match turn.sender {
                Sender::User => "Student",
                Sender::Assistant => "Tutor",
            };
            format!("{}: {}", label, turn.text.trim())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A single call into the tutor dispatcher.
#[derive(Debug, Clone)]
pub struct TutorRequest {
    pub prompt: String,
    pub conversation_history: String,
    pub attachment: Option<DataUri>,
}

//=========================================================================================
// Generated Content
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct KeywordDefinition {
    pub keyword: String,
    pub definition: String,
}

/// The multi-field study guide produced for general tutoring prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct StudyMaterialBundle {
    pub mind_map: String,
    pub revision_notes: String,
    pub questions_and_answers: String,
    pub keywords: Vec<KeywordDefinition>,
    pub cbse_marking_scheme: String,
    pub mnemonics: String,
    pub pyqs: String,
}

impl StudyMaterialBundle {
    /// Checks that every field is populated. The generation service is only
    /// asked to honour this, so replies are checked before being relayed.
    pub fn ensure_complete(&self) -> PortResult<()> {
        let text_fields = [
            ("mindMap", &self.mind_map),
            ("revisionNotes", &self.revision_notes),
            ("questionsAndAnswers", &self.questions_and_answers),
            ("cbseMarkingScheme", &self.cbse_marking_scheme),
            ("mnemonics", &self.mnemonics),
            ("pyqs", &self.pyqs),
        ];
        if let Some((name, _)) = text_fields.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(PortError::Unexpected(format!(
                "Study materials field '{}' was empty",
                name
            )));
        }
        if self.keywords.is_empty() {
            return Err(PortError::Unexpected(
                "Study materials contained no keywords".to_string(),
            ));
        }
        if self
            .keywords
            .iter()
            .any(|k| k.keyword.trim().is_empty() || k.definition.trim().is_empty())
        {
            return Err(PortError::Unexpected(
                "Study materials contained an empty keyword or definition".to_string(),
            ));
        }
        Ok(())
    }
}

/// A direct answer, used for questions about an attached document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct SimpleAnswer {
    pub answer: String,
}

/// Exactly one of the two generated-content shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TutorResponse {
    StudyMaterials(StudyMaterialBundle),
    SimpleAnswer(SimpleAnswer),
}

/// A practice answer submitted for marking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AnswerEvaluationRequest {
    pub question: String,
    pub student_answer: String,
    pub correct_answer: String,
    pub marking_guidelines: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AnswerEvaluation {
    pub evaluation: String,
    pub feedback: String,
    pub marks_awarded: f64,
}
