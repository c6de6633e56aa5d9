//! services/api/src/web/tutor.rs
//!
//! The tutoring endpoints. Every route here sits behind `require_auth`, so the
//! caller is a signed-in, non-banned user.

use axum::{extract::State, response::IntoResponse, Extension, Json};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use tutor_core::data_uri::DataUri;
use tutor_core::domain::{
    render_history, AnswerEvaluation, AnswerEvaluationRequest, ChatTurn, SimpleAnswer,
    StudyMaterialBundle, TutorRequest, TutorResponse,
};
use tutor_core::validation::validate_question;
use utoipa::ToSchema;

use crate::error::{port_error, HttpError};
use crate::web::state::{AppState, CurrentUser};

const TUTOR_FAILED: &str = "The tutor could not answer right now. Please try again.";

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct ChatRequest {
    pub prompt: String,
    /// Earlier turns of the conversation, oldest first.
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    /// An optional document as a base64 data URI.
    #[serde(default)]
    pub attachment: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeNotesRequest {
    pub notes_data_uri: String,
    pub question: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudyMaterialsRequest {
    pub conversation_history: String,
    #[serde(default)]
    pub student_name: Option<String>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /tutor/chat - Ask the tutor; replies with study materials or a document answer
#[utoipa::path(
    post,
    path = "/tutor/chat",
    tag = "Tutor",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Study materials or an answer about the attachment", body = TutorResponse),
        (status = 400, description = "Empty prompt or malformed attachment"),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Account disabled"),
        (status = 503, description = "Generation service not configured")
    )
)]
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<TutorResponse>, HttpError> {
    let attachment = req
        .attachment
        .as_deref()
        .filter(|uri| !uri.trim().is_empty())
        .map(DataUri::parse)
        .transpose()
        .map_err(|e| port_error(e, "Invalid attachment"))?;

    info!(
        user_id = %user.user_id,
        turns = req.history.len(),
        with_attachment = attachment.is_some(),
        "Tutor chat request."
    );
    let response = state
        .dispatcher
        .dispatch(TutorRequest {
            prompt: req.prompt,
            conversation_history: render_history(&req.history),
            attachment,
        })
        .await
        .map_err(|e| port_error(e, TUTOR_FAILED))?;

    Ok(Json(response))
}

/// POST /tutor/analyze-notes - Ask a question about an uploaded document
#[utoipa::path(
    post,
    path = "/tutor/analyze-notes",
    tag = "Tutor",
    request_body = AnalyzeNotesRequest,
    responses(
        (status = 200, description = "Answer drawn from the document", body = SimpleAnswer),
        (status = 400, description = "Question too short or malformed document"),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Account disabled")
    )
)]
pub async fn analyze_notes_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<AnalyzeNotesRequest>,
) -> Result<Json<SimpleAnswer>, HttpError> {
    validate_question(&req.question).map_err(|e| port_error(e, "Invalid question"))?;
    let document =
        DataUri::parse(&req.notes_data_uri).map_err(|e| port_error(e, "Invalid document"))?;

    info!(user_id = %user.user_id, media_type = document.media_type(), "Analyzing notes.");
    let answer = state
        .analyzer
        .analyze(&document, &req.question)
        .await
        .map_err(|e| port_error(e, TUTOR_FAILED))?;

    Ok(Json(answer))
}

/// POST /tutor/study-materials - Build a study guide from a whole conversation
#[utoipa::path(
    post,
    path = "/tutor/study-materials",
    tag = "Tutor",
    request_body = StudyMaterialsRequest,
    responses(
        (status = 200, description = "Personalized study materials", body = StudyMaterialBundle),
        (status = 400, description = "Empty conversation"),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Account disabled")
    )
)]
pub async fn study_materials_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<StudyMaterialsRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let student_name = req
        .student_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| user.name.clone());

    let bundle = state
        .materials
        .generate(&req.conversation_history, &student_name)
        .await
        .map_err(|e| port_error(e, TUTOR_FAILED))?;

    Ok(Json(bundle))
}

/// POST /tutor/evaluate - Grade a student's answer against a marking scheme
#[utoipa::path(
    post,
    path = "/tutor/evaluate",
    tag = "Tutor",
    request_body = AnswerEvaluationRequest,
    responses(
        (status = 200, description = "Evaluation, feedback and marks", body = AnswerEvaluation),
        (status = 400, description = "A required field is empty"),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Account disabled")
    )
)]
pub async fn evaluate_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<AnswerEvaluationRequest>,
) -> Result<Json<AnswerEvaluation>, HttpError> {
    let evaluation = state
        .evaluator
        .evaluate(&req)
        .await
        .map_err(|e| port_error(e, TUTOR_FAILED))?;
    info!(user_id = %user.user_id, marks = evaluation.marks_awarded, "Evaluated answer.");

    Ok(Json(evaluation))
}
