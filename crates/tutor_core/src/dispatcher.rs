//! crates/tutor_core/src/dispatcher.rs
//!
//! The tutor dispatcher and the document-analysis capability it may delegate to.
//!
//! A chat turn is submitted to the generation service once, together with the
//! study-materials output contract and the `analyze_document` tool. The service
//! decides which branch applies; the dispatcher only relays the result:
//!
//! - structured data is checked against the bundle shape and returned as
//!   [`TutorResponse::StudyMaterials`];
//! - a tool invocation runs [`DocumentAnalyzer`] on the attached document and is
//!   returned as [`TutorResponse::SimpleAnswer`].

const TUTOR_PROMPT_TEMPLATE: &str = r#"You are an expert AI tutor for the Class 10 CBSE curriculum and general education topics.

CONVERSATION HISTORY:
---
{history}
---

LATEST PROMPT:
{prompt}

{document_note}

How to respond:
- If a document is attached AND the latest prompt asks about that document, do NOT answer yourself. Call the `analyze_document` tool with the student's question.
- Otherwise, produce a complete study guide for the topic of the latest prompt, using the conversation history for context. Fill EVERY field:
  - mindMap: a mind map of the key concepts as nested markdown lists.
  - revisionNotes: detailed revision notes in markdown.
  - questionsAndAnswers: practice questions with answers in markdown.
  - keywords: important keywords, each with a definition.
  - cbseMarkingScheme: an example CBSE marking scheme for a relevant question.
  - mnemonics: memory aids for the key concepts.
  - pyqs: previous year board questions on the topic.
- Follow CBSE guidelines and formats. Be accurate and well organized."#;

const DOCUMENT_ATTACHED_NOTE: &str = "A document is attached to this message.";
const NO_DOCUMENT_NOTE: &str = "No document is attached to this message.";

const ANALYZE_PROMPT_TEMPLATE: &str = r#"You are an expert AI tutor specialized in the Class 10 CBSE curriculum and general education topics.

Analyze the attached document or image and answer the question based *only* on the content it contains. If the document does not contain the answer, say so.

QUESTION:
{question}"#;

use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::data_uri::DataUri;
use crate::domain::{SimpleAnswer, StudyMaterialBundle, TutorRequest, TutorResponse};
use crate::ports::{GenerationReply, GenerationRequest, GenerationService, PortError, PortResult};
use crate::prompt::render;
use crate::schema::{
    analyze_document_tool, simple_answer_contract, study_materials_contract, ANALYZE_DOCUMENT_TOOL,
};
use crate::validation::require_text;

//=========================================================================================
// Document Analyzer (the callable capability)
//=========================================================================================

/// Answers a question from one document and nothing else.
///
/// The signature is the isolation boundary: the capability only ever sees the
/// document and the question, never the surrounding conversation.
#[derive(Clone)]
pub struct DocumentAnalyzer {
    generator: Arc<dyn GenerationService>,
}

impl DocumentAnalyzer {
    pub fn new(generator: Arc<dyn GenerationService>) -> Self {
        Self { generator }
    }

    pub async fn analyze(&self, document: &DataUri, question: &str) -> PortResult<SimpleAnswer> {
        require_text("Question", question)?;

        let request = GenerationRequest {
            prompt: render(ANALYZE_PROMPT_TEMPLATE, &[("question", question.trim())]),
            document: Some(document.clone()),
            output: simple_answer_contract(),
            tools: Vec::new(),
        };

        match self.generator.generate(request).await? {
            GenerationReply::Structured(value) => {
                let answer: SimpleAnswer = serde_json::from_value(value).map_err(|e| {
                    PortError::Unexpected(format!("Malformed document answer: {}", e))
                })?;
                if answer.answer.trim().is_empty() {
                    return Err(PortError::Unexpected(
                        "Document answer was empty".to_string(),
                    ));
                }
                Ok(answer)
            }
            GenerationReply::ToolInvocation { name, .. } => Err(PortError::Unexpected(format!(
                "Document analysis requested undeclared tool '{}'",
                name
            ))),
        }
    }
}

//=========================================================================================
// Tutor Dispatcher
//=========================================================================================

#[derive(Debug, Deserialize)]
struct AnalyzeDocumentArgs {
    #[serde(default)]
    question: Option<String>,
}

/// Routes a tutor request to either study-material generation or document Q&A.
#[derive(Clone)]
pub struct TutorDispatcher {
    generator: Arc<dyn GenerationService>,
    analyzer: DocumentAnalyzer,
}

impl TutorDispatcher {
    pub fn new(generator: Arc<dyn GenerationService>) -> Self {
        let analyzer = DocumentAnalyzer::new(generator.clone());
        Self { generator, analyzer }
    }

    pub async fn dispatch(&self, request: TutorRequest) -> PortResult<TutorResponse> {
        require_text("Prompt", &request.prompt)?;

        let generation = GenerationRequest {
            prompt: build_tutor_prompt(&request),
            document: request.attachment.clone(),
            output: study_materials_contract(),
            tools: vec![analyze_document_tool()],
        };

        match self.generator.generate(generation).await? {
            GenerationReply::Structured(value) => {
                let bundle: StudyMaterialBundle = serde_json::from_value(value).map_err(|e| {
                    PortError::Unexpected(format!("Malformed study materials: {}", e))
                })?;
                bundle.ensure_complete()?;
                info!(keywords = bundle.keywords.len(), "Tutor replied with study materials.");
                Ok(TutorResponse::StudyMaterials(bundle))
            }
            GenerationReply::ToolInvocation { name, arguments } => {
                if name != ANALYZE_DOCUMENT_TOOL {
                    return Err(PortError::Unexpected(format!(
                        "Generation service requested unknown tool '{}'",
                        name
                    )));
                }
                let Some(document) = request.attachment.as_ref() else {
                    warn!("Document analysis requested without an attached document.");
                    return Err(PortError::Unexpected(
                        "Document analysis requested but no document is attached".to_string(),
                    ));
                };

                let args: AnalyzeDocumentArgs = serde_json::from_value(arguments).map_err(|e| {
                    PortError::Unexpected(format!("Malformed tool arguments: {}", e))
                })?;
                let question = args
                    .question
                    .filter(|q| !q.trim().is_empty())
                    .unwrap_or_else(|| request.prompt.clone());

                info!(media_type = document.media_type(), "Delegating to document analysis.");
                let answer = self.analyzer.analyze(document, &question).await?;
                Ok(TutorResponse::SimpleAnswer(answer))
            }
        }
    }
}

fn build_tutor_prompt(request: &TutorRequest) -> String {
    let history = if request.conversation_history.trim().is_empty() {
        "(none)"
    } else {
        request.conversation_history.trim()
    };
    let document_note = if request.attachment.is_some() {
        DOCUMENT_ATTACHED_NOTE
    } else {
        NO_DOCUMENT_NOTE
    };
    render(
        TUTOR_PROMPT_TEMPLATE,
        &[
            ("history", history),
            ("prompt", request.prompt.trim()),
            ("document_note", document_note),
        ],
    )
}
