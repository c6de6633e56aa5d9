//! crates/tutor_core/src/materials.rs
//!
//! Study-material generation from a whole conversation, and CBSE-style
//! evaluation of practice answers.

const STUDY_MATERIALS_TEMPLATE: &str = r#"You are an AI study material generator for the Class 10 CBSE curriculum. You take a student's conversation history and generate personalized, well-organized study materials.

Student Name: {student_name}

Conversation History:
---
{history}
---

Generate, in markdown where the field is text:
- mindMap: a mind map of the key concepts discussed (nested lists).
- revisionNotes: detailed revision notes covering the topics discussed.
- questionsAndAnswers: relevant questions and answers for self-assessment.
- keywords: important keywords, each with a definition.
- cbseMarkingScheme: an example marking scheme based on CBSE guidelines for a relevant question from the conversation.
- mnemonics: memory aids for the key concepts.
- pyqs: previous year board questions related to the topics.

Address the student by name where it reads naturally. Be accurate, comprehensive and follow CBSE formats."#;

const EVALUATION_TEMPLATE: &str = r#"You are an expert teacher evaluating student answers based on CBSE marking guidelines.

Question: {question}
Student's Answer: {student_answer}
Correct Answer: {correct_answer}
Marking Guidelines: {marking_guidelines}

Evaluate the student's answer on correctness and reasoning, give constructive feedback aligned with the marking guidelines, and decide the marks to award."#;

use std::sync::Arc;
use tracing::info;

use crate::domain::{AnswerEvaluation, AnswerEvaluationRequest, StudyMaterialBundle};
use crate::ports::{GenerationReply, GenerationRequest, GenerationService, PortError, PortResult};
use crate::prompt::render;
use crate::schema::{answer_evaluation_contract, study_materials_contract};
use crate::validation::require_text;

//=========================================================================================
// Study Materials
//=========================================================================================

#[derive(Clone)]
pub struct StudyMaterialGenerator {
    generator: Arc<dyn GenerationService>,
}

impl StudyMaterialGenerator {
    pub fn new(generator: Arc<dyn GenerationService>) -> Self {
        Self { generator }
    }

    /// Builds a personalized study guide from everything discussed so far.
    pub async fn generate(
        &self,
        conversation_history: &str,
        student_name: &str,
    ) -> PortResult<StudyMaterialBundle> {
        require_text("Conversation history", conversation_history)?;

        let student_name = match student_name.trim() {
            "" => "Student",
            name => name,
        };
        let request = GenerationRequest {
            prompt: render(
                STUDY_MATERIALS_TEMPLATE,
                &[
                    ("student_name", student_name),
                    ("history", conversation_history.trim()),
                ],
            ),
            document: None,
            output: study_materials_contract(),
            tools: Vec::new(),
        };

        let value = expect_structured(self.generator.generate(request).await?)?;
        let bundle: StudyMaterialBundle = serde_json::from_value(value)
            .map_err(|e| PortError::Unexpected(format!("Malformed study materials: {}", e)))?;
        bundle.ensure_complete()?;
        info!("Generated personalized study materials.");
        Ok(bundle)
    }
}

//=========================================================================================
// Answer Evaluation
//=========================================================================================

#[derive(Clone)]
pub struct AnswerEvaluator {
    generator: Arc<dyn GenerationService>,
}

impl AnswerEvaluator {
    pub fn new(generator: Arc<dyn GenerationService>) -> Self {
        Self { generator }
    }

    pub async fn evaluate(&self, input: &AnswerEvaluationRequest) -> PortResult<AnswerEvaluation> {
        require_text("Question", &input.question)?;
        require_text("Student answer", &input.student_answer)?;
        require_text("Correct answer", &input.correct_answer)?;
        require_text("Marking guidelines", &input.marking_guidelines)?;

        let request = GenerationRequest {
            prompt: render(
                EVALUATION_TEMPLATE,
                &[
                    ("question", input.question.trim()),
                    ("student_answer", input.student_answer.trim()),
                    ("correct_answer", input.correct_answer.trim()),
                    ("marking_guidelines", input.marking_guidelines.trim()),
                ],
            ),
            document: None,
            output: answer_evaluation_contract(),
            tools: Vec::new(),
        };

        let value = expect_structured(self.generator.generate(request).await?)?;
        let evaluation: AnswerEvaluation = serde_json::from_value(value)
            .map_err(|e| PortError::Unexpected(format!("Malformed evaluation: {}", e)))?;
        if !evaluation.marks_awarded.is_finite() || evaluation.marks_awarded < 0.0 {
            return Err(PortError::Unexpected(format!(
                "Evaluation awarded invalid marks: {}",
                evaluation.marks_awarded
            )));
        }
        Ok(evaluation)
    }
}

// No tools are declared on these calls, so anything but data is a protocol error.
fn expect_structured(reply: GenerationReply) -> PortResult<serde_json::Value> {
    match reply {
        GenerationReply::Structured(value) => Ok(value),
        GenerationReply::ToolInvocation { name, .. } => Err(PortError::Unexpected(format!(
            "Generation service requested undeclared tool '{}'",
            name
        ))),
    }
}
