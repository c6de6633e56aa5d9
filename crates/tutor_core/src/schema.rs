//! crates/tutor_core/src/schema.rs
//!
//! Output contracts and tool declarations sent to the generation service.

use serde_json::json;

use crate::ports::{OutputContract, ToolDeclaration};

pub const ANALYZE_DOCUMENT_TOOL: &str = "analyze_document";

fn non_empty_string(description: &str) -> serde_json::Value {
    json!({ "type": "string", "minLength": 1, "description": description })
}

pub fn study_materials_contract() -> OutputContract {
    OutputContract {
        name: "study_materials".to_string(),
        description: "A complete study guide for the topic under discussion.".to_string(),
        schema: json!({
            "type": "object",
            "properties": {
                "mindMap": non_empty_string("A mind map summarizing the key concepts in markdown format."),
                "revisionNotes": non_empty_string("Detailed revision notes covering the topics discussed in markdown format."),
                "questionsAndAnswers": non_empty_string("Relevant questions and answers for self-assessment in markdown format."),
                "keywords": {
                    "type": "array",
                    "minItems": 1,
                    "description": "A list of important keywords and their definitions.",
                    "items": {
                        "type": "object",
                        "properties": {
                            "keyword": non_empty_string("The keyword to be defined."),
                            "definition": non_empty_string("The definition of the keyword.")
                        },
                        "required": ["keyword", "definition"],
                        "additionalProperties": false
                    }
                },
                "cbseMarkingScheme": non_empty_string("An example marking scheme based on CBSE guidelines for a sample question from the conversation."),
                "mnemonics": non_empty_string("Mnemonics to help remember key concepts."),
                "pyqs": non_empty_string("Previous Year Questions (PYQs) related to the topic.")
            },
            "required": [
                "mindMap", "revisionNotes", "questionsAndAnswers", "keywords",
                "cbseMarkingScheme", "mnemonics", "pyqs"
            ],
            "additionalProperties": false
        }),
    }
}

pub fn simple_answer_contract() -> OutputContract {
    OutputContract {
        name: "simple_answer".to_string(),
        description: "A direct answer to the student's question about the attached document."
            .to_string(),
        schema: json!({
            "type": "object",
            "properties": {
                "answer": non_empty_string("The answer, based only on the attached document.")
            },
            "required": ["answer"],
            "additionalProperties": false
        }),
    }
}

pub fn answer_evaluation_contract() -> OutputContract {
    OutputContract {
        name: "answer_evaluation".to_string(),
        description: "An evaluation of a student's answer against CBSE marking guidelines."
            .to_string(),
        schema: json!({
            "type": "object",
            "properties": {
                "evaluation": non_empty_string("The evaluation of the student's answer."),
                "feedback": non_empty_string("Constructive feedback for the student."),
                "marksAwarded": {
                    "type": "number",
                    "minimum": 0,
                    "description": "Marks awarded based on CBSE guidelines."
                }
            },
            "required": ["evaluation", "feedback", "marksAwarded"],
            "additionalProperties": false
        }),
    }
}

/// The single capability the tutor may delegate to: answering strictly from
/// the attached document.
pub fn analyze_document_tool() -> ToolDeclaration {
    ToolDeclaration {
        name: ANALYZE_DOCUMENT_TOOL.to_string(),
        description: "Answer a question strictly from the document the student attached. \
Use this whenever a document is attached and the question is about that document."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "question": {
                    "type": "string",
                    "description": "The student's question about the attached document."
                }
            },
            "required": ["question"],
            "additionalProperties": false
        }),
    }
}
