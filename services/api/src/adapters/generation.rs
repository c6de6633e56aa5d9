//! services/api/src/adapters/generation.rs
//!
//! This module contains the adapter for the generation service. It implements the
//! `GenerationService` port from the `core` crate against any OpenAI-compatible
//! chat-completions endpoint (Gemini's compatibility endpoint by default).
//!
//! The request and response bodies are our own serde types, sent through
//! `async-openai`'s bring-your-own-types calls, so the document part, the JSON
//! schema output contract and the tool declaration map one-to-one onto the wire.

use async_openai::{config::OpenAIConfig, error::OpenAIError, Client};
use async_trait::async_trait;
use backoff::ExponentialBackoff;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};
use tutor_core::ports::{
    GenerationReply, GenerationRequest, GenerationService, PortError, PortResult,
};

const SYSTEM_INSTRUCTIONS: &str = "You are a careful tutoring assistant. Reply either with JSON that \
matches the requested response schema exactly, or with a call to one of the provided tools. Never \
wrap JSON in prose.";

//=========================================================================================
// Wire Types (OpenAI chat-completions format)
//=========================================================================================

#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    n: u8,
}

#[derive(Serialize, Debug)]
#[serde(tag = "role", rename_all = "lowercase")]
enum ChatMessage {
    System { content: String },
    User { content: Vec<ContentPart> },
}

#[derive(Serialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
    File { file: FileData },
}

#[derive(Serialize, Debug)]
struct ImageUrl {
    url: String,
}

#[derive(Serialize, Debug)]
struct FileData {
    filename: String,
    file_data: String,
}

#[derive(Serialize, Debug)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaFormat,
}

#[derive(Serialize, Debug)]
struct JsonSchemaFormat {
    name: String,
    description: String,
    schema: Value,
    strict: bool,
}

#[derive(Serialize, Debug)]
struct ToolSpec {
    #[serde(rename = "type")]
    kind: &'static str,
    function: FunctionSpec,
}

#[derive(Serialize, Debug)]
struct FunctionSpec {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize, Debug)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Deserialize, Debug)]
struct ToolCall {
    function: ToolCallFunction,
}

#[derive(Deserialize, Debug)]
struct ToolCallFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `GenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiGenerationAdapter {
    /// `None` when no API key is configured; every call then fails as unavailable.
    client: Option<Client<OpenAIConfig>>,
    model: String,
}

impl OpenAiGenerationAdapter {
    /// Creates a new `OpenAiGenerationAdapter`.
    pub fn new(client: Option<Client<OpenAIConfig>>, model: String) -> Self {
        Self { client, model }
    }
}

/// Builds the chat-completions client used by the adapter.
///
/// `async-openai` retries rate limits and server errors for up to fifteen minutes by
/// default. A tutor request is attempted exactly once, so the backoff is given no
/// elapsed-time budget and the first failure is returned to the caller.
pub fn generation_client(api_key: &str, api_base: &str) -> Client<OpenAIConfig> {
    Client::with_config(
        OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base),
    )
    .with_backoff(ExponentialBackoff {
        max_elapsed_time: Some(Duration::ZERO),
        ..Default::default()
    })
}

fn build_request<'a>(model: &'a str, request: GenerationRequest) -> ChatRequest<'a> {
    let mut parts = vec![ContentPart::Text { text: request.prompt }];
    if let Some(document) = request.document {
        parts.push(if document.is_image() {
            ContentPart::ImageUrl {
                image_url: ImageUrl { url: document.to_uri() },
            }
        } else {
            ContentPart::File {
                file: FileData {
                    filename: "attachment".to_string(),
                    file_data: document.to_uri(),
                },
            }
        });
    }

    let tools: Vec<ToolSpec> = request
        .tools
        .into_iter()
        .map(|tool| ToolSpec {
            kind: "function",
            function: FunctionSpec {
                name: tool.name,
                description: tool.description,
                parameters: tool.parameters,
            },
        })
        .collect();
    let tool_choice = (!tools.is_empty()).then_some("auto");

    ChatRequest {
        model,
        messages: vec![
            ChatMessage::System {
                content: SYSTEM_INSTRUCTIONS.to_string(),
            },
            ChatMessage::User { content: parts },
        ],
        response_format: ResponseFormat {
            kind: "json_schema",
            json_schema: JsonSchemaFormat {
                name: request.output.name,
                description: request.output.description,
                schema: request.output.schema,
                strict: false,
            },
        },
        tools,
        tool_choice,
        n: 1,
    }
}

/// Turns the first choice into either a tool invocation or structured data.
fn interpret(response: ChatResponse) -> PortResult<GenerationReply> {
    let message = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| {
            PortError::Unexpected("Generation service returned no choices.".to_string())
        })?
        .message;

    if let Some(call) = message.tool_calls.and_then(|calls| calls.into_iter().next()) {
        let arguments = if call.function.arguments.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str(&call.function.arguments).map_err(|e| {
                PortError::Unexpected(format!("Tool arguments were not valid JSON: {}", e))
            })?
        };
        return Ok(GenerationReply::ToolInvocation {
            name: call.function.name,
            arguments,
        });
    }

    let content = message
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| {
            PortError::Unexpected(
                "Generation service returned neither data nor a tool call.".to_string(),
            )
        })?;
    let value = serde_json::from_str(strip_code_fences(&content)).map_err(|e| {
        PortError::Unexpected(format!("Generation service returned invalid JSON: {}", e))
    })?;
    Ok(GenerationReply::Structured(value))
}

// Some models wrap JSON in a ```json fence even when a schema is requested.
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let body = rest.trim_start_matches("json").trim_start_matches("JSON");
            body.strip_suffix("```").unwrap_or(body).trim()
        }
        None => trimmed,
    }
}

//=========================================================================================
// `GenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl GenerationService for OpenAiGenerationAdapter {
    async fn generate(&self, request: GenerationRequest) -> PortResult<GenerationReply> {
        let client = self.client.as_ref().ok_or_else(|| {
            PortError::Unavailable(
                "generation service is not configured (GEMINI_API_KEY is not set)".to_string(),
            )
        })?;

        info!(
            model = %self.model,
            output = %request.output.name,
            tools = request.tools.len(),
            with_document = request.document.is_some(),
            "Calling generation service."
        );
        let body = build_request(&self.model, request);
        debug!(messages = body.messages.len(), "Generation request built.");

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response: ChatResponse = client
            .chat()
            .create_byot(body)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        interpret(response)
    }
}
