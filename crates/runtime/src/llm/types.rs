//! Core LLM types (provider-agnostic).
//!
//! These types represent the universal concepts shared across LLM providers.
//! Provider-specific details belong in adapter modules.

use super::errors::ModelError;
use crate::tools::FunctionSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;

/// Role of a message participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Identifier the matching tool message must echo back.
    pub id: String,
    /// Name of the tool to invoke.
    pub tool_name: String,
    /// Arguments as JSON. Normally an object; holds the raw string when the
    /// model produced arguments that were not valid JSON.
    pub arguments: Value,
}

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Option<String>,
    /// Requests carried by an assistant message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
    /// Request this tool message answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    fn new(role: Role, content: Option<String>) -> Self {
        Self {
            role,
            content,
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    /// Create a system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, Some(text.into()))
    }

    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, Some(text.into()))
    }

    /// Create an assistant message with text.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, Some(text.into()))
    }

    /// Create an assistant message carrying tool-call requests.
    pub fn assistant_tool_calls(content: Option<String>, calls: Vec<ToolCallRequest>) -> Self {
        Self {
            tool_calls: calls,
            ..Self::new(Role::Assistant, content)
        }
    }

    /// Create a tool message answering the request `tool_call_id`.
    pub fn tool(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            name: Some(name.into()),
            ..Self::new(Role::Tool, Some(content.into()))
        }
    }

    /// Text content, if any.
    pub fn text(&self) -> Option<&str> {
        self.content.as_deref()
    }
}

/// The model's structured answer to one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// A final textual answer.
    Text(String),
    /// A request to run tools, with any text the model sent alongside.
    ToolCalls {
        content: Option<String>,
        calls: Vec<ToolCallRequest>,
    },
    /// Neither text nor tool calls.
    Empty,
}

impl Completion {
    /// Classify a raw response.
    ///
    /// Tool calls win over text. Empty text counts as no text.
    pub fn from_parts(content: Option<String>, calls: Vec<ToolCallRequest>) -> Self {
        let content = content.filter(|text| !text.is_empty());
        match (content, calls.is_empty()) {
            (content, false) => Self::ToolCalls { content, calls },
            (Some(text), true) => Self::Text(text),
            (None, true) => Self::Empty,
        }
    }

    /// The assistant message recording this completion.
    pub fn to_message(&self) -> Message {
        match self {
            Self::Text(text) => Message::assistant(text.clone()),
            Self::ToolCalls { content, calls } => {
                Message::assistant_tool_calls(content.clone(), calls.clone())
            }
            Self::Empty => Message::new(Role::Assistant, None),
        }
    }
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Everything needed for a model request.
#[derive(Debug, Clone, Copy)]
pub struct ModelRequest<'a> {
    pub messages: &'a [Message],
    /// Tools offered to the model. `None` means no tool choice is offered.
    pub tools: Option<&'a [FunctionSchema]>,
}

/// The response from a model.
#[derive(Debug, Clone)]
pub struct ModelResponse {
    pub completion: Completion,
    pub usage: Usage,
}

/// Trait for LLM provider backends.
///
/// Implementations must not touch the conversation; the caller records the
/// completion.
pub trait Backend: Send + Sync {
    fn complete(
        &self,
        request: ModelRequest<'_>,
    ) -> impl Future<Output = Result<ModelResponse, ModelError>> + Send;
}
