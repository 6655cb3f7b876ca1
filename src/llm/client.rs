//! LLM client abstraction
//!
//! Everything the orchestration engine needs from a model: ordered turns in,
//! full text or a stream of text fragments out. Failures are always errors,
//! never an empty or canned reply.

use crate::llm::capabilities::{CapabilityProfile, ModelDescriptor};
use crate::types::{AppError, ConversationTurn, Result, Role, ToolCall, ToolDefinition};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// Stream of text fragments from a streaming completion.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Generic LLM client trait for provider abstraction
///
/// Only [`complete`](LLMClient::complete) and [`model_name`](LLMClient::model_name)
/// are required. Streaming defaults to a single fragment, and native tool
/// calling defaults to unsupported.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Complete a conversation, returning the full reply text
    async fn complete(&self, messages: &[ConversationTurn]) -> Result<String>;

    /// Stream a completion as text fragments
    async fn stream(&self, messages: &[ConversationTurn]) -> Result<TextStream> {
        let text = self.complete(messages).await?;
        Ok(Box::pin(futures::stream::once(async move { Ok(text) })))
    }

    /// Complete with structured tool definitions (native function calling)
    async fn complete_with_tools(
        &self,
        _messages: &[ConversationMessage],
        _tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        Err(AppError::LLM(format!(
            "Model '{}' does not support native tool calling",
            self.model_name()
        )))
    }

    /// Describe the model for capability inspection
    fn descriptor(&self) -> Result<ModelDescriptor> {
        Ok(ModelDescriptor::new(self.model_name()))
    }

    /// Native tool-calling verdict for this client
    fn capabilities(&self) -> CapabilityProfile {
        CapabilityProfile::inspect(self.descriptor())
    }

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Drain a text stream into one string, failing on the first error.
pub async fn collect_stream(mut stream: TextStream) -> Result<String> {
    let mut text = String::new();
    while let Some(fragment) = stream.next().await {
        text.push_str(&fragment?);
    }
    Ok(text)
}

/// Response from a native tool-calling request
#[derive(Debug, Clone, Default)]
pub struct LLMResponse {
    /// The text content of the response
    pub content: String,
    /// Any tool calls requested by the model
    pub tool_calls: Vec<ToolCall>,
    /// The reason generation stopped (e.g., "stop", "tool_calls", "length")
    pub finish_reason: String,
}

/// Role of a message sender in a native tool-calling conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    /// Tool execution result.
    Tool,
}

/// A message in a native tool-calling conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationMessage {
    pub role: MessageRole,
    pub content: String,
    /// Tool calls requested by the assistant (only for Assistant role).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Call being answered (only for Tool role).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ConversationMessage {
    fn plain(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(MessageRole::User, content)
    }

    /// Create an assistant message with optional tool calls.
    pub fn assistant(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::plain(MessageRole::Assistant, content)
        }
    }

    /// Create a tool result message answering `tool_call_id`.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::plain(MessageRole::Tool, content)
        }
    }
}

impl From<&ConversationTurn> for ConversationMessage {
    fn from(turn: &ConversationTurn) -> Self {
        let role = match turn.role {
            Role::System => MessageRole::System,
            Role::User => MessageRole::User,
            Role::Assistant => MessageRole::Assistant,
        };
        Self::plain(role, turn.content.clone())
    }
}
