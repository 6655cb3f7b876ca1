use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::num::NonZeroUsize;

// ============= Conversation Types =============

/// Role of a turn in a prompt-protocol conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Wire name used by chat-completion style APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One role-tagged turn of a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Maximum number of request/parse/execute cycles a loop may perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct IterationBudget(NonZeroUsize);

impl IterationBudget {
    /// Default budget when none is configured.
    pub const DEFAULT: usize = 5;

    pub fn new(cycles: usize) -> Result<Self> {
        NonZeroUsize::new(cycles)
            .map(Self)
            .ok_or_else(|| AppError::InvalidInput("iteration budget must be positive".into()))
    }

    pub fn get(&self) -> usize {
        self.0.get()
    }
}

impl Default for IterationBudget {
    fn default() -> Self {
        Self(NonZeroUsize::new(Self::DEFAULT).unwrap_or(NonZeroUsize::MIN))
    }
}

impl TryFrom<usize> for IterationBudget {
    type Error = AppError;

    fn try_from(value: usize) -> Result<Self> {
        Self::new(value)
    }
}

impl From<IterationBudget> for usize {
    fn from(value: IterationBudget) -> Self {
        value.get()
    }
}

// ============= Tool Types =============

/// Catalog entry describing one invocable tool.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON schema for the tool input, usually `{"type": "object", "properties": {...}}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

impl ToolDefinition {
    /// Flattened `(name, type, description)` listing of the schema properties.
    ///
    /// Empty when there is no schema or the schema has no named properties.
    pub fn parameters(&self) -> Vec<(String, String, String)> {
        let Some(properties) = self
            .input_schema
            .as_ref()
            .and_then(|schema| schema.get("properties"))
            .and_then(Value::as_object)
        else {
            return Vec::new();
        };

        properties
            .iter()
            .map(|(name, info)| {
                let kind = info
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("any")
                    .to_string();
                let description = info
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                (name.clone(), kind, description)
            })
            .collect()
    }
}

/// A tool call decoded from model output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCallRequest {
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolCallRequest {
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Result of dispatching one tool call. Produced for every request, never thrown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", content = "value", rename_all = "lowercase")]
pub enum ToolCallOutcome {
    Success(Value),
    Failure(String),
}

impl ToolCallOutcome {
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure(message.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolCallOutcome::Success(_))
    }

    /// Text fed back to the model inside the result markup.
    pub fn to_text(&self) -> String {
        match self {
            ToolCallOutcome::Success(Value::String(text)) => text.clone(),
            ToolCallOutcome::Success(value) => value.to_string(),
            ToolCallOutcome::Failure(message) => format!("Error: {}", message),
        }
    }
}

/// A tool call returned by a provider's native function-calling interface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
