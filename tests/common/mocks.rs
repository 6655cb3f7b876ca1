//! Mock implementations for testing.
//!
//! Scripted LLM clients shared by the integration tests, so no test needs a
//! running model server.

use async_trait::async_trait;
use promptool::llm::client::{ConversationMessage, LLMResponse};
use promptool::llm::{LLMClient, ModelDescriptor};
use promptool::types::{AppError, ConversationTurn, Result, ToolCall, ToolDefinition};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Mock client replaying a fixed list of replies, one per model call.
///
/// Every request is recorded so tests can inspect what the loop sent.
/// Running out of replies is an error, which makes runaway loops visible.
pub struct ScriptedLLMClient {
    replies: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<Vec<ConversationTurn>>>,
    descriptor: ModelDescriptor,
}

impl ScriptedLLMClient {
    /// Create a client that answers with `replies` in order.
    pub fn new(replies: &[&str]) -> Self {
        Self::with_results(replies.iter().map(|reply| Ok(reply.to_string())).collect())
    }

    pub fn with_results(replies: Vec<Result<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
            descriptor: ModelDescriptor::new("scripted-model"),
        }
    }

    /// Report a custom descriptor for capability inspection.
    pub fn with_descriptor(mut self, descriptor: ModelDescriptor) -> Self {
        self.descriptor = descriptor;
        self
    }

    /// Turns sent with each model call, oldest first.
    pub fn requests(&self) -> Vec<Vec<ConversationTurn>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LLMClient for ScriptedLLMClient {
    async fn complete(&self, messages: &[ConversationTurn]) -> Result<String> {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::LLM("script exhausted".to_string())))
    }

    fn descriptor(&self) -> Result<ModelDescriptor> {
        Ok(self.descriptor.clone())
    }

    fn model_name(&self) -> &str {
        &self.descriptor.model
    }
}

/// Mock client whose every call fails.
pub struct FailingClient;

#[async_trait]
impl LLMClient for FailingClient {
    async fn complete(&self, _messages: &[ConversationTurn]) -> Result<String> {
        Err(AppError::LLM("Mock LLM failure".to_string()))
    }

    fn model_name(&self) -> &str {
        "failing-model"
    }
}

/// Mock client with native function calling, replaying tool-calling responses.
pub struct NativeLLMClient {
    responses: Mutex<VecDeque<LLMResponse>>,
    seen_tools: Mutex<Vec<String>>,
}

impl NativeLLMClient {
    pub fn new(responses: Vec<LLMResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            seen_tools: Mutex::new(Vec::new()),
        }
    }

    /// Response requesting one tool call.
    pub fn call(id: &str, name: &str, arguments: serde_json::Value) -> LLMResponse {
        LLMResponse {
            content: String::new(),
            tool_calls: vec![ToolCall {
                id: id.to_string(),
                name: name.to_string(),
                arguments,
            }],
            finish_reason: "tool_calls".to_string(),
        }
    }

    /// Plain text response.
    pub fn answer(content: &str) -> LLMResponse {
        LLMResponse {
            content: content.to_string(),
            tool_calls: Vec::new(),
            finish_reason: "stop".to_string(),
        }
    }

    /// Tool names sent with the most recent request.
    pub fn seen_tools(&self) -> Vec<String> {
        self.seen_tools.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMClient for NativeLLMClient {
    async fn complete(&self, _messages: &[ConversationTurn]) -> Result<String> {
        Err(AppError::LLM("text completion not scripted".to_string()))
    }

    async fn complete_with_tools(
        &self,
        _messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        *self.seen_tools.lock().unwrap() = tools.iter().map(|tool| tool.name.clone()).collect();
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AppError::LLM("script exhausted".to_string()))
    }

    fn descriptor(&self) -> Result<ModelDescriptor> {
        Ok(ModelDescriptor::new("native-model").with_function_calling(true))
    }

    fn model_name(&self) -> &str {
        "native-model"
    }
}
