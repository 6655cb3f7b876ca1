//! OpenAI-compatible chat completions client
//!
//! Works against any server exposing `POST {base_url}/chat/completions`
//! (OpenAI, OpenRouter, vLLM, llama.cpp server, Ollama's `/v1` endpoint).
//! Streaming uses server-sent events: `data:` lines terminated by `[DONE]`.

use crate::llm::capabilities::{CapabilityProfile, ModelDescriptor};
use crate::llm::client::{ConversationMessage, LLMClient, LLMResponse, MessageRole, TextStream};
use crate::types::{AppError, ConversationTurn, Result, ToolCall, ToolDefinition};
use crate::utils::config::LlmConfig;
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{json, Value};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

pub struct OpenAIClient {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    descriptor: ModelDescriptor,
    profile: OnceLock<CapabilityProfile>,
}

impl OpenAIClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, model, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::LLM(format!("Failed to build HTTP client: {}", e)))?;
        let model = model.into();

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            descriptor: ModelDescriptor::new(model.clone()),
            model,
            api_key: None,
            temperature: None,
            max_tokens: None,
            profile: OnceLock::new(),
        })
    }

    /// Build a client from the `[llm]` configuration section.
    pub fn from_config(config: &LlmConfig, api_key: Option<String>) -> Result<Self> {
        let mut descriptor = ModelDescriptor::new(config.model.clone());
        descriptor.model_info = config.model_info.clone();
        descriptor.function_calling = config.function_calling;
        descriptor.parallel_tool_calls = config.parallel_tool_calls;

        let mut client = Self::with_timeout(
            config.base_url.clone(),
            config.model.clone(),
            config.timeout(),
        )?
        .with_descriptor(descriptor);
        client.api_key = api_key.filter(|key| !key.trim().is_empty());
        client.temperature = config.temperature;
        client.max_tokens = config.max_tokens;
        Ok(client)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Replace the capability descriptor; resets the cached profile.
    pub fn with_descriptor(mut self, descriptor: ModelDescriptor) -> Self {
        self.descriptor = descriptor;
        self.profile = OnceLock::new();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn request_body(&self, messages: Vec<Value>, stream: bool) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "stream": stream,
        });
        if let Some(temperature) = self.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        body
    }

    async fn post(&self, body: &Value) -> Result<reqwest::Response> {
        let mut request = self.http_client.post(self.endpoint()).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::LLM(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::LLM(format!(
                "Chat completion request failed ({}): {}",
                status, text
            )));
        }

        Ok(response)
    }

    async fn post_json(&self, body: &Value) -> Result<Value> {
        self.post(body)
            .await?
            .json()
            .await
            .map_err(|e| AppError::LLM(format!("Failed to parse response: {}", e)))
    }
}

fn turn_to_wire(turn: &ConversationTurn) -> Value {
    json!({"role": turn.role.as_str(), "content": turn.content})
}

fn message_to_wire(message: &ConversationMessage) -> Value {
    match message.role {
        MessageRole::Tool => json!({
            "role": "tool",
            "tool_call_id": message.tool_call_id,
            "content": message.content,
        }),
        MessageRole::Assistant if !message.tool_calls.is_empty() => {
            let calls: Vec<Value> = message
                .tool_calls
                .iter()
                .map(|call| {
                    json!({
                        "id": call.id,
                        "type": "function",
                        "function": {
                            "name": call.name,
                            "arguments": call.arguments.to_string(),
                        }
                    })
                })
                .collect();
            json!({"role": "assistant", "content": message.content, "tool_calls": calls})
        }
        role => {
            let role = match role {
                MessageRole::System => "system",
                MessageRole::User => "user",
                _ => "assistant",
            };
            json!({"role": role, "content": message.content})
        }
    }
}

fn tool_to_wire(tool: &ToolDefinition) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description.clone().unwrap_or_default(),
            "parameters": tool
                .input_schema
                .clone()
                .unwrap_or_else(|| json!({"type": "object", "properties": {}})),
        }
    })
}

fn first_choice(response: &Value) -> Result<&Value> {
    if let Some(error) = response.get("error") {
        return Err(AppError::LLM(format!("Provider returned an error: {}", error)));
    }
    response
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .ok_or_else(|| AppError::LLM("No choices in response".to_string()))
}

/// Parse a native tool-calling response body.
fn parse_tool_response(response: &Value) -> Result<LLMResponse> {
    let choice = first_choice(response)?;
    let message = choice
        .get("message")
        .ok_or_else(|| AppError::LLM("No message in response".to_string()))?;

    let content = message
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let tool_calls = message
        .get("tool_calls")
        .and_then(Value::as_array)
        .map(|calls| {
            calls
                .iter()
                .enumerate()
                .filter_map(|(index, call)| {
                    let function = call.get("function")?;
                    let name = function.get("name")?.as_str()?.to_string();
                    // Arguments arrive as a JSON-encoded string
                    let arguments = match function.get("arguments") {
                        Some(Value::String(raw)) => {
                            serde_json::from_str(raw).unwrap_or_else(|_| json!({}))
                        }
                        Some(other) => other.clone(),
                        None => json!({}),
                    };
                    let id = call
                        .get("id")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("call_{}", index));
                    Some(ToolCall {
                        id,
                        name,
                        arguments,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let finish_reason = choice
        .get("finish_reason")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();

    Ok(LLMResponse {
        content,
        tool_calls,
        finish_reason,
    })
}

/// One meaningful server-sent event line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SseEvent {
    Fragment(String),
    Done,
}

fn parse_sse_line(line: &str) -> Result<Option<SseEvent>> {
    let Some(payload) = line.trim().strip_prefix("data:") else {
        return Ok(None);
    };
    let payload = payload.trim();
    if payload == "[DONE]" {
        return Ok(Some(SseEvent::Done));
    }
    if payload.is_empty() {
        return Ok(None);
    }

    let chunk: Value = serde_json::from_str(payload)
        .map_err(|e| AppError::LLM(format!("Invalid stream chunk: {}", e)))?;
    if let Some(error) = chunk.get("error") {
        return Err(AppError::LLM(format!("Provider returned an error: {}", error)));
    }

    Ok(chunk["choices"][0]["delta"]["content"]
        .as_str()
        .filter(|text| !text.is_empty())
        .map(|text| SseEvent::Fragment(text.to_string())))
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn complete(&self, messages: &[ConversationTurn]) -> Result<String> {
        let body = self.request_body(messages.iter().map(turn_to_wire).collect(), false);
        debug!(model = %self.model, turns = messages.len(), "Requesting chat completion");

        let response = self.post_json(&body).await?;
        first_choice(&response)?
            .get("message")
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AppError::LLM("No content in response".to_string()))
    }

    async fn stream(&self, messages: &[ConversationTurn]) -> Result<TextStream> {
        let body = self.request_body(messages.iter().map(turn_to_wire).collect(), true);
        debug!(model = %self.model, turns = messages.len(), "Requesting streaming completion");

        let response = self.post(&body).await?;

        let result_stream = async_stream::stream! {
            let mut bytes = response.bytes_stream();
            let mut buffer: Vec<u8> = Vec::new();
            let mut done = false;

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(AppError::LLM(format!("Stream error: {}", e)));
                        done = true;
                        break;
                    }
                };
                buffer.extend_from_slice(&chunk);

                while let Some(newline) = buffer.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=newline).collect();
                    match parse_sse_line(&String::from_utf8_lossy(&line)) {
                        Ok(Some(SseEvent::Fragment(text))) => yield Ok(text),
                        Ok(Some(SseEvent::Done)) => {
                            done = true;
                            break;
                        }
                        Ok(None) => {}
                        Err(e) => {
                            yield Err(e);
                            done = true;
                            break;
                        }
                    }
                }

                if done {
                    break;
                }
            }

            if !done && !buffer.is_empty() {
                match parse_sse_line(&String::from_utf8_lossy(&buffer)) {
                    Ok(Some(SseEvent::Fragment(text))) => yield Ok(text),
                    Ok(_) => {}
                    Err(e) => yield Err(e),
                }
            }
        };

        Ok(Box::pin(result_stream))
    }

    async fn complete_with_tools(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        let mut body = self.request_body(messages.iter().map(message_to_wire).collect(), false);
        if !tools.is_empty() {
            body["tools"] = Value::Array(tools.iter().map(tool_to_wire).collect());
            body["tool_choice"] = json!("auto");
        }
        debug!(
            model = %self.model,
            messages = messages.len(),
            tools = tools.len(),
            "Requesting native tool-calling completion"
        );

        let response = self.post_json(&body).await?;
        parse_tool_response(&response)
    }

    fn descriptor(&self) -> Result<ModelDescriptor> {
        Ok(self.descriptor.clone())
    }

    fn capabilities(&self) -> CapabilityProfile {
        *self
            .profile
            .get_or_init(|| CapabilityProfile::from_descriptor(&self.descriptor))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
