//! LLM clients and capability detection
//!
//! # Architecture
//!
//! - [`LLMClient`] - the trait every model client implements
//! - [`CapabilityProfile`] - cached verdict on native tool-calling support
//! - [`OpenAIClient`] - HTTP client for OpenAI-compatible chat completion APIs
//!
//! # Example
//!
//! ```ignore
//! use promptool::llm::{LLMClient, OpenAIClient};
//! use promptool::types::ConversationTurn;
//!
//! let client = OpenAIClient::new("http://localhost:11434/v1", "llama3.2")?;
//! let reply = client.complete(&[ConversationTurn::user("What is 2+2?")]).await?;
//! ```

/// Native tool-calling capability detection.
pub mod capabilities;
/// Core LLM client trait and message types.
pub mod client;
/// OpenAI-compatible HTTP client.
pub mod openai;

pub use capabilities::{detect, CapabilityProfile, CapabilitySignal, ModelDescriptor, ModelInfo};
pub use client::{
    collect_stream, ConversationMessage, LLMClient, LLMResponse, MessageRole, TextStream,
};
pub use openai::OpenAIClient;
