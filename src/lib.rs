//! # promptool
//!
//! Tool calling for chat models that may or may not support it natively.
//!
//! A model with native function calling gets structured tool definitions.
//! Every other model is taught a small textual protocol through its system
//! prompt; its replies are scanned for `<tool_call>` blocks, the tools are
//! executed, and the results are fed back until the model answers or the
//! iteration budget runs out.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use promptool::{select, Agent, IterationBudget, OpenAIClient, ToolRegistry};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Arc::new(OpenAIClient::new("http://localhost:11434/v1", "llama3.2")?);
//!     let tools = Arc::new(ToolRegistry::with_builtin_tools());
//!
//!     let mut agent = select(client, tools, "You are a helpful assistant.", IterationBudget::default());
//!     let response = agent.run("What is 17 * 23?").await;
//!     println!("{}", response.chat_message);
//!     Ok(())
//! }
//! ```
//!
//! ### Custom Tools
//!
//! ```rust,ignore
//! use promptool::tools::FnTool;
//! use serde_json::{Map, Value};
//!
//! let mut registry = ToolRegistry::new();
//! registry.register(Arc::new(
//!     FnTool::new("shout", |args: &Map<String, Value>| {
//!         let text = args.get("text").and_then(Value::as_str).unwrap_or_default();
//!         Ok(Value::String(text.to_uppercase()))
//!     })
//!     .with_description("Uppercase the given text"),
//! ));
//! ```
//!
//! ## Modules
//!
//! - [`agents`] - agent selection and the tool-calling loops
//! - [`protocol`] - the textual tool-call protocol
//! - [`llm`] - model clients and capability detection
//! - [`tools`] - tool trait, registry, dispatcher and built-in tools
//! - [`memory`] - per-run conversation state
//! - [`types`] - shared types and errors
//! - [`utils`] - configuration and logging
//! - [`cli`] - command line shell

/// Agent selection and tool-calling loops.
pub mod agents;
/// Command line parsing and terminal output.
pub mod cli;
/// LLM clients and capability detection.
pub mod llm;
/// Conversation state for one run.
pub mod memory;
/// Textual tool-call protocol.
pub mod protocol;
/// Tools, registry and dispatch.
pub mod tools;
/// Core types and error handling.
pub mod types;
/// Configuration and logging setup.
pub mod utils;

pub use agents::{
    select, select_with, Agent, AgentEvent, AgentHandle, AgentInfo, AgentKind, AgentResponse,
    AgentSettings, NativeAgent, PromptAgent, Termination,
};
pub use llm::{CapabilityProfile, LLMClient, ModelDescriptor, ModelInfo, OpenAIClient};
pub use tools::{Tool, ToolDispatcher, ToolRegistry};
pub use types::{
    AppError, ConversationTurn, IterationBudget, Result, Role, ToolCallOutcome, ToolCallRequest,
    ToolDefinition,
};
pub use utils::config::{ConfigError, PromptoolConfig};
