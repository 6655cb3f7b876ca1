//! Agents that run the tool-calling conversation
//!
//! Two implementations sit behind the [`Agent`] trait:
//!
//! - [`PromptAgent`] teaches the model the textual tool-call protocol and
//!   runs the bounded request/parse/execute loop itself.
//! - [`NativeAgent`] hands structured tool definitions to a model with
//!   native function calling.
//!
//! [`selector::select`] picks one per conversation from the client's
//! capability profile and wraps it in an [`AgentHandle`].

/// Native function-calling agent.
pub mod native;
/// Textual protocol agent and its loop state machine.
pub mod prompt_agent;
/// Capability-driven agent selection.
pub mod selector;

pub use native::NativeAgent;
pub use prompt_agent::{LoopState, PromptAgent};
pub use selector::{select, select_with, AgentHandle, AgentInfo, AgentKind, AgentSettings};

use crate::types::ConversationTurn;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

/// Chat message returned by [`Agent::run`] when a run produced no events.
pub const NO_RESPONSE: &str = "No response generated.";

/// Ordered events of one run.
pub type EventStream<'a> = Pin<Box<dyn Stream<Item = AgentEvent> + Send + 'a>>;

/// Something a UI shell can render while a run progresses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// A tool call finished (successfully or not).
    Progress { tool: String, content: String },
    /// The user-visible answer; ends a successful run.
    FinalAnswer { content: String },
    /// The model call failed; ends the run.
    Error { message: String },
}

impl AgentEvent {
    pub fn progress(tool: impl Into<String>) -> Self {
        let tool = tool.into();
        let content = format!("🛠 Tool '{}' executed", tool);
        AgentEvent::Progress { tool, content }
    }

    pub fn final_answer(content: impl Into<String>) -> Self {
        AgentEvent::FinalAnswer {
            content: content.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        AgentEvent::Error {
            message: message.into(),
        }
    }

    /// Display text of the event.
    pub fn content(&self) -> &str {
        match self {
            AgentEvent::Progress { content, .. } => content,
            AgentEvent::FinalAnswer { content } => content,
            AgentEvent::Error { message } => message,
        }
    }

    pub fn is_final_answer(&self) -> bool {
        matches!(self, AgentEvent::FinalAnswer { .. })
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The model answered without calling a tool.
    Finished,
    /// Cancelled, model error, or empty reply.
    #[default]
    Aborted,
    /// The iteration budget ran out before a final answer.
    Exhausted,
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Termination::Finished => write!(f, "finished"),
            Termination::Aborted => write!(f, "aborted"),
            Termination::Exhausted => write!(f, "no final answer produced"),
        }
    }
}

/// Bookkeeping of the most recent run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunSummary {
    pub termination: Termination,
    /// Model calls made during the run
    pub iterations: usize,
}

/// Collected result of a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentResponse {
    /// Content of the last event, or [`NO_RESPONSE`]
    pub chat_message: String,
    /// Every event before the last one
    pub inner_messages: Vec<AgentEvent>,
    pub termination: Termination,
    pub iterations: usize,
}

impl AgentResponse {
    pub fn from_events(mut events: Vec<AgentEvent>, summary: RunSummary) -> Self {
        let chat_message = events
            .pop()
            .map(|event| event.content().to_string())
            .unwrap_or_else(|| NO_RESPONSE.to_string());

        Self {
            chat_message,
            inner_messages: events,
            termination: summary.termination,
            iterations: summary.iterations,
        }
    }
}

/// A conversational agent owning its history.
#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;

    /// System prompt sent as the first turn of every request
    fn system_prompt(&self) -> &str;

    /// Turns retained between runs
    fn history(&self) -> &[ConversationTurn];

    /// Forget every retained turn
    fn reset_conversation(&mut self);

    /// Summary of the most recent completed run
    fn last_run(&self) -> Option<RunSummary>;

    /// Run one task, streaming events as they happen.
    ///
    /// Cancellation is observed before each model call. The stream ends
    /// when the run reaches a terminal state.
    fn run_stream<'a>(&'a mut self, task: &'a str, cancel: CancellationToken)
        -> EventStream<'a>;

    /// Run one task to completion and collect the events.
    async fn run(&mut self, task: &str) -> AgentResponse {
        let events: Vec<AgentEvent> = self
            .run_stream(task, CancellationToken::new())
            .collect()
            .await;
        AgentResponse::from_events(events, self.last_run().unwrap_or_default())
    }
}
