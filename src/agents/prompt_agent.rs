//! Textual tool-call protocol agent
//!
//! Each run is a small state machine:
//!
//! ```text
//! Requesting -> Parsing -> Executing -> Requesting ...
//!                   |           |
//!                   v           v
//!               Finishing   Exhausted        (Aborted from Requesting)
//! ```
//!
//! Every model call sees the full turn sequence: the system prompt with the
//! tool catalog, the retained history, the user task and one assistant turn
//! per executed cycle (the raw reply followed by the formatted results).

use crate::agents::{Agent, AgentEvent, EventStream, RunSummary, Termination};
use crate::llm::client::{collect_stream, LLMClient};
use crate::memory::Conversation;
use crate::protocol::{compose_system_prompt, decode, format_outcome, strip};
use crate::tools::dispatcher::ToolDispatcher;
use crate::types::{ConversationTurn, IterationBudget, Result, ToolCallRequest};
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// States of one run of the protocol loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Requesting,
    Parsing,
    Executing,
    Finishing,
    Aborted,
    Exhausted,
}

impl LoopState {
    /// Terminal states map onto how the run ended.
    pub fn termination(&self) -> Option<Termination> {
        match self {
            LoopState::Finishing => Some(Termination::Finished),
            LoopState::Aborted => Some(Termination::Aborted),
            LoopState::Exhausted => Some(Termination::Exhausted),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.termination().is_some()
    }
}

pub struct PromptAgent {
    name: String,
    client: Arc<dyn LLMClient>,
    dispatcher: ToolDispatcher,
    system_prompt: String,
    budget: IterationBudget,
    stream_replies: bool,
    history: Vec<ConversationTurn>,
    last_run: Option<RunSummary>,
}

impl PromptAgent {
    /// Create an agent whose system prompt is `system_message` plus the
    /// catalog of the dispatcher's tools (the bare message when there are none).
    pub fn new(
        client: Arc<dyn LLMClient>,
        dispatcher: ToolDispatcher,
        system_message: &str,
        budget: IterationBudget,
    ) -> Self {
        let system_prompt = compose_system_prompt(system_message, &dispatcher.tool_definitions());

        Self {
            name: "assistant".to_string(),
            client,
            dispatcher,
            system_prompt,
            budget,
            stream_replies: false,
            history: Vec::new(),
            last_run: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Read model replies through the client's streaming interface
    pub fn with_streaming(mut self, enabled: bool) -> Self {
        self.stream_replies = enabled;
        self
    }

    pub fn budget(&self) -> IterationBudget {
        self.budget
    }

    pub fn dispatcher(&self) -> &ToolDispatcher {
        &self.dispatcher
    }

    async fn request(&self, turns: &[ConversationTurn]) -> Result<String> {
        if self.stream_replies {
            collect_stream(self.client.stream(turns).await?).await
        } else {
            self.client.complete(turns).await
        }
    }
}

#[async_trait]
impl Agent for PromptAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    fn reset_conversation(&mut self) {
        self.history.clear();
        self.last_run = None;
    }

    fn last_run(&self) -> Option<RunSummary> {
        self.last_run
    }

    fn run_stream<'a>(
        &'a mut self,
        task: &'a str,
        cancel: CancellationToken,
    ) -> EventStream<'a> {
        Box::pin(async_stream::stream! {
            self.history.push(ConversationTurn::user(task));
            let mut conversation = Conversation::new(&self.system_prompt, &self.history);

            let mut state = LoopState::Requesting;
            let mut iterations = 0usize;
            let mut reply = String::new();
            let mut calls: Vec<ToolCallRequest> = Vec::new();

            let termination = loop {
                match state {
                    LoopState::Requesting => {
                        if cancel.is_cancelled() {
                            info!(agent = %self.name, "Run cancelled");
                            state = LoopState::Aborted;
                            continue;
                        }

                        iterations += 1;
                        debug!(agent = %self.name, iteration = iterations, turns = conversation.turns().len(), "Requesting model reply");

                        match self.request(conversation.turns()).await {
                            Ok(text) if text.trim().is_empty() => {
                                warn!(agent = %self.name, "Model returned an empty reply");
                                state = LoopState::Aborted;
                            }
                            Ok(text) => {
                                reply = text;
                                state = LoopState::Parsing;
                            }
                            Err(e) => {
                                warn!(agent = %self.name, "Model call failed: {}", e);
                                yield AgentEvent::error(e.to_string());
                                state = LoopState::Aborted;
                            }
                        }
                    }
                    LoopState::Parsing => {
                        calls = decode(&reply);
                        debug!(agent = %self.name, calls = calls.len(), "Decoded tool calls");

                        if calls.is_empty() {
                            let answer = strip(&reply);
                            if !answer.is_empty() {
                                yield AgentEvent::final_answer(answer);
                            }
                            state = LoopState::Finishing;
                        } else {
                            state = LoopState::Executing;
                        }
                    }
                    LoopState::Executing => {
                        let mut results = Vec::with_capacity(calls.len());
                        {
                            let mut outcomes = std::pin::pin!(self.dispatcher.execute_ordered(&calls));
                            for call in &calls {
                                let Some(outcome) = outcomes.next().await else {
                                    break;
                                };
                                yield AgentEvent::progress(call.name.clone());
                                results.push(format_outcome(&call.name, &outcome));
                            }
                        }

                        conversation.push_assistant(format!("{}\n{}", reply, results.join("\n")));

                        state = if iterations >= self.budget.get() {
                            info!(agent = %self.name, budget = self.budget.get(), "Iteration budget exhausted");
                            LoopState::Exhausted
                        } else {
                            LoopState::Requesting
                        };
                    }
                    LoopState::Finishing => break Termination::Finished,
                    LoopState::Aborted => break Termination::Aborted,
                    LoopState::Exhausted => break Termination::Exhausted,
                }
            };

            if let Some(turn) = conversation.last_appended() {
                self.history.push(turn.clone());
            }
            self.last_run = Some(RunSummary { termination, iterations });
            debug!(agent = %self.name, %termination, iterations, "Run finished");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{echo::Echo, ToolRegistry};
    use crate::types::AppError;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct Scripted {
        replies: Mutex<VecDeque<Result<String>>>,
        seen: Mutex<Vec<Vec<ConversationTurn>>>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LLMClient for Scripted {
        async fn complete(&self, messages: &[ConversationTurn]) -> Result<String> {
            self.seen.lock().unwrap().push(messages.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("fallback".to_string()))
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn echo_dispatcher() -> ToolDispatcher {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo));
        ToolDispatcher::new(Arc::new(registry))
    }

    const ECHO_CALL: &str =
        "<tool_call>\n<name>echo</name>\n<arguments>{\"text\": \"hi\"}</arguments>\n</tool_call>";

    #[test]
    fn test_loop_state_terminals() {
        assert!(!LoopState::Requesting.is_terminal());
        assert_eq!(LoopState::Exhausted.termination(), Some(Termination::Exhausted));
    }

    #[test]
    fn test_system_prompt_includes_catalog() {
        let agent = PromptAgent::new(
            Scripted::new(vec![]),
            echo_dispatcher(),
            "Be brief.",
            IterationBudget::default(),
        );
        assert!(agent.system_prompt().starts_with("Be brief.\n\n"));
        assert!(agent.system_prompt().contains("- echo: Repeat the given text back"));
    }

    #[tokio::test]
    async fn test_tool_turn_is_reply_plus_results() {
        let client = Scripted::new(vec![Ok(ECHO_CALL.to_string()), Ok("Done".to_string())]);
        let mut agent = PromptAgent::new(
            client.clone(),
            echo_dispatcher(),
            "sys",
            IterationBudget::default(),
        );

        let response = agent.run("say hi").await;
        assert_eq!(response.chat_message, "Done");

        let seen = client.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        let tool_turn = seen[1].last().unwrap();
        assert_eq!(
            tool_turn.content,
            format!("{}\n\n<tool_result name='echo'>\nhi\n</tool_result>\n", ECHO_CALL)
        );
    }

    #[tokio::test]
    async fn test_model_error_yields_one_error_event() {
        let client = Scripted::new(vec![Err(AppError::LLM("offline".into()))]);
        let mut agent = PromptAgent::new(client, echo_dispatcher(), "sys", IterationBudget::default());

        let events: Vec<_> = agent
            .run_stream("hello", CancellationToken::new())
            .collect()
            .await;

        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], AgentEvent::Error { message } if message.contains("offline")));
        assert_eq!(agent.last_run().unwrap().termination, Termination::Aborted);
    }

    #[tokio::test]
    async fn test_empty_reply_aborts_silently() {
        let client = Scripted::new(vec![Ok("   \n".to_string())]);
        let mut agent = PromptAgent::new(client, echo_dispatcher(), "sys", IterationBudget::default());

        let response = agent.run("hello").await;
        assert!(response.inner_messages.is_empty());
        assert_eq!(response.termination, Termination::Aborted);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_request() {
        let client = Scripted::new(vec![Ok("never".to_string())]);
        let mut agent = PromptAgent::new(client.clone(), echo_dispatcher(), "sys", IterationBudget::default());

        let cancel = CancellationToken::new();
        cancel.cancel();
        let events: Vec<_> = agent.run_stream("hello", cancel).collect().await;

        assert!(events.is_empty());
        assert!(client.seen.lock().unwrap().is_empty());
        assert_eq!(agent.last_run().unwrap().iterations, 0);
    }

    #[tokio::test]
    async fn test_history_and_reset() {
        let client = Scripted::new(vec![Ok(ECHO_CALL.to_string()), Ok("Done".to_string())]);
        let mut agent = PromptAgent::new(client, echo_dispatcher(), "sys", IterationBudget::default());

        agent.run("say hi").await;
        assert_eq!(agent.history().len(), 2);
        assert_eq!(agent.history()[0], ConversationTurn::user("say hi"));
        assert!(agent.history()[1].content.contains("<tool_result name='echo'>"));

        agent.reset_conversation();
        assert!(agent.history().is_empty());
        assert!(agent.last_run().is_none());
    }
}
