//! Native function-calling agent
//!
//! Used when the model client reports native tool-calling support. Tool
//! definitions travel as structured data and results come back as `tool`
//! role messages, so no prompt protocol is involved. Budget, cancellation
//! and the event vocabulary match [`PromptAgent`](crate::agents::PromptAgent).

use crate::agents::{Agent, AgentEvent, EventStream, RunSummary, Termination};
use crate::llm::client::{ConversationMessage, LLMClient};
use crate::tools::dispatcher::ToolDispatcher;
use crate::types::{ConversationTurn, IterationBudget, ToolCallRequest};
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct NativeAgent {
    name: String,
    client: Arc<dyn LLMClient>,
    dispatcher: ToolDispatcher,
    system_prompt: String,
    budget: IterationBudget,
    history: Vec<ConversationTurn>,
    last_run: Option<RunSummary>,
}

impl NativeAgent {
    pub fn new(
        client: Arc<dyn LLMClient>,
        dispatcher: ToolDispatcher,
        system_message: &str,
        budget: IterationBudget,
    ) -> Self {
        Self {
            name: "assistant".to_string(),
            client,
            dispatcher,
            system_prompt: system_message.to_string(),
            budget,
            history: Vec::new(),
            last_run: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn budget(&self) -> IterationBudget {
        self.budget
    }

    pub fn dispatcher(&self) -> &ToolDispatcher {
        &self.dispatcher
    }
}

fn arguments_map(arguments: &Value) -> Map<String, Value> {
    match arguments {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    }
}

#[async_trait]
impl Agent for NativeAgent {
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

            let mut messages: Vec<ConversationMessage> =
                Vec::with_capacity(self.history.len() + 1);
            messages.push(ConversationMessage::system(self.system_prompt.clone()));
            messages.extend(self.history.iter().map(ConversationMessage::from));

            let tools = self.dispatcher.tool_definitions();
            let mut iterations = 0usize;
            let mut answer: Option<String> = None;

            let termination = loop {
                if cancel.is_cancelled() {
                    info!(agent = %self.name, "Run cancelled");
                    break Termination::Aborted;
                }

                iterations += 1;
                debug!(agent = %self.name, iteration = iterations, "Requesting native tool-calling reply");

                let response = match self.client.complete_with_tools(&messages, &tools).await {
                    Ok(response) => response,
                    Err(e) => {
                        warn!(agent = %self.name, "Model call failed: {}", e);
                        yield AgentEvent::error(e.to_string());
                        break Termination::Aborted;
                    }
                };

                if response.tool_calls.is_empty() {
                    let content = response.content.trim();
                    if content.is_empty() {
                        warn!(agent = %self.name, "Model returned an empty reply");
                        break Termination::Aborted;
                    }
                    yield AgentEvent::final_answer(content);
                    answer = Some(content.to_string());
                    break Termination::Finished;
                }

                let requests: Vec<ToolCallRequest> = response
                    .tool_calls
                    .iter()
                    .map(|call| ToolCallRequest::new(call.name.clone(), arguments_map(&call.arguments)))
                    .collect();
                messages.push(ConversationMessage::assistant(
                    response.content.clone(),
                    response.tool_calls.clone(),
                ));

                {
                    let mut outcomes = std::pin::pin!(self.dispatcher.execute_ordered(&requests));
                    for call in &response.tool_calls {
                        let Some(outcome) = outcomes.next().await else {
                            break;
                        };
                        yield AgentEvent::progress(call.name.clone());
                        messages.push(ConversationMessage::tool_result(call.id.clone(), outcome.to_text()));
                    }
                }

                if iterations >= self.budget.get() {
                    info!(agent = %self.name, budget = self.budget.get(), "Iteration budget exhausted");
                    break Termination::Exhausted;
                }
            };

            if let Some(answer) = answer {
                self.history.push(ConversationTurn::assistant(answer));
            }
            self.last_run = Some(RunSummary { termination, iterations });
            debug!(agent = %self.name, %termination, iterations, "Run finished");
        })
    }
}
