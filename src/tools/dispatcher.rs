//! Tool dispatch
//!
//! Turns decoded [`ToolCallRequest`]s into [`ToolCallOutcome`]s. Every request
//! produces exactly one outcome: unknown tools, tool errors, panics and
//! timeouts all become failure values that are shown to the model.

use crate::tools::registry::ToolRegistry;
use crate::types::{ToolCallOutcome, ToolCallRequest, ToolDefinition};
use futures::stream::{self, Stream, StreamExt};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, warn};

/// How a batch of calls from one model turn is executed.
#[derive(Debug, Clone, Default)]
pub struct DispatchConfig {
    /// Run the calls of one turn concurrently.
    /// Outcomes are still returned in request order.
    pub parallel: bool,

    /// Upper bound for a single tool invocation.
    pub tool_timeout: Option<Duration>,
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

#[derive(Debug, Clone)]
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    config: DispatchConfig,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self::with_config(registry, DispatchConfig::default())
    }

    pub fn with_config(registry: Arc<ToolRegistry>, config: DispatchConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.registry.get_tool_definitions()
    }

    /// Execute one request. Never fails; problems become failure outcomes.
    pub async fn execute(&self, request: &ToolCallRequest) -> ToolCallOutcome {
        let Some(tool) = self.registry.get(&request.name) else {
            warn!(tool = %request.name, "Model requested an unknown tool");
            return ToolCallOutcome::failure(format!("unknown tool: {}", request.name));
        };

        let start = Instant::now();
        let arguments = request.arguments.clone();
        let invocation =
            AssertUnwindSafe(async move { tool.execute(arguments).await }).catch_unwind();
        let result = match self.config.tool_timeout {
            Some(limit) => match timeout(limit, invocation).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(tool = %request.name, ?limit, "Tool execution timed out");
                    return ToolCallOutcome::failure(format!(
                        "tool '{}' timed out after {}s",
                        request.name,
                        limit.as_secs_f64()
                    ));
                }
            },
            None => invocation.await,
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(value)) => {
                debug!(tool = %request.name, duration_ms, "Tool executed");
                ToolCallOutcome::Success(value)
            }
            Ok(Err(e)) => {
                warn!(tool = %request.name, duration_ms, "Tool failed: {}", e);
                ToolCallOutcome::failure(e.to_string())
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                warn!(tool = %request.name, duration_ms, "Tool panicked: {}", message);
                ToolCallOutcome::failure(format!("tool '{}' panicked: {}", request.name, message))
            }
        }
    }

    /// Outcomes of a batch as a stream, in request order.
    ///
    /// Sequential mode starts each call after the previous one finished;
    /// parallel mode starts all of them at once and still yields in order.
    pub fn execute_ordered<'a>(
        &'a self,
        requests: &'a [ToolCallRequest],
    ) -> impl Stream<Item = ToolCallOutcome> + Send + 'a {
        let concurrency = if self.config.parallel {
            requests.len().max(1)
        } else {
            1
        };
        stream::iter(requests)
            .map(move |request| self.execute(request))
            .buffered(concurrency)
    }

    /// Execute a batch, returning outcomes in request order.
    pub async fn execute_all(&self, requests: &[ToolCallRequest]) -> Vec<ToolCallOutcome> {
        self.execute_ordered(requests).collect().await
    }
}
