//! Agent selection
//!
//! The capability verdict is taken once, when the conversation's agent is
//! built: a model with native tool calling gets a [`NativeAgent`] as long as
//! there is at least one tool, everything else gets a [`PromptAgent`].

use crate::agents::{Agent, EventStream, NativeAgent, PromptAgent, RunSummary};
use crate::llm::capabilities::CapabilitySignal;
use crate::llm::client::LLMClient;
use crate::tools::dispatcher::{DispatchConfig, ToolDispatcher};
use crate::tools::registry::ToolRegistry;
use crate::types::{ConversationTurn, IterationBudget};
use crate::utils::config::{ConfigError, PromptoolConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Native,
    PromptProtocol,
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentKind::Native => write!(f, "native"),
            AgentKind::PromptProtocol => write!(f, "prompt-protocol"),
        }
    }
}

/// Debug view of a selected agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentInfo {
    pub kind: AgentKind,
    /// Whether tools travel through native function calling
    pub function_calling: bool,
    pub tools_count: usize,
    pub model: String,
    /// Signal behind the capability verdict, if any resolved
    pub capability_source: Option<CapabilitySignal>,
}

/// Everything besides the client and the tools that shapes an agent.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub name: String,
    pub system_message: String,
    pub budget: IterationBudget,
    pub dispatch: DispatchConfig,
    /// Read protocol replies through the streaming interface
    pub stream_replies: bool,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            name: "assistant".to_string(),
            system_message: String::new(),
            budget: IterationBudget::default(),
            dispatch: DispatchConfig::default(),
            stream_replies: false,
        }
    }
}

impl AgentSettings {
    /// Settings from the `[agent]` and `[llm]` sections.
    pub fn from_config(config: &PromptoolConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            name: config.agent.name.clone(),
            system_message: config.agent.system_prompt.clone(),
            budget: config.agent.budget()?,
            dispatch: DispatchConfig {
                parallel: config.agent.parallel_tools,
                tool_timeout: config.agent.tool_timeout(),
            },
            stream_replies: config.llm.stream,
        })
    }
}

/// The agent chosen for a conversation.
pub enum AgentHandle {
    Native(NativeAgent),
    PromptProtocol(PromptAgent),
}

impl AgentHandle {
    pub fn kind(&self) -> AgentKind {
        match self {
            AgentHandle::Native(_) => AgentKind::Native,
            AgentHandle::PromptProtocol(_) => AgentKind::PromptProtocol,
        }
    }

    fn inner(&self) -> &dyn Agent {
        match self {
            AgentHandle::Native(agent) => agent,
            AgentHandle::PromptProtocol(agent) => agent,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Agent {
        match self {
            AgentHandle::Native(agent) => agent,
            AgentHandle::PromptProtocol(agent) => agent,
        }
    }

    fn dispatcher(&self) -> &ToolDispatcher {
        match self {
            AgentHandle::Native(agent) => agent.dispatcher(),
            AgentHandle::PromptProtocol(agent) => agent.dispatcher(),
        }
    }

    pub fn info(&self, client: &dyn LLMClient) -> AgentInfo {
        let profile = client.capabilities();
        AgentInfo {
            kind: self.kind(),
            function_calling: self.kind() == AgentKind::Native,
            tools_count: self.dispatcher().registry().len(),
            model: client.model_name().to_string(),
            capability_source: profile.source,
        }
    }
}

#[async_trait]
impl Agent for AgentHandle {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn system_prompt(&self) -> &str {
        self.inner().system_prompt()
    }

    fn history(&self) -> &[ConversationTurn] {
        self.inner().history()
    }

    fn reset_conversation(&mut self) {
        self.inner_mut().reset_conversation()
    }

    fn last_run(&self) -> Option<RunSummary> {
        self.inner().last_run()
    }

    fn run_stream<'a>(
        &'a mut self,
        task: &'a str,
        cancel: CancellationToken,
    ) -> EventStream<'a> {
        self.inner_mut().run_stream(task, cancel)
    }
}

/// Pick the agent for a conversation.
pub fn select(
    client: Arc<dyn LLMClient>,
    tools: Arc<ToolRegistry>,
    system_message: &str,
    budget: IterationBudget,
) -> AgentHandle {
    select_with(
        client,
        tools,
        AgentSettings {
            system_message: system_message.to_string(),
            budget,
            ..Default::default()
        },
    )
}

/// Pick the agent for a conversation with full settings.
pub fn select_with(
    client: Arc<dyn LLMClient>,
    tools: Arc<ToolRegistry>,
    settings: AgentSettings,
) -> AgentHandle {
    let profile = client.capabilities();
    let has_tools = !tools.is_empty();
    let dispatcher = ToolDispatcher::with_config(tools, settings.dispatch);

    if profile.native_tool_calling && has_tools {
        info!(
            agent = %settings.name,
            model = client.model_name(),
            tools = dispatcher.registry().len(),
            "Using native tool calling"
        );
        let agent = NativeAgent::new(client, dispatcher, &settings.system_message, settings.budget)
            .with_name(settings.name);
        return AgentHandle::Native(agent);
    }

    info!(
        agent = %settings.name,
        model = client.model_name(),
        native = profile.native_tool_calling,
        tools = dispatcher.registry().len(),
        "Using prompt-based tool calling"
    );
    let agent = PromptAgent::new(client, dispatcher, &settings.system_message, settings.budget)
        .with_name(settings.name)
        .with_streaming(settings.stream_replies);
    AgentHandle::PromptProtocol(agent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::capabilities::ModelDescriptor;
    use crate::tools::echo::Echo;
    use crate::types::Result;

    struct Described(ModelDescriptor);

    #[async_trait]
    impl LLMClient for Described {
        async fn complete(&self, _messages: &[ConversationTurn]) -> Result<String> {
            Ok("ok".to_string())
        }

        fn descriptor(&self) -> Result<ModelDescriptor> {
            Ok(self.0.clone())
        }

        fn model_name(&self) -> &str {
            &self.0.model
        }
    }

    fn tools() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo));
        Arc::new(registry)
    }

    #[test]
    fn test_plain_model_gets_prompt_protocol() {
        let client: Arc<dyn LLMClient> = Arc::new(Described(ModelDescriptor::new("plain")));
        let handle = select(client.clone(), tools(), "sys", IterationBudget::default());

        assert_eq!(handle.kind(), AgentKind::PromptProtocol);
        assert!(handle.system_prompt().contains("<tool_call>"));

        let info = handle.info(client.as_ref());
        assert!(!info.function_calling);
        assert_eq!(info.tools_count, 1);
        assert_eq!(info.model, "plain");
    }

    #[test]
    fn test_native_model_with_tools_gets_native() {
        let descriptor = ModelDescriptor::new("fc").with_function_calling(true);
        let client: Arc<dyn LLMClient> = Arc::new(Described(descriptor));
        let handle = select(client.clone(), tools(), "sys", IterationBudget::default());

        assert_eq!(handle.kind(), AgentKind::Native);
        assert_eq!(handle.system_prompt(), "sys");
        let info = handle.info(client.as_ref());
        assert!(info.function_calling);
        assert_eq!(info.capability_source, Some(CapabilitySignal::ClientFlag));
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = PromptoolConfig::default();
        config.agent.max_tool_iterations = 2;
        config.agent.parallel_tools = true;
        config.agent.tool_timeout_secs = 0;

        let settings = AgentSettings::from_config(&config).unwrap();
        assert_eq!(settings.budget.get(), 2);
        assert!(settings.dispatch.parallel);
        assert!(settings.dispatch.tool_timeout.is_none());

        config.agent.max_tool_iterations = 0;
        assert!(AgentSettings::from_config(&config).is_err());
    }

    #[test]
    fn test_settings_carry_name() {
        let client: Arc<dyn LLMClient> = Arc::new(Described(ModelDescriptor::new("plain")));
        let handle = select_with(
            client,
            tools(),
            AgentSettings {
                name: "helper".to_string(),
                ..Default::default()
            },
        );
        assert_eq!(handle.name(), "helper");
    }
}
