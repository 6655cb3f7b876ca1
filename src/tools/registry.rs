use crate::types::{AppError, Result, ToolDefinition};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// An invocable capability exposed to the model.
///
/// `execute` receives the decoded named-argument map. Returning `Err` is the
/// normal way to report a failure; the dispatcher turns it into a failure
/// outcome that is shown to the model.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name the model uses to call the tool
    fn name(&self) -> &str;

    /// Human readable description; empty when there is none
    fn description(&self) -> &str {
        ""
    }

    /// JSON schema for the arguments, `{"type": "object", "properties": {...}}`
    fn parameters_schema(&self) -> Option<Value> {
        None
    }

    async fn execute(&self, args: Map<String, Value>) -> Result<Value>;
}

/// Catalog entry for a tool.
pub fn definition_of(tool: &dyn Tool) -> ToolDefinition {
    let description = tool.description().trim();
    ToolDefinition {
        name: tool.name().to_string(),
        description: (!description.is_empty()).then(|| description.to_string()),
        input_schema: tool.parameters_schema(),
    }
}

/// Named tools, kept in name order.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every built-in tool
    pub fn with_builtin_tools() -> Self {
        let mut registry = Self::new();
        for name in crate::tools::BUILTIN_TOOLS {
            if let Some(tool) = crate::tools::builtin(name) {
                registry.register(tool);
            }
        }
        registry
    }

    /// Create a registry with the named built-in tools
    pub fn with_enabled_tools<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let mut registry = Self::new();
        for name in names {
            let name = name.as_ref();
            let tool = crate::tools::builtin(name)
                .ok_or_else(|| AppError::NotFound(format!("Unknown built-in tool: {}", name)))?;
            registry.register(tool);
        }
        Ok(registry)
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn get_tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|tool| definition_of(tool.as_ref()))
            .collect()
    }

    /// Get a list of all registered tool names
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tool_names())
            .finish()
    }
}
