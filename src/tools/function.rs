//! Adapter for plain synchronous functions.

use crate::tools::registry::Tool;
use crate::types::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// A [`Tool`] backed by a synchronous closure.
///
/// ```rust,ignore
/// let upper = FnTool::new("upper", |args| {
///     let text = args.get("text").and_then(Value::as_str).unwrap_or_default();
///     Ok(Value::String(text.to_uppercase()))
/// })
/// .with_description("Uppercase a string");
/// registry.register(Arc::new(upper));
/// ```
pub struct FnTool<F> {
    name: String,
    description: String,
    schema: Option<Value>,
    func: F,
}

impl<F> FnTool<F>
where
    F: Fn(&Map<String, Value>) -> Result<Value> + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            schema: None,
            func,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }
}

#[async_trait]
impl<F> Tool for FnTool<F>
where
    F: Fn(&Map<String, Value>) -> Result<Value> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> Option<Value> {
        self.schema.clone()
    }

    async fn execute(&self, args: Map<String, Value>) -> Result<Value> {
        (self.func)(&args)
    }
}
