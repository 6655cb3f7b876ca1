use crate::tools::registry::Tool;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde_json::{json, Map, Value};

/// Returns its `text` argument unchanged.
pub struct Echo;

#[async_trait]
impl Tool for Echo {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Repeat the given text back"
    }

    fn parameters_schema(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "text": { "type": "string", "description": "Text to repeat" }
            },
            "required": ["text"]
        }))
    }

    async fn execute(&self, args: Map<String, Value>) -> Result<Value> {
        match args.get("text") {
            Some(Value::String(text)) => Ok(Value::String(text.clone())),
            Some(other) => Ok(Value::String(other.to_string())),
            None => Err(AppError::InvalidInput("'text' is required".to_string())),
        }
    }
}
