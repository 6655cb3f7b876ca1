use crate::tools::registry::Tool;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use chrono::{Local, Utc};
use serde_json::{json, Map, Value};
use std::fmt::Write;

/// Current date and time, local or UTC, optionally strftime-formatted.
pub struct CurrentTime;

#[async_trait]
impl Tool for CurrentTime {
    fn name(&self) -> &str {
        "current_time"
    }

    fn description(&self) -> &str {
        "Get the current date and time"
    }

    fn parameters_schema(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "format": {
                    "type": "string",
                    "description": "strftime format, RFC 3339 when omitted"
                },
                "utc": { "type": "boolean", "description": "Use UTC instead of local time" }
            }
        }))
    }

    async fn execute(&self, args: Map<String, Value>) -> Result<Value> {
        let utc = args.get("utc").and_then(Value::as_bool).unwrap_or(false);
        let format = args.get("format").and_then(Value::as_str);

        let mut rendered = String::new();
        let written = match (utc, format) {
            (true, Some(fmt)) => write!(rendered, "{}", Utc::now().format(fmt)),
            (false, Some(fmt)) => write!(rendered, "{}", Local::now().format(fmt)),
            (true, None) => write!(rendered, "{}", Utc::now().to_rfc3339()),
            (false, None) => write!(rendered, "{}", Local::now().to_rfc3339()),
        };
        written.map_err(|_| {
            AppError::InvalidInput(format!("invalid time format: {}", format.unwrap_or("")))
        })?;

        Ok(Value::String(rendered))
    }
}
