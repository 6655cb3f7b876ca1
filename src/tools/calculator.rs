use crate::tools::registry::Tool;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde_json::{json, Map, Value};

pub struct Calculator;

fn operand(args: &Map<String, Value>, key: &str) -> Result<f64> {
    args.get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| AppError::InvalidInput(format!("'{}' must be a number", key)))
}

#[async_trait]
impl Tool for Calculator {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Perform basic arithmetic operations"
    }

    fn parameters_schema(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "operation": {
                    "type": "string",
                    "description": "One of add, subtract, multiply, divide",
                    "enum": ["add", "subtract", "multiply", "divide"]
                },
                "a": { "type": "number", "description": "Left operand" },
                "b": { "type": "number", "description": "Right operand" }
            },
            "required": ["operation", "a", "b"]
        }))
    }

    async fn execute(&self, args: Map<String, Value>) -> Result<Value> {
        let op = args
            .get("operation")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::InvalidInput("'operation' is required".to_string()))?;
        let a = operand(&args, "a")?;
        let b = operand(&args, "b")?;

        let result = match op {
            "add" => a + b,
            "subtract" => a - b,
            "multiply" => a * b,
            "divide" if b == 0.0 => {
                return Err(AppError::InvalidInput("division by zero".to_string()))
            }
            "divide" => a / b,
            other => {
                return Err(AppError::InvalidInput(format!(
                    "unsupported operation: {}",
                    other
                )))
            }
        };

        Ok(json!({ "result": result }))
    }
}
