//! Pause the conversation for a number of seconds.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{Tool, ToolError};

/// Longest pause accepted, in seconds.
const MAX_DELAY_SECS: f64 = 60.0;

pub struct Delay;

#[async_trait]
impl Tool for Delay {
    fn name(&self) -> &str {
        "delay"
    }

    fn description(&self) -> &str {
        "Pauses the chatbot for a given duration"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "duration": {
                    "type": "number",
                    "exclusiveMinimum": 0,
                    "description": "The duration to pause in seconds"
                }
            },
            "required": ["duration"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let duration = args["duration"]
            .as_f64()
            .ok_or_else(|| ToolError::InvalidArguments("'duration' must be a number".into()))?;
        if duration <= 0.0 {
            return Err(ToolError::InvalidArguments(
                "'duration' must be positive".into(),
            ));
        }
        if duration > MAX_DELAY_SECS {
            return Err(ToolError::InvalidArguments(format!(
                "'duration' must be at most {} seconds",
                MAX_DELAY_SECS
            )));
        }

        tokio::time::sleep(Duration::from_secs_f64(duration)).await;

        Ok(json!({ "message": format!("Delayed for {} seconds", duration) }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_delay_sleeps_and_reports() {
        let result = Delay.execute(json!({"duration": 0.01})).await.unwrap();
        assert_eq!(result["message"], "Delayed for 0.01 seconds");
    }

    #[tokio::test]
    async fn test_delay_rejects_non_positive() {
        assert!(Delay.execute(json!({"duration": 0})).await.is_err());
        assert!(Delay.execute(json!({"duration": -1.5})).await.is_err());
        assert!(Delay.execute(json!({"duration": "soon"})).await.is_err());
    }
}
