//! Tools the model may call mid-conversation.
//!
//! - `catalog`: display metadata grouped by provider (settings surface)
//! - `bindings`: catalog id → registry key table, validated at startup
//! - `apple`: Apple MCP tools (placeholders without a native macOS host)
//! - `weather`, `delay`: built-in tools offered on every chat request

pub mod apple;
pub mod bindings;
pub mod catalog;
mod delay;
mod weather;

pub use apple::AppleTool;
pub use bindings::{BindingError, Resolution, ToolBindings};
pub use catalog::Catalog;
pub use delay::Delay;
pub use weather::Weather;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::llm::{FunctionDefinition, ToolDefinition};

/// Errors raised while executing a tool.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Tool execution failed: {0}")]
    Execution(String),
}

/// A named, schema-described operation.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Registry key, also the function name shown to the model.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema (`type: object`) of the arguments.
    fn parameters_schema(&self) -> Value;

    async fn execute(&self, args: Value) -> Result<Value, ToolError>;
}

/// Check `args` against the `required` and `enum` constraints of an object schema.
pub fn validate_arguments(schema: &Value, args: &Value) -> Result<(), ToolError> {
    let obj = args
        .as_object()
        .ok_or_else(|| ToolError::InvalidArguments("arguments must be a JSON object".into()))?;

    if let Some(required) = schema["required"].as_array() {
        for key in required.iter().filter_map(|k| k.as_str()) {
            if obj.get(key).map_or(true, Value::is_null) {
                return Err(ToolError::InvalidArguments(format!(
                    "missing required argument '{}'",
                    key
                )));
            }
        }
    }

    if let Some(properties) = schema["properties"].as_object() {
        for (key, value) in obj {
            let Some(allowed) = properties.get(key).and_then(|p| p["enum"].as_array()) else {
                continue;
            };
            if !value.is_null() && !allowed.contains(value) {
                return Err(ToolError::InvalidArguments(format!(
                    "'{}' must be one of {}",
                    key,
                    Value::Array(allowed.clone())
                )));
            }
        }
    }

    Ok(())
}

/// Name → tool lookup.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every tool the server knows: the built-ins plus all Apple tools.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(Weather::new()));
        registry.register(Arc::new(Delay));
        for tool in AppleTool::ALL {
            registry.register(Arc::new(tool));
        }
        registry
    }

    /// Register a tool, replacing any tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// A registry holding only the named tools. Unknown names are skipped.
    pub fn select<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Self {
        let tools = names
            .into_iter()
            .filter_map(|name| self.tools.get(name).map(|t| (name.to_string(), Arc::clone(t))))
            .collect();
        Self { tools }
    }

    /// Function definitions in the provider's tool format.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|tool| ToolDefinition {
                tool_type: "function".to_string(),
                function: FunctionDefinition {
                    name: tool.name().to_string(),
                    description: tool.description().to_string(),
                    parameters: tool.parameters_schema(),
                },
            })
            .collect()
    }

    /// Validate arguments against the tool's schema, then run it.
    pub async fn execute(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        validate_arguments(&tool.parameters_schema(), &args)?;
        tool.execute(args).await
    }
}
