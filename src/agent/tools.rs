use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ToolError {
    #[error("Unknown action: {0}")] UnknownTool(String),
    #[error("Missing argument '{0}'")] MissingArgument(String),
    #[error("Invalid argument '{name}': {reason}")] InvalidArgument {
        name: String,
        reason: String,
    },
}

/// A named function the model may ask to run. Arguments arrive as a JSON object.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Parameter names, in call order.
    fn parameters(&self) -> &[&'static str];

    async fn call(&self, args: &Value) -> Result<String, ToolError>;

    fn signature(&self) -> String {
        format!("{}({})", self.name(), self.parameters().join(", "))
    }
}

fn string_arg<'a>(args: &'a Value, name: &str) -> Result<&'a str, ToolError> {
    let value = args.get(name).ok_or_else(|| ToolError::MissingArgument(name.to_string()))?;
    value.as_str().ok_or_else(|| ToolError::InvalidArgument {
        name: name.to_string(),
        reason: "expected a string".to_string(),
    })
}

/// Accepts JSON numbers and numeric strings, since models emit both.
fn number_arg(args: &Value, name: &str) -> Result<f64, ToolError> {
    let value = args.get(name).ok_or_else(|| ToolError::MissingArgument(name.to_string()))?;
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ToolError::InvalidArgument {
        name: name.to_string(),
        reason: format!("expected a number, got {}", value),
    })
}

fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

pub struct WeatherTool;

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Get weather for a location"
    }

    fn parameters(&self) -> &[&'static str] {
        &["location"]
    }

    async fn call(&self, args: &Value) -> Result<String, ToolError> {
        let location = string_arg(args, "location")?;
        Ok(format!("Weather in {}: Sunny, 22°C", location))
    }
}

pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculate"
    }

    fn description(&self) -> &str {
        "Perform math operation"
    }

    fn parameters(&self) -> &[&'static str] {
        &["operation", "a", "b"]
    }

    async fn call(&self, args: &Value) -> Result<String, ToolError> {
        let operation = string_arg(args, "operation")?;
        let a = number_arg(args, "a")?;
        let b = number_arg(args, "b")?;
        let result = match operation.trim() {
            "+" => format_number(a + b),
            "-" => format_number(a - b),
            "*" => format_number(a * b),
            "/" if b == 0.0 => "Error".to_string(),
            "/" => format_number(a / b),
            _ => "Unknown operation".to_string(),
        };
        Ok(result)
    }
}

pub struct WebSearchTool;

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "search_web"
    }

    fn description(&self) -> &str {
        "Search the web"
    }

    fn parameters(&self) -> &[&'static str] {
        &["query"]
    }

    async fn call(&self, args: &Value) -> Result<String, ToolError> {
        Ok(format!("Search results for: {}", string_arg(args, "query")?))
    }
}

pub struct EmailTool;

#[async_trait]
impl Tool for EmailTool {
    fn name(&self) -> &str {
        "send_email"
    }

    fn description(&self) -> &str {
        "Send an email"
    }

    fn parameters(&self) -> &[&'static str] {
        &["to", "subject"]
    }

    async fn call(&self, args: &Value) -> Result<String, ToolError> {
        let to = string_arg(args, "to")?;
        let subject = string_arg(args, "subject")?;
        Ok(format!("Email sent to {} with subject: {}", to, subject))
    }
}

/// Tools in registration order. Registering a name twice replaces the earlier tool.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `get_weather` and `calculate`.
    pub fn with_builtins() -> Self {
        Self::new().register(Arc::new(WeatherTool)).register(Arc::new(CalculatorTool))
    }

    pub fn register(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.tools
            .iter()
            .map(|t| t.name().to_string())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// One `- signature: description` line per tool.
    pub fn describe(&self) -> String {
        self.tools
            .iter()
            .map(|t| format!("- {}: {}", t.signature(), t.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub async fn call(&self, name: &str, args: &Value) -> Result<String, ToolError> {
        let tool = self.get(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tool.call(args).await
    }
}
