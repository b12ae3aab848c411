pub mod tools;

use log::{ debug, info, warn };
use serde::{ Deserialize, Serialize };
use serde_json::Value;

use crate::assistant::{ render_outcome, Assistant };
use crate::llm::LlmError;
use crate::tasks::extract::parse_json_reply;
pub use tools::{ Tool, ToolError, ToolRegistry };

/// The shape a model uses to request a tool: `{"function": ..., "args": {...}}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FunctionCall {
    pub function: String,
    #[serde(default)]
    pub args: Value,
}

impl FunctionCall {
    pub fn from_reply(reply: &str) -> Option<Self> {
        serde_json::from_value(parse_json_reply(reply)?).ok()
    }
}

/// Lets the model pick one registered tool per request.
pub struct FunctionCallingAgent {
    assistant: Assistant,
    registry: ToolRegistry,
}

impl FunctionCallingAgent {
    pub fn new(assistant: Assistant, registry: ToolRegistry) -> Self {
        Self { assistant, registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn build_prompt(&self, request: &str) -> String {
        format!(
            "User request: {}\n\nAvailable functions:\n{}\n\nRespond with JSON if function call needed:\n{{\"function\": \"function_name\", \"args\": {{\"arg1\": \"value1\"}}}}\n\nOr respond directly if no function needed.",
            request,
            self.registry.describe()
        )
    }

    /// Runs the requested tool and reports `Function: <name>\nResult: <output>`;
    /// any reply that is not a call to a known tool is returned as-is.
    pub async fn handle(&self, request: &str) -> Result<String, LlmError> {
        let reply = self.assistant.complete(&self.build_prompt(request)).await?;
        let reply = reply.trim().to_string();

        let Some(call) = FunctionCall::from_reply(&reply) else {
            return Ok(reply);
        };
        let Some(tool) = self.registry.get(&call.function) else {
            debug!("Model asked for unregistered function '{}'", call.function);
            return Ok(reply);
        };
        match tool.call(&call.args).await {
            Ok(output) => {
                info!("Called {} for request: {}", call.function, request);
                Ok(format!("Function: {}\nResult: {}", call.function, output))
            }
            Err(e) => {
                warn!("Function {} rejected its arguments: {}", call.function, e);
                Ok(reply)
            }
        }
    }

    pub async fn handle_text(&self, request: &str) -> String {
        render_outcome(self.handle(request).await)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRecord {
    pub action: String,
    pub result: String,
}

/// A named agent that reasons with the model and acts through its tools,
/// remembering every successful action.
pub struct ToolAgent {
    name: String,
    assistant: Assistant,
    registry: ToolRegistry,
    memory: Vec<ActionRecord>,
}

impl ToolAgent {
    pub fn new(name: impl Into<String>, assistant: Assistant, registry: ToolRegistry) -> Self {
        Self {
            name: name.into(),
            assistant,
            registry,
            memory: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn memory(&self) -> &[ActionRecord] {
        &self.memory
    }

    pub fn think_prompt(&self, situation: &str) -> String {
        format!(
            "You are {}. \n\nAvailable tools: {}\n\nSituation: {}\n\nWhat should you do? Choose a tool and explain.",
            self.name,
            self.registry.names().join(", "),
            situation
        )
    }

    pub async fn think(&self, situation: &str) -> Result<String, LlmError> {
        self.assistant.complete(&self.think_prompt(situation)).await
    }

    pub async fn act(&mut self, action: &str, args: &Value) -> Result<String, ToolError> {
        let result = self.registry.call(action, args).await?;
        self.memory.push(ActionRecord { action: action.to_string(), result: result.clone() });
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::MockChatClient;
    use serde_json::json;
    use std::sync::Arc;

    fn agent_with(replies: Vec<&str>) -> (Arc<MockChatClient>, FunctionCallingAgent) {
        let mock = Arc::new(MockChatClient::new(replies));
        let agent = FunctionCallingAgent::new(Assistant::new(mock.clone()), ToolRegistry::with_builtins());
        (mock, agent)
    }

    #[tokio::test]
    async fn handle_runs_requested_function() {
        let (mock, agent) = agent_with(
            vec![r#"{"function": "calculate", "args": {"operation": "+", "a": 15, "b": 27}}"#]
        );
        assert_eq!(agent.handle("Calculate 15 + 27").await.unwrap(), "Function: calculate\nResult: 42");
        let prompt = mock.requests()[0].last_text().to_string();
        assert!(prompt.starts_with("User request: Calculate 15 + 27\n\nAvailable functions:\n- get_weather(location)"));
    }

    #[tokio::test]
    async fn handle_passes_through_plain_replies() {
        let (_, agent) = agent_with(
            vec![
                "  Why did the robot cross the road?  ",
                r#"{"function": "launch_rocket", "args": {}}"#,
                r#"{"function": "get_weather", "args": {"city": "Paris"}}"#
            ]
        );
        assert_eq!(agent.handle("Tell me a joke").await.unwrap(), "Why did the robot cross the road?");
        assert_eq!(
            agent.handle("Launch").await.unwrap(),
            r#"{"function": "launch_rocket", "args": {}}"#
        );
        assert!(agent.handle("Weather?").await.unwrap().contains("\"city\""));
    }

    #[tokio::test]
    async fn handle_text_reports_errors() {
        let agent = FunctionCallingAgent::new(
            Assistant::new(Arc::new(MockChatClient::failing(500, "down"))),
            ToolRegistry::with_builtins()
        );
        assert!(agent.handle_text("anything").await.starts_with("Error: "));
    }

    #[tokio::test]
    async fn tool_agent_remembers_actions() {
        let mock = Arc::new(MockChatClient::new(vec!["Use search_web."]));
        let registry = ToolRegistry::new()
            .register(Arc::new(tools::WebSearchTool))
            .register(Arc::new(tools::EmailTool));
        let mut agent = ToolAgent::new("Assistant Agent", Assistant::new(mock.clone()), registry);

        assert_eq!(agent.think("User wants to know about Python programming").await.unwrap(), "Use search_web.");
        assert!(mock.requests()[0].last_text().contains("Available tools: search_web, send_email"));

        let result = agent.act("search_web", &json!({"query": "Python programming"})).await.unwrap();
        assert_eq!(result, "Search results for: Python programming");
        assert!(agent.act("fly", &json!({})).await.is_err());
        assert_eq!(
            agent.memory(),
            &[ActionRecord { action: "search_web".to_string(), result }]
        );
    }
}
