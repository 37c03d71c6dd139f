//! Tool routing and dispatch

use llm_core::{ChatMessage, ToolCall, ToolDefinition};
use tracing::{info, instrument, warn};

use super::registry::ToolRegistry;
use crate::error::AgentError;

/// Router for dispatching model tool calls
pub struct ToolRouter {
    registry: ToolRegistry,
}

impl ToolRouter {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    /// Execute a single tool call and return its output text
    #[instrument(skip(self), fields(tool = %tool_call.function.name, call_id = %tool_call.id))]
    pub async fn route(&self, tool_call: &ToolCall) -> Result<String, AgentError> {
        let tool = match self.registry.resolve(tool_call.name()) {
            Ok(t) => t,
            Err(e) => {
                warn!(tool = %tool_call.name(), "Model requested an unknown tool");
                return Err(e);
            }
        };

        info!(tool = tool.name(), "Executing tool");
        let output = tool.execute(&tool_call.function.arguments).await?;
        info!(tool = tool.name(), output_len = output.len(), "Tool executed");

        Ok(output)
    }

    /// Execute a tool call and wrap the output as a tool message
    pub async fn dispatch(&self, tool_call: &ToolCall) -> Result<ChatMessage, AgentError> {
        let output = self.route(tool_call).await?;
        Ok(ChatMessage::tool_result(tool_call.id.clone(), output))
    }

    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.registry.tool_definitions()
    }
}

impl std::fmt::Debug for ToolRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRouter")
            .field("registry", &self.registry)
            .finish()
    }
}
