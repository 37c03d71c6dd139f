//! Python execution inside the sandbox container

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::AgentError;
use crate::sandbox::SandboxRuntime;
use crate::tools::{required_str, ParameterProperty, ParameterSchema, Tool, ToolKind};

/// Interpreter invoked in the container
pub const DEFAULT_INTERPRETER: &str = "python3";

/// Tool that runs model-written Python in the sandbox and returns its output
pub struct ExecuteCodeTool {
    sandbox: Arc<dyn SandboxRuntime>,
    interpreter: String,
}

impl ExecuteCodeTool {
    pub fn new(sandbox: Arc<dyn SandboxRuntime>) -> Self {
        Self {
            sandbox,
            interpreter: DEFAULT_INTERPRETER.to_string(),
        }
    }

    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    /// Build the argv for running `code`.
    ///
    /// The code is shell-quoted into a single `-c` argument of the command
    /// line, which is then split back into words the way a shell would.
    pub fn command_for(&self, code: &str) -> Result<Vec<String>, AgentError> {
        let invalid = |reason: String| AgentError::InvalidToolArguments {
            tool: self.kind().name().to_string(),
            reason,
        };

        let quoted = shlex::try_quote(code).map_err(|e| invalid(e.to_string()))?;
        let command_line = format!("{} -c {}", self.interpreter, quoted);

        shlex::split(&command_line)
            .ok_or_else(|| invalid(format!("could not split command line for {}", self.interpreter)))
    }
}

#[async_trait]
impl Tool for ExecuteCodeTool {
    fn kind(&self) -> ToolKind {
        ToolKind::ExecuteCode
    }

    fn description(&self) -> &str {
        "Run arbitrary Python code in a virtual environment and return the standard output of the executed code."
    }

    fn parameters_schema(&self) -> ParameterSchema {
        ParameterSchema::new().with_required("code", ParameterProperty::string("The Python code to execute"))
    }

    async fn execute(&self, args: &Value) -> Result<String, AgentError> {
        let code = required_str(self.kind(), args, "code")?;
        let command = self.command_for(code)?;

        info!(
            container = self.sandbox.container(),
            code_len = code.len(),
            "Executing code in sandbox"
        );

        let output = self.sandbox.exec(command).await?;
        if !output.stderr.is_empty() {
            debug!(
                stdout_len = output.stdout.len(),
                stderr_len = output.stderr.len(),
                "Returning stderr in place of stdout"
            );
        }

        Ok(output.select_output())
    }
}
