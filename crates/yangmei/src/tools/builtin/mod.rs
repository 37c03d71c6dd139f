//! Built-in tools

mod execute_code;

use std::sync::Arc;

pub use execute_code::{ExecuteCodeTool, DEFAULT_INTERPRETER};

use super::registry::ToolRegistry;
use crate::sandbox::SandboxRuntime;

/// Registry holding the code execution tool bound to `sandbox`
pub fn create_default_registry(sandbox: Arc<dyn SandboxRuntime>, interpreter: &str) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(ExecuteCodeTool::new(sandbox).with_interpreter(interpreter));
    registry
}
