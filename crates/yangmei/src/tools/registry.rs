//! Lookup table from tool kind to handler

use std::collections::HashMap;
use std::sync::Arc;

use llm_core::ToolDefinition;

use super::{Tool, ToolKind};
use crate::error::AgentError;

/// Registry of available tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<ToolKind, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool, replacing any handler for the same kind
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.tools.insert(tool.kind(), Arc::new(tool));
    }

    pub fn get(&self, kind: ToolKind) -> Option<Arc<dyn Tool>> {
        self.tools.get(&kind).cloned()
    }

    /// Resolve a model-supplied tool name to its handler
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Tool>, AgentError> {
        ToolKind::from_name(name)
            .and_then(|kind| self.get(kind))
            .ok_or_else(|| AgentError::UnknownTool(name.to_string()))
    }

    pub fn kinds(&self) -> Vec<ToolKind> {
        let mut kinds: Vec<_> = self.tools.keys().copied().collect();
        kinds.sort_by_key(|k| k.name());
        kinds
    }

    /// Tool definitions for the chat API, in a stable order
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.kinds()
            .into_iter()
            .filter_map(|k| self.tools.get(&k))
            .map(|t| t.to_definition())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.kinds())
            .finish()
    }
}
