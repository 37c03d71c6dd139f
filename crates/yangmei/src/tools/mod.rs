//! Tool framework for model-requested actions
//!
//! Supported tools form a closed set (`ToolKind`); the registry maps each kind
//! to its handler and anything else the model asks for is rejected.

pub mod builtin;
pub mod registry;
pub mod router;

use std::collections::HashMap;

use async_trait::async_trait;
use llm_core::ToolDefinition;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AgentError;

/// Every tool the agent knows how to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    /// Run Python source inside the sandbox container
    ExecuteCode,
}

impl ToolKind {
    pub const ALL: &'static [ToolKind] = &[ToolKind::ExecuteCode];

    /// Name the model uses to request the tool
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::ExecuteCode => "execute_code",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.name() == name)
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Schema for a tool parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterProperty {
    #[serde(rename = "type")]
    pub param_type: String,
    pub description: String,
}

impl ParameterProperty {
    pub fn string(description: impl Into<String>) -> Self {
        Self {
            param_type: "string".to_string(),
            description: description.into(),
        }
    }
}

/// JSON schema describing tool parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Always "object"
    #[serde(rename = "type")]
    pub schema_type: String,
    pub properties: HashMap<String, ParameterProperty>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl ParameterSchema {
    pub fn new() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: HashMap::new(),
            required: Vec::new(),
        }
    }

    pub fn with_required(mut self, name: impl Into<String>, prop: ParameterProperty) -> Self {
        let name = name.into();
        self.properties.insert(name.clone(), prop);
        self.required.push(name);
        self
    }
}

impl Default for ParameterSchema {
    fn default() -> Self {
        Self::new()
    }
}

/// A handler for one `ToolKind`
#[async_trait]
pub trait Tool: Send + Sync {
    fn kind(&self) -> ToolKind;

    fn description(&self) -> &str;

    fn parameters_schema(&self) -> ParameterSchema;

    /// Run the tool and return the text handed back to the model
    async fn execute(&self, args: &Value) -> Result<String, AgentError>;

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Definition sent to the model with each request
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            self.name(),
            self.description(),
            serde_json::to_value(self.parameters_schema()).unwrap_or_default(),
        )
    }
}

/// Fetch a required string argument
pub(crate) fn required_str<'a>(kind: ToolKind, args: &'a Value, key: &str) -> Result<&'a str, AgentError> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| AgentError::InvalidToolArguments {
            tool: kind.name().to_string(),
            reason: format!("missing required string parameter: {}", key),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_kind_names() {
        assert_eq!(ToolKind::ExecuteCode.name(), "execute_code");
        assert_eq!(ToolKind::from_name("execute_code"), Some(ToolKind::ExecuteCode));
        assert_eq!(ToolKind::from_name("delete_all_files"), None);
        assert_eq!(ToolKind::from_name("Execute_Code"), None);
    }

    #[test]
    fn test_every_kind_round_trips() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(kind.name()), Some(*kind));
        }
    }

    #[test]
    fn test_schema_serialization() {
        let schema = ParameterSchema::new()
            .with_required("code", ParameterProperty::string("Python source"));
        let json = serde_json::to_value(&schema).unwrap();

        assert_eq!(json["type"], "object");
        assert_eq!(json["properties"]["code"]["type"], "string");
        assert_eq!(json["required"], json!(["code"]));
    }

    #[test]
    fn test_required_str() {
        let args = json!({"code": "print(1)", "n": 3});
        assert_eq!(required_str(ToolKind::ExecuteCode, &args, "code").unwrap(), "print(1)");

        let err = required_str(ToolKind::ExecuteCode, &args, "n").unwrap_err();
        assert!(matches!(err, AgentError::InvalidToolArguments { .. }));
    }
}
