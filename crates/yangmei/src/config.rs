//! Agent configuration
//!
//! Built once at startup from an optional TOML file and the process
//! environment, then passed into the agent. Environment values win over the
//! file. Required values are checked eagerly.
//!
//! ```toml
//! [model]
//! model = "gpt-4o"
//! base_url = "https://api.openai.com"
//!
//! [sandbox]
//! docker_host = "unix:///var/run/docker.sock"
//! container_name = "yangmei-sandbox"
//! ```

use std::path::Path;

use llm_core::ModelConfig;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::tools::builtin::DEFAULT_INTERPRETER;

pub const DOCKER_HOST_VAR: &str = "DOCKER_HOST";
pub const CONTAINER_NAME_VAR: &str = "DOCKER_SANDBOX_CONTAINER_NAME";
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Validated configuration for a run
#[derive(Debug, Clone)]
pub struct Config {
    pub model: ModelConfig,
    pub sandbox: SandboxConfig,
}

/// Where submitted code runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxConfig {
    /// Container runtime endpoint
    pub docker_host: String,
    /// Name of the already running sandbox container
    pub container_name: String,
    /// Interpreter invoked inside the container
    pub interpreter: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    model: ModelConfig,
    sandbox: FileSandboxConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSandboxConfig {
    docker_host: Option<String>,
    container_name: Option<String>,
    interpreter: Option<String>,
}

impl Config {
    /// Load from `path` (if given) and the process environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_lookup(path, |key| std::env::var(key).ok())
    }

    /// Load using `lookup` in place of the process environment
    pub fn from_lookup<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = match path {
            Some(path) => read_file(path)?,
            None => FileConfig::default(),
        };

        let mut model = file.model;
        model.apply_env(&lookup);

        let env = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let docker_host = env(DOCKER_HOST_VAR).or(file.sandbox.docker_host);
        let container_name = env(CONTAINER_NAME_VAR).or(file.sandbox.container_name);

        let config = Self {
            model,
            sandbox: SandboxConfig {
                docker_host: docker_host.ok_or(ConfigError::Missing(DOCKER_HOST_VAR))?,
                container_name: container_name.ok_or(ConfigError::Missing(CONTAINER_NAME_VAR))?,
                interpreter: file
                    .sandbox
                    .interpreter
                    .unwrap_or_else(|| DEFAULT_INTERPRETER.to_string()),
            },
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.model.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::Missing(API_KEY_VAR));
        }
        if self.model.model.trim().is_empty() {
            return Err(ConfigError::Invalid {
                name: "model.model",
                reason: "model identifier is empty".to_string(),
            });
        }
        if self.sandbox.interpreter.trim().is_empty() {
            return Err(ConfigError::Invalid {
                name: "sandbox.interpreter",
                reason: "interpreter is empty".to_string(),
            });
        }
        Ok(())
    }
}

fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
