//! Error types for configuration, tool dispatch and the sandbox

use std::path::PathBuf;

use thiserror::Error;

/// Startup configuration problems
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration value: {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Container runtime failures
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("unsupported container runtime endpoint: {0}")]
    UnsupportedEndpoint(String),

    #[error("failed to connect to container runtime at {endpoint}")]
    Connect {
        endpoint: String,
        #[source]
        source: bollard::errors::Error,
    },

    #[error("container {name} not found")]
    ContainerNotFound {
        name: String,
        #[source]
        source: bollard::errors::Error,
    },

    #[error("container {0} is not running")]
    NotRunning(String),

    #[error("exec in container {container} failed")]
    Exec {
        container: String,
        #[source]
        source: bollard::errors::Error,
    },

    #[error("exec in container {0} started detached, no output to collect")]
    Detached(String),
}

/// Failures that abort a `run`
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments for tool {tool}: {reason}")]
    InvalidToolArguments { tool: String, reason: String },

    #[error("chat model call failed")]
    Model(#[source] anyhow::Error),

    #[error(transparent)]
    Sandbox(#[from] SandboxError),
}
