//! Sandbox container runtime
//!
//! Code runs inside a pre-existing, externally managed container. This module
//! does not enforce any isolation itself; containment is entirely up to how
//! that container is locked down.

mod docker;

use async_trait::async_trait;

use crate::error::SandboxError;

pub use docker::{DockerEndpoint, DockerSandbox};

/// Captured result of a command run in the container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: Option<i64>,
}

impl ExecOutput {
    pub fn new(stdout: impl Into<Vec<u8>>, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code: None,
        }
    }

    /// Text handed back to the model.
    ///
    /// Any stderr output replaces stdout entirely, even when both streams
    /// were written.
    pub fn select_output(&self) -> String {
        if !self.stderr.is_empty() {
            String::from_utf8_lossy(&self.stderr).into_owned()
        } else {
            String::from_utf8_lossy(&self.stdout).into_owned()
        }
    }
}

/// A running container that accepts commands
#[async_trait]
pub trait SandboxRuntime: Send + Sync {
    /// Name of the target container
    fn container(&self) -> &str;

    /// Run `command` (argv form) and capture stdout and stderr separately
    async fn exec(&self, command: Vec<String>) -> Result<ExecOutput, SandboxError>;
}
