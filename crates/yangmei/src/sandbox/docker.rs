//! Docker-backed sandbox using bollard
//!
//! Attaches to an already running container and runs commands through the
//! exec API, collecting the demultiplexed stdout and stderr streams.

use async_trait::async_trait;
use bollard::container::{InspectContainerOptions, LogOutput};
use bollard::errors::Error as DockerError;
use bollard::exec::{CreateExecOptions, StartExecResults};
use bollard::{Docker, API_DEFAULT_VERSION};
use futures::StreamExt;
use tracing::{debug, instrument};

use super::{ExecOutput, SandboxRuntime};
use crate::error::SandboxError;

/// Request timeout for the Docker API client
const CLIENT_TIMEOUT_SECS: u64 = 120;

/// Parsed `DOCKER_HOST` value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DockerEndpoint {
    /// Local socket, e.g. `unix:///var/run/docker.sock`
    Unix(String),
    /// Remote daemon, e.g. `tcp://sandbox:2375`
    Http(String),
}

impl DockerEndpoint {
    pub fn parse(host: &str) -> Result<Self, SandboxError> {
        let host = host.trim();
        if host.starts_with("unix://") || host.starts_with('/') {
            Ok(Self::Unix(host.to_string()))
        } else if host.starts_with("tcp://") || host.starts_with("http://") {
            Ok(Self::Http(host.to_string()))
        } else {
            Err(SandboxError::UnsupportedEndpoint(host.to_string()))
        }
    }

    fn connect(&self) -> Result<Docker, DockerError> {
        match self {
            Self::Unix(path) => Docker::connect_with_unix(path, CLIENT_TIMEOUT_SECS, API_DEFAULT_VERSION),
            Self::Http(addr) => Docker::connect_with_http(addr, CLIENT_TIMEOUT_SECS, API_DEFAULT_VERSION),
        }
    }

    fn as_str(&self) -> &str {
        match self {
            Self::Unix(s) | Self::Http(s) => s,
        }
    }
}

/// Sandbox backed by a named, already running Docker container
pub struct DockerSandbox {
    client: Docker,
    endpoint: DockerEndpoint,
    container: String,
}

impl DockerSandbox {
    /// Build a client for `docker_host` targeting `container`.
    ///
    /// No request is made here; the container is looked up on each `exec`.
    pub fn new(docker_host: &str, container: impl Into<String>) -> Result<Self, SandboxError> {
        let endpoint = DockerEndpoint::parse(docker_host)?;
        let client = endpoint.connect().map_err(|source| SandboxError::Connect {
            endpoint: endpoint.as_str().to_string(),
            source,
        })?;
        let container = container.into();

        debug!(endpoint = endpoint.as_str(), container = %container, "Configured sandbox runtime");
        Ok(Self {
            client,
            endpoint,
            container,
        })
    }

    /// Look the container up by name and check that it is running
    async fn ensure_running(&self) -> Result<(), SandboxError> {
        let info = self
            .client
            .inspect_container(&self.container, None::<InspectContainerOptions>)
            .await
            .map_err(|source| match source {
                DockerError::DockerResponseServerError { status_code: 404, .. } => {
                    SandboxError::ContainerNotFound {
                        name: self.container.clone(),
                        source,
                    }
                }
                source => SandboxError::Connect {
                    endpoint: self.endpoint.as_str().to_string(),
                    source,
                },
            })?;

        let running = info.state.and_then(|s| s.running).unwrap_or(false);
        if !running {
            return Err(SandboxError::NotRunning(self.container.clone()));
        }
        debug!(container = %self.container, "Sandbox container is running");
        Ok(())
    }

    fn exec_error(&self, source: DockerError) -> SandboxError {
        SandboxError::Exec {
            container: self.container.clone(),
            source,
        }
    }
}

#[async_trait]
impl SandboxRuntime for DockerSandbox {
    fn container(&self) -> &str {
        &self.container
    }

    #[instrument(skip_all, fields(container = %self.container))]
    async fn exec(&self, command: Vec<String>) -> Result<ExecOutput, SandboxError> {
        self.ensure_running().await?;

        let options = CreateExecOptions {
            cmd: Some(command),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            ..Default::default()
        };

        let exec = self
            .client
            .create_exec(&self.container, options)
            .await
            .map_err(|e| self.exec_error(e))?;

        let started = self
            .client
            .start_exec(&exec.id, None)
            .await
            .map_err(|e| self.exec_error(e))?;

        let mut output = ExecOutput::default();
        match started {
            StartExecResults::Attached { output: mut stream, .. } => {
                while let Some(chunk) = stream.next().await {
                    match chunk.map_err(|e| self.exec_error(e))? {
                        LogOutput::StdOut { message } => output.stdout.extend_from_slice(&message),
                        LogOutput::StdErr { message } => output.stderr.extend_from_slice(&message),
                        _ => {}
                    }
                }
            }
            StartExecResults::Detached => {
                return Err(SandboxError::Detached(self.container.clone()));
            }
        }

        let inspect = self
            .client
            .inspect_exec(&exec.id)
            .await
            .map_err(|e| self.exec_error(e))?;
        output.exit_code = inspect.exit_code;

        debug!(
            exit_code = ?output.exit_code,
            stdout_len = output.stdout.len(),
            stderr_len = output.stderr.len(),
            "Sandbox exec completed"
        );
        Ok(output)
    }
}

impl std::fmt::Debug for DockerSandbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DockerSandbox")
            .field("endpoint", &self.endpoint)
            .field("container", &self.container)
            .finish()
    }
}
