//! yangmei: single-round CTF solving agent
//!
//! Asks a chat model for Python code, runs it once inside a sandbox
//! container, and asks the model again for the final answer.

pub mod agent;
pub mod config;
pub mod conversation;
pub mod error;
pub mod prompt;
pub mod render;
pub mod sandbox;
pub mod tools;

pub use agent::YangmeiAgent;
pub use config::{Config, SandboxConfig};
pub use conversation::Conversation;
pub use error::{AgentError, ConfigError, SandboxError};
