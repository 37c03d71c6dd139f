//! llm-core: Chat model client for the Yangmei agent
//!
//! Provides:
//! - Chat message data model with tool calls
//! - The `ChatModel` capability used by the orchestrator
//! - OpenAI-compatible chat completions client
//! - Call observers for telemetry

pub mod config;
pub mod message;
pub mod observer;
pub mod openai;

use anyhow::Result;
use async_trait::async_trait;

pub use config::ModelConfig;
pub use message::{ChatMessage, FunctionCall, FunctionDefinition, Role, ToolCall, ToolDefinition};
pub use observer::{CallObserver, NoopObserver, TokenUsage, TracingObserver};
pub use openai::OpenAiClient;

/// A remote chat model that answers a conversation with one assistant message
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier used for requests and logging
    fn model_name(&self) -> &str;

    /// Send the full conversation and return the assistant reply.
    ///
    /// The reply may carry zero or more tool calls against `tools`.
    async fn invoke(&self, messages: &[ChatMessage], tools: &[ToolDefinition]) -> Result<ChatMessage>;
}
