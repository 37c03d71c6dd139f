//! Call observers for model telemetry
//!
//! An observer is attached to a client at construction time and is told about
//! every request, reply and failure. The default does nothing.

use std::time::Duration;

use tracing::{info, warn};

use crate::message::ChatMessage;

/// Token accounting reported by the API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Hooks invoked around each model call
pub trait CallObserver: Send + Sync {
    fn on_request(&self, _model: &str, _messages: &[ChatMessage]) {}

    fn on_response(
        &self,
        _model: &str,
        _reply: &ChatMessage,
        _usage: Option<TokenUsage>,
        _elapsed: Duration,
    ) {
    }

    fn on_error(&self, _model: &str, _error: &anyhow::Error) {}
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl CallObserver for NoopObserver {}

/// Observer that emits structured `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl CallObserver for TracingObserver {
    fn on_request(&self, model: &str, messages: &[ChatMessage]) {
        info!(model, messages = messages.len(), "Model request");
    }

    fn on_response(
        &self,
        model: &str,
        reply: &ChatMessage,
        usage: Option<TokenUsage>,
        elapsed: Duration,
    ) {
        let usage = usage.unwrap_or_default();
        info!(
            model,
            content_len = reply.content.len(),
            tool_calls = reply.tool_calls.len(),
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            latency_ms = elapsed.as_millis() as u64,
            "Model response"
        );
    }

    fn on_error(&self, model: &str, error: &anyhow::Error) {
        warn!(model, error = %error, "Model request failed");
    }
}
