//! Orchestrator for one question/answer exchange

use std::sync::Arc;

use llm_core::{ChatMessage, ChatModel, OpenAiClient, ToolDefinition, TracingObserver};
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::conversation::Conversation;
use crate::error::AgentError;
use crate::prompt;
use crate::sandbox::DockerSandbox;
use crate::tools::builtin::create_default_registry;
use crate::tools::router::ToolRouter;

/// The CTF solving agent
///
/// Exactly two model calls are made per `run`. Only tool calls from the first
/// reply are executed; the round limit is structural, not counted.
pub struct YangmeiAgent<M> {
    model: M,
    router: ToolRouter,
}

impl YangmeiAgent<OpenAiClient> {
    /// Wire up the OpenAI client and the Docker sandbox from `config`
    pub fn from_config(config: &Config) -> Result<Self, AgentError> {
        let model = OpenAiClient::new(config.model.clone())
            .map_err(AgentError::Model)?
            .with_observer(TracingObserver);

        let sandbox = DockerSandbox::new(&config.sandbox.docker_host, config.sandbox.container_name.clone())?;
        let registry = create_default_registry(Arc::new(sandbox), &config.sandbox.interpreter);

        Ok(Self::new(model, ToolRouter::new(registry)))
    }
}

impl<M: ChatModel> YangmeiAgent<M> {
    pub fn new(model: M, router: ToolRouter) -> Self {
        Self { model, router }
    }

    /// Solve `question` following `task` and return the full transcript.
    ///
    /// The transcript is System, User, AI, one Tool message per tool call of
    /// the first AI reply, then the final AI reply. Any failure aborts the run
    /// and no partial transcript is returned.
    #[instrument(skip_all, fields(model = %self.model.model_name()))]
    pub async fn run(&self, question: &str, task: &str) -> Result<Conversation, AgentError> {
        info!(
            question_len = question.len(),
            task_len = task.len(),
            "Starting agent run"
        );

        let mut conversation = Conversation::from_messages(prompt::build_messages(question, task));
        let tools = self.router.tool_definitions();

        let first = self.ask(&conversation, &tools).await?;
        let tool_calls = first.tool_calls.clone();
        conversation.push(first);

        debug!(tool_count = tool_calls.len(), "Processing tool calls");
        for call in &tool_calls {
            let result = self.router.dispatch(call).await?;
            conversation.push(result);
        }

        let last = self.ask(&conversation, &tools).await?;
        if last.has_tool_calls() {
            debug!(
                ignored = last.tool_calls.len(),
                "Final reply requested more tools; not executing"
            );
        }
        conversation.push(last);

        info!(
            messages = conversation.len(),
            tool_results = tool_calls.len(),
            "Agent run completed"
        );
        Ok(conversation)
    }

    async fn ask(&self, conversation: &Conversation, tools: &[ToolDefinition]) -> Result<ChatMessage, AgentError> {
        self.model
            .invoke(conversation.messages(), tools)
            .await
            .map_err(AgentError::Model)
    }
}

impl<M> std::fmt::Debug for YangmeiAgent<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YangmeiAgent")
            .field("router", &self.router)
            .finish()
    }
}
