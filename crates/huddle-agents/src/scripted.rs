//! Deterministic pipelines for offline runs and tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::chat::ChatMessage;
use crate::error::PipelineError;
use crate::pipeline::{Pipeline, PipelineFactory, PipelineMode, PipelineReply, PipelineSpec};
use crate::tool::ToolDefinition;

/// Inputs captured from one `respond` call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub instructions: String,
    pub history: Vec<ChatMessage>,
    pub tool_names: Vec<String>,
}

/// Pipeline that plays back queued replies.
///
/// When the queue is empty it echoes the last user message, prefixed
/// with the configured fallback text.
pub struct ScriptedPipeline {
    mode: PipelineMode,
    replies: Mutex<VecDeque<Result<PipelineReply, PipelineError>>>,
    fallback: String,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedPipeline {
    /// Creates an empty script.
    pub fn new(mode: PipelineMode) -> Self {
        Self {
            mode,
            replies: Mutex::new(VecDeque::new()),
            fallback: "You said:".to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Sets the echo prefix used once the script runs out.
    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    /// Queues a reply.
    pub fn push_reply(&self, reply: PipelineReply) {
        self.lock_replies().push_back(Ok(reply));
    }

    /// Queues a failure.
    pub fn push_error(&self, message: impl Into<String>) {
        self.lock_replies()
            .push_back(Err(PipelineError::Scripted(message.into())));
    }

    /// Returns the calls seen so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock_replies(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<PipelineReply, PipelineError>>> {
        self.replies.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Pipeline for ScriptedPipeline {
    fn mode(&self) -> PipelineMode {
        self.mode
    }

    async fn respond(
        &self,
        instructions: &str,
        history: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<PipelineReply, PipelineError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                instructions: instructions.to_string(),
                history: history.to_vec(),
                tool_names: tools.iter().map(|t| t.name.clone()).collect(),
            });

        if let Some(next) = self.lock_replies().pop_front() {
            return next;
        }

        let last_user = history
            .iter()
            .rev()
            .find(|m| m.role == crate::chat::ChatRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        Ok(PipelineReply::text(format!("{} {}", self.fallback, last_user).trim().to_string()))
    }
}

/// Factory handing out [`ScriptedPipeline`]s.
///
/// Every created pipeline is kept so tests can script or inspect it.
#[derive(Default)]
pub struct ScriptedPipelineFactory {
    created: Mutex<Vec<Arc<ScriptedPipeline>>>,
}

impl ScriptedPipelineFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pipelines created so far, in creation order.
    pub fn created(&self) -> Vec<Arc<ScriptedPipeline>> {
        self.created
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl PipelineFactory for ScriptedPipelineFactory {
    fn create(&self, spec: &PipelineSpec) -> Arc<dyn Pipeline> {
        let pipeline = Arc::new(ScriptedPipeline::new(spec.mode));
        self.created
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::clone(&pipeline));
        pipeline
    }
}
