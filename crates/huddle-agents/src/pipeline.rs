//! Language-model pipeline contract.
//!
//! A pipeline turns conversation history into response text and tool
//! calls. Two configurations exist: interactive pipelines serve agents
//! attached to the live room and honour the caller's sampling and voice
//! parameters; background pipelines serve text-only specialists.

use std::sync::Arc;

use async_trait::async_trait;
use huddle_models::{MeetingConfig, ModelParams, VoiceParams};
use serde::{Deserialize, Serialize};

use crate::chat::ChatMessage;
use crate::error::PipelineError;
use crate::tool::{ToolCall, ToolDefinition};

/// Pipeline configuration selected per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineMode {
    /// User-facing, audio-capable.
    Interactive,
    /// Text-only, for specialists.
    Background,
}

impl std::fmt::Display for PipelineMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Interactive => write!(f, "interactive"),
            Self::Background => write!(f, "background"),
        }
    }
}

/// Everything a pipeline needs to be built.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSpec {
    /// Configuration.
    pub mode: PipelineMode,
    /// Sampling parameters. Background pipelines use the model name only.
    pub model: ModelParams,
    /// Voice, for interactive pipelines.
    pub voice: Option<VoiceParams>,
}

impl PipelineSpec {
    /// Builds the spec for `mode` from a meeting request.
    pub fn for_meeting(mode: PipelineMode, meeting: &MeetingConfig) -> Self {
        match mode {
            PipelineMode::Interactive => Self {
                mode,
                model: meeting.model.clone(),
                voice: Some(meeting.voice.clone()),
            },
            PipelineMode::Background => Self {
                mode,
                model: ModelParams {
                    model: meeting.model.model.clone(),
                    ..ModelParams::default()
                },
                voice: None,
            },
        }
    }
}

/// One pipeline response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineReply {
    /// Text to speak or relay.
    pub text: Option<String>,
    /// Tools the model wants run.
    pub tool_calls: Vec<ToolCall>,
}

impl PipelineReply {
    /// A text-only reply.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            tool_calls: Vec::new(),
        }
    }

    /// A reply requesting tool calls.
    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            text: None,
            tool_calls: calls,
        }
    }

    /// Returns true if the reply requests tool calls.
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Produces responses from conversation history.
#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Configuration of this pipeline.
    fn mode(&self) -> PipelineMode;

    /// Generates the next reply for `history` under `instructions`.
    async fn respond(
        &self,
        instructions: &str,
        history: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<PipelineReply, PipelineError>;
}

/// Builds pipelines for sessions.
pub trait PipelineFactory: Send + Sync {
    /// Creates a pipeline for `spec`.
    fn create(&self, spec: &PipelineSpec) -> Arc<dyn Pipeline>;
}
