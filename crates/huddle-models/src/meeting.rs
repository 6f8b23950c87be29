//! Meeting configuration an orchestration run is started from.
//!
//! The orchestrator treats these parameters as opaque; they flow through to
//! pipeline construction and the room join.

use serde::{Deserialize, Serialize};

use crate::ids::MeetingId;

/// Default voice for interactive pipelines.
pub const DEFAULT_VOICE: &str = "Puck";
/// Default model for all pipelines.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Language-model sampling parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    /// Model name.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling bound.
    pub top_p: f32,
    /// Top-k sampling bound.
    pub top_k: u32,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            top_p: 0.9,
            top_k: 1,
        }
    }
}

/// Speech output parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceParams {
    /// Voice name.
    pub voice: String,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            voice: DEFAULT_VOICE.to_string(),
        }
    }
}

/// Conversational behavior parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorParams {
    /// Free-text personality hint appended to the primary's instructions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personality: Option<String>,
}

/// Everything needed to start one orchestration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingConfig {
    /// Meeting to attach to.
    pub meeting_id: MeetingId,
    /// Room authentication token.
    pub auth_token: String,
    /// Model parameters.
    #[serde(default)]
    pub model: ModelParams,
    /// Voice parameters.
    #[serde(default)]
    pub voice: VoiceParams,
    /// Overrides the primary agent's instructions when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Behavior parameters.
    #[serde(default)]
    pub behavior: BehaviorParams,
}

impl MeetingConfig {
    /// Creates a config with default model, voice and behavior.
    pub fn new(meeting_id: impl Into<MeetingId>, auth_token: impl Into<String>) -> Self {
        Self {
            meeting_id: meeting_id.into(),
            auth_token: auth_token.into(),
            model: ModelParams::default(),
            voice: VoiceParams::default(),
            system_prompt: None,
            behavior: BehaviorParams::default(),
        }
    }

    /// Sets the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Sets the personality hint.
    pub fn with_personality(mut self, personality: impl Into<String>) -> Self {
        self.behavior.personality = Some(personality.into());
        self
    }

    /// Sets the model parameters.
    pub fn with_model(mut self, model: ModelParams) -> Self {
        self.model = model;
        self
    }
}
