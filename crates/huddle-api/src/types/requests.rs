//! Request DTOs for the API.

use huddle_core::{clamp_model_params, sanitize_system_prompt, validate_meeting_id};
use huddle_models::{BehaviorParams, MeetingConfig, ModelParams, VoiceParams};
use serde::Deserialize;

use crate::error::{ApiError, Result};

/// Join agent request. Field names follow the public wire format.
#[derive(Debug, Clone, Deserialize)]
pub struct JoinAgentRequest {
    /// Meeting to join.
    pub meeting_id: String,
    /// Room authentication token.
    pub token: String,
    /// Model name.
    pub model: Option<String>,
    /// Voice name.
    pub voice: Option<String>,
    /// Personality hint.
    pub personality: Option<String>,
    /// Sampling temperature (0-2).
    pub temperature: Option<f64>,
    /// Replaces the primary agent's instructions.
    pub system_prompt: Option<String>,
    /// Nucleus sampling bound (0-1).
    #[serde(rename = "topP")]
    pub top_p: Option<f64>,
    /// Top-k sampling bound.
    #[serde(rename = "topK")]
    pub top_k: Option<f64>,
}

impl JoinAgentRequest {
    /// Validates the request and builds the meeting configuration.
    pub fn into_meeting_config(self) -> Result<MeetingConfig> {
        if !validate_meeting_id(&self.meeting_id) {
            return Err(ApiError::BadRequest(format!(
                "invalid meeting_id: {} (expected 5-100 characters of letters, digits, '_' or '-')",
                self.meeting_id
            )));
        }
        if self.token.trim().is_empty() {
            return Err(ApiError::BadRequest("token must not be empty".to_string()));
        }

        let defaults = ModelParams::default();
        let params = clamp_model_params(
            self.temperature.unwrap_or(defaults.temperature as f64),
            self.top_p.unwrap_or(defaults.top_p as f64),
            self.top_k.unwrap_or(defaults.top_k as f64),
        );
        let model = ModelParams {
            model: non_empty(self.model).unwrap_or(defaults.model),
            temperature: params.temperature,
            top_p: params.top_p,
            top_k: params.top_k,
        };
        let voice = non_empty(self.voice)
            .map(|voice| VoiceParams { voice })
            .unwrap_or_default();
        let system_prompt = self
            .system_prompt
            .map(|p| sanitize_system_prompt(&p))
            .filter(|p| !p.is_empty());

        Ok(MeetingConfig {
            meeting_id: self.meeting_id.into(),
            auth_token: self.token,
            model,
            voice,
            system_prompt,
            behavior: BehaviorParams {
                personality: non_empty(self.personality),
            },
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Leave agent request.
#[derive(Debug, Clone, Deserialize)]
pub struct LeaveAgentRequest {
    /// Meeting to leave.
    pub meeting_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: serde_json::Value) -> JoinAgentRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_full_request() {
        let config = request(json!({
            "meeting_id": "abcd-efgh-ijkl",
            "token": "tok",
            "model": "gemini-2.0-flash-live",
            "voice": "Charon",
            "personality": "cheerful",
            "temperature": 3.5,
            "system_prompt": "  You are\n\n  a   travel agent. ",
            "topP": -0.5,
            "topK": 40.0
        }))
        .into_meeting_config()
        .unwrap();

        assert_eq!(config.meeting_id.as_str(), "abcd-efgh-ijkl");
        assert_eq!(config.model.model, "gemini-2.0-flash-live");
        assert_eq!(config.model.temperature, 2.0);
        assert_eq!(config.model.top_p, 0.0);
        assert_eq!(config.model.top_k, 40);
        assert_eq!(config.voice.voice, "Charon");
        assert_eq!(config.system_prompt.as_deref(), Some("You are a travel agent."));
        assert_eq!(config.behavior.personality.as_deref(), Some("cheerful"));
    }

    #[test]
    fn test_minimal_request_uses_defaults() {
        let config = request(json!({"meeting_id": "meet-123", "token": "tok", "system_prompt": "   "}))
            .into_meeting_config()
            .unwrap();

        assert_eq!(config.model, ModelParams::default());
        assert_eq!(config.voice, VoiceParams::default());
        assert!(config.system_prompt.is_none());
        assert!(config.behavior.personality.is_none());
    }

    #[test]
    fn test_invalid_meeting_id() {
        let err = request(json!({"meeting_id": "a b", "token": "tok"}))
            .into_meeting_config()
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_empty_token() {
        let err = request(json!({"meeting_id": "meet-123", "token": " "}))
            .into_meeting_config()
            .unwrap_err();
        assert!(err.to_string().contains("token"));
    }
}
