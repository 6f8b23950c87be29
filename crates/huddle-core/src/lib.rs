//! Huddle Core - shared configuration and request hygiene.
//!
//! - **settings**: Environment-backed [`Settings`] and `.env` loading
//! - **validation**: Meeting-id validation, prompt sanitisation and
//!   model-parameter clamping applied to inbound join requests
//! - **error**: [`ConfigError`]

pub mod error;
pub mod settings;
pub mod validation;

pub use error::{ConfigError, Result};
pub use settings::{load_env_files, Settings};
pub use validation::{
    clamp_model_params, sanitize_system_prompt, validate_meeting_id, ClampedParams,
    MAX_PROMPT_LEN,
};
