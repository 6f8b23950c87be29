//! Hygiene for inbound join requests.

use std::sync::OnceLock;

use regex::Regex;

/// Longest system prompt kept after sanitisation, in characters.
pub const MAX_PROMPT_LEN: usize = 2000;

const MIN_MEETING_ID_LEN: usize = 5;
const MAX_MEETING_ID_LEN: usize = 100;

static MEETING_ID_RE: OnceLock<Regex> = OnceLock::new();

fn meeting_id_re() -> &'static Regex {
    MEETING_ID_RE.get_or_init(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("valid meeting id regex"))
}

/// Returns true if `meeting_id` is 5-100 characters of `[A-Za-z0-9_-]`.
pub fn validate_meeting_id(meeting_id: &str) -> bool {
    (MIN_MEETING_ID_LEN..=MAX_MEETING_ID_LEN).contains(&meeting_id.len())
        && meeting_id_re().is_match(meeting_id)
}

/// Collapses whitespace runs to single spaces and truncates to
/// [`MAX_PROMPT_LEN`] characters.
pub fn sanitize_system_prompt(prompt: &str) -> String {
    prompt
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(MAX_PROMPT_LEN)
        .collect()
}

/// Model parameters after clamping to their valid ranges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClampedParams {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
}

/// Clamps temperature to 0-2, top_p to 0-1 and top_k to at least 0.
///
/// Non-finite inputs clamp to the lower bound.
pub fn clamp_model_params(temperature: f64, top_p: f64, top_k: f64) -> ClampedParams {
    let clamp = |v: f64, lo: f64, hi: f64| if v.is_nan() { lo } else { v.clamp(lo, hi) };
    ClampedParams {
        temperature: clamp(temperature, 0.0, 2.0) as f32,
        top_p: clamp(top_p, 0.0, 1.0) as f32,
        top_k: clamp(top_k, 0.0, u32::MAX as f64) as u32,
    }
}
