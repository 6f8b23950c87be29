//! Core data models for Huddle.
//!
//! This crate provides the fundamental data types shared by the agent
//! registry, the message router, the session runtime and the HTTP layer:
//! agent capability cards, typed agent-to-agent messages, session states
//! and the meeting configuration an orchestration run is started from.

pub mod card;
pub mod ids;
pub mod meeting;
pub mod message;
pub mod session;

// Re-export main types
pub use card::{AgentCard, Domain};
pub use ids::{AgentId, MeetingId, MessageId, RunId};
pub use meeting::{BehaviorParams, MeetingConfig, ModelParams, VoiceParams};
pub use message::{
    A2AMessage, BookingDetails, BookingResponse, EmailConfirmation, EmailRequest, EmailStatus,
    MessageKind, MessagePayload, SearchQuery, SpecialistQuery, SpecialistResponse,
    UnknownMessageKind,
};
pub use session::{RunPhase, SessionRole, SessionState};
