//! HTTP surface for Huddle meeting agents.
//!
//! - `POST /join-agent`: start an orchestration run for a meeting
//! - `POST /leave-agent`: stop every session of a meeting
//! - `GET /sessions`, `GET /sessions/:meeting_id`: inspect the session table
//! - `GET /test`: liveness check
//!
//! # Example
//!
//! ```ignore
//! use huddle_api::{serve, ApiConfig, AppState};
//!
//! let state = AppState::new(ApiConfig::default(), orchestrator);
//! serve(ApiConfig::default(), state).await?;
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
pub mod types;

pub use cli::Cli;
pub use config::ApiConfig;
pub use error::{ApiError, Result};
pub use router::{create_router, serve};
pub use state::AppState;
