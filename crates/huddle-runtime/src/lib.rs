//! Huddle Runtime - agent sessions and the per-meeting session table.
//!
//! - `Session` - drives one agent from `Created` to `Ended`/`Failed`
//! - `SessionTable` - `meeting -> run -> role -> session`, with run-guarded removal
//! - `SessionEvent` - state and phase changes published to observers
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use huddle_agents::{LoanAgent, PipelineMode, ScriptedPipeline};
//! use huddle_bus::A2ABus;
//! use huddle_models::{RunId, SessionRole};
//! use huddle_runtime::Session;
//!
//! let session = Arc::new(Session::new(
//!     "meet-123".into(),
//!     RunId::new(),
//!     SessionRole::Specialist("loan_specialist_1".into()),
//!     Arc::new(LoanAgent::new()),
//!     A2ABus::default(),
//!     Arc::new(ScriptedPipeline::new(PipelineMode::Background)),
//! ));
//!
//! let task = tokio::spawn({
//!     let session = Arc::clone(&session);
//!     async move { session.run().await }
//! });
//! session.stop();
//! let outcome = task.await?;
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod session;
pub mod table;

pub use config::{RuntimeConfig, SettlePolicy};
pub use error::{Result, SessionError};
pub use event::{DrainOutcome, SessionEvent};
pub use session::{Session, SessionOutcome, SessionSnapshot};
pub use table::{RemovedRun, SessionTable};
