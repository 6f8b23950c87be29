//! Session orchestration for Huddle meetings.
//!
//! The [`SessionOrchestrator`] turns one meeting request into a cohort of
//! agent sessions chosen by a [`Scenario`], starts them in two waves
//! (specialists, then after a settle delay the user-facing primary), waits
//! for all of them and removes the meeting's table entry exactly once.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use huddle_agents::{LocalRoomFactory, ScriptedPipelineFactory};
//! use huddle_models::MeetingConfig;
//! use huddle_orchestrator::{SessionOrchestrator, TravelScenario};
//! use huddle_runtime::RuntimeConfig;
//!
//! let orchestrator = SessionOrchestrator::new(
//!     Arc::new(TravelScenario),
//!     Arc::new(ScriptedPipelineFactory::new()),
//!     Arc::new(LocalRoomFactory::new()),
//!     RuntimeConfig::default(),
//! );
//!
//! let run = orchestrator.spawn(MeetingConfig::new("meet-123", "token"));
//! // ... later
//! orchestrator.leave(&"meet-123".into());
//! let report = run.await?;
//! ```

mod error;
mod orchestrator;
mod report;
mod scenario;

pub use error::{OrchestratorError, Result};
pub use orchestrator::{LeaveOutcome, SessionOrchestrator};
pub use report::{OrchestrationReport, RunOutcome};
pub use scenario::{AssistantScenario, Cohort, CustomerServiceScenario, Scenario, ScenarioKind, TravelScenario};
