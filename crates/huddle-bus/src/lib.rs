//! Huddle Bus - in-process agent-to-agent plumbing.
//!
//! - **registry**: [`AgentRegistry`] maps agent identity to its card and
//!   domain to the identities serving it
//! - **router**: [`MessageRouter`] delivers typed messages to per-agent
//!   handler tables, one serial worker per agent
//! - **discovery**: [`SpecialistDiscovery`] polls the registry with a
//!   bounded retry policy
//! - **bus**: [`A2ABus`] bundles the three for one orchestration run
//!
//! Delivery is at-most-once and best effort. Nothing here crosses a
//! process boundary.

pub mod bus;
pub mod discovery;
pub mod error;
pub mod registry;
pub mod router;

pub use bus::A2ABus;
pub use discovery::{DiscoveryOutcome, DiscoveryPolicy, DomainDirectory, SpecialistDiscovery};
pub use error::{BusError, Result};
pub use registry::{AgentRegistry, RegistryEvent};
pub use router::{handler, Delivery, HandlerError, HandlerResult, MessageHandler, MessageRouter};
