//! Runtime configuration.

use std::time::Duration;

use huddle_bus::DiscoveryPolicy;
use huddle_core::Settings;

/// How the orchestrator waits between launching specialists and the primary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SettlePolicy {
    /// Always wait the full settle delay.
    #[default]
    FixedDelay,
    /// Return once every specialist card is registered, waiting at most
    /// the settle delay.
    AwaitRegistration,
}

/// Configuration for sessions and orchestration runs.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Wait between the two startup waves.
    pub settle_delay: Duration,
    /// How the wait is applied.
    pub settle_policy: SettlePolicy,
    /// Discovery policy handed to each run's bus.
    pub discovery: DiscoveryPolicy,
    /// Capacity of the session event channel.
    pub event_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(3),
            settle_policy: SettlePolicy::FixedDelay,
            discovery: DiscoveryPolicy::default(),
            event_capacity: 256,
        }
    }
}

impl RuntimeConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the timing knobs from process settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::default()
            .with_settle_delay(settings.settle_delay)
            .with_discovery(DiscoveryPolicy::new(
                settings.discovery_attempts,
                settings.discovery_interval,
            ))
    }

    /// Sets the settle delay.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Sets the settle policy.
    pub fn with_settle_policy(mut self, policy: SettlePolicy) -> Self {
        self.settle_policy = policy;
        self
    }

    /// Sets the discovery policy.
    pub fn with_discovery(mut self, policy: DiscoveryPolicy) -> Self {
        self.discovery = policy;
        self
    }

    /// Sets the event channel capacity.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}
