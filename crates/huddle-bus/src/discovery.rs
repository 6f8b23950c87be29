//! Bounded-retry specialist discovery.
//!
//! Specialists register only once their own session is running, and the
//! primary may start fractionally earlier or later. Discovery polls the
//! registry a fixed number of times instead of trusting a single lookup.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use huddle_models::{AgentId, Domain};
use tracing::{debug, warn};

use crate::registry::AgentRegistry;

/// Source of domain lookups.
pub trait DomainDirectory: Send + Sync {
    /// Identities currently serving `domain`, in registration order.
    fn find_by_domain(&self, domain: &Domain) -> Vec<AgentId>;
}

impl DomainDirectory for AgentRegistry {
    fn find_by_domain(&self, domain: &Domain) -> Vec<AgentId> {
        AgentRegistry::find_by_domain(self, domain)
    }
}

/// Retry policy for discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryPolicy {
    /// Polling rounds before giving up.
    pub max_attempts: u32,
    /// Wait between rounds. Not applied after the final round.
    pub interval: Duration,
}

impl Default for DiscoveryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            interval: Duration::from_secs(2),
        }
    }
}

impl DiscoveryPolicy {
    /// Creates a policy.
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }
}

/// Result of a multi-domain discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryOutcome {
    /// Matches per requested domain. Empty for domains never found.
    pub matches: BTreeMap<Domain, Vec<AgentId>>,
    /// Polling rounds performed.
    pub attempts: u32,
}

impl DiscoveryOutcome {
    /// Returns true if every requested domain has at least one match.
    pub fn is_complete(&self) -> bool {
        self.matches.values().all(|ids| !ids.is_empty())
    }

    /// First (earliest registered) identity for `domain`.
    pub fn first(&self, domain: &Domain) -> Option<&AgentId> {
        self.matches.get(domain).and_then(|ids| ids.first())
    }

    /// Requested domains with no match.
    pub fn missing(&self) -> Vec<&Domain> {
        self.matches
            .iter()
            .filter(|(_, ids)| ids.is_empty())
            .map(|(domain, _)| domain)
            .collect()
    }
}

/// Polls a [`DomainDirectory`] until agents appear or attempts run out.
pub struct SpecialistDiscovery<D: DomainDirectory + ?Sized = AgentRegistry> {
    directory: Arc<D>,
    policy: DiscoveryPolicy,
}

impl<D: DomainDirectory + ?Sized> SpecialistDiscovery<D> {
    /// Creates a discovery helper over `directory`.
    pub fn new(directory: Arc<D>, policy: DiscoveryPolicy) -> Self {
        Self { directory, policy }
    }

    /// Returns the default policy.
    pub fn policy(&self) -> DiscoveryPolicy {
        self.policy
    }

    /// Discovers `domain` with the default policy.
    pub async fn discover(&self, domain: &Domain) -> Vec<AgentId> {
        self.discover_with(domain, self.policy.max_attempts, self.policy.interval)
            .await
    }

    /// Discovers `domain`, polling at most `max_attempts` times.
    ///
    /// Returns as soon as a lookup is non-empty. Returns an empty sequence
    /// after `max_attempts` empty lookups.
    pub async fn discover_with(
        &self,
        domain: &Domain,
        max_attempts: u32,
        interval: Duration,
    ) -> Vec<AgentId> {
        let policy = DiscoveryPolicy::new(max_attempts, interval);
        let mut outcome = self
            .poll(std::slice::from_ref(domain), policy)
            .await;
        outcome.matches.remove(domain).unwrap_or_default()
    }

    /// Discovers every domain in `domains` together with the default policy.
    ///
    /// Each round looks up all domains; discovery stops at the first round
    /// in which every domain has a match.
    pub async fn discover_all(&self, domains: &[Domain]) -> DiscoveryOutcome {
        self.poll(domains, self.policy).await
    }

    async fn poll(&self, domains: &[Domain], policy: DiscoveryPolicy) -> DiscoveryOutcome {
        let mut outcome = DiscoveryOutcome::default();

        for attempt in 1..=policy.max_attempts {
            outcome.attempts = attempt;
            outcome.matches = domains
                .iter()
                .map(|d| (d.clone(), self.directory.find_by_domain(d)))
                .collect();

            if outcome.is_complete() {
                debug!(attempt, domains = ?domains, "specialists discovered");
                return outcome;
            }

            debug!(
                attempt,
                max_attempts = policy.max_attempts,
                missing = ?outcome.missing(),
                "specialists not yet registered"
            );
            if attempt < policy.max_attempts {
                tokio::time::sleep(policy.interval).await;
            }
        }

        if policy.max_attempts == 0 {
            outcome.matches = domains.iter().map(|d| (d.clone(), Vec::new())).collect();
        }
        warn!(
            attempts = outcome.attempts,
            missing = ?outcome.missing(),
            "specialist discovery exhausted"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use huddle_models::AgentCard;

    /// Directory that counts lookups and starts answering after `ready_after` calls.
    struct CountingDirectory {
        lookups: AtomicU32,
        ready_after: Option<u32>,
        ids: Mutex<Vec<AgentId>>,
    }

    impl CountingDirectory {
        fn new(ready_after: Option<u32>) -> Self {
            Self {
                lookups: AtomicU32::new(0),
                ready_after,
                ids: Mutex::new(vec!["agent_hotel_001".into()]),
            }
        }

        fn lookups(&self) -> u32 {
            self.lookups.load(Ordering::SeqCst)
        }
    }

    impl DomainDirectory for CountingDirectory {
        fn find_by_domain(&self, _domain: &Domain) -> Vec<AgentId> {
            let n = self.lookups.fetch_add(1, Ordering::SeqCst) + 1;
            match self.ready_after {
                Some(ready) if n >= ready => self.ids.lock().unwrap().clone(),
                _ => Vec::new(),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_discover_exhausts_after_exact_attempts() {
        let directory = Arc::new(CountingDirectory::new(None));
        let discovery = SpecialistDiscovery::new(directory.clone(), DiscoveryPolicy::default());

        let start = tokio::time::Instant::now();
        let found = discovery.discover(&Domain::new("hotel")).await;

        assert!(found.is_empty());
        assert_eq!(directory.lookups(), 3);
        // Two intervals: no wait after the final attempt.
        assert_eq!(start.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_discover_returns_immediately_when_found() {
        let directory = Arc::new(CountingDirectory::new(Some(1)));
        let discovery = SpecialistDiscovery::new(directory.clone(), DiscoveryPolicy::default());

        let start = tokio::time::Instant::now();
        let found = discovery.discover(&Domain::new("hotel")).await;

        assert_eq!(found.len(), 1);
        assert_eq!(directory.lookups(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_discover_tolerates_late_registration() {
        let directory = Arc::new(CountingDirectory::new(Some(2)));
        let discovery = SpecialistDiscovery::new(directory.clone(), DiscoveryPolicy::default());

        let found = discovery.discover(&Domain::new("hotel")).await;

        assert_eq!(found[0].as_str(), "agent_hotel_001");
        assert_eq!(directory.lookups(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_discover_with_custom_policy() {
        let directory = Arc::new(CountingDirectory::new(None));
        let discovery = SpecialistDiscovery::new(directory.clone(), DiscoveryPolicy::default());

        let found = discovery
            .discover_with(&Domain::new("hotel"), 5, Duration::from_millis(10))
            .await;
        assert!(found.is_empty());
        assert_eq!(directory.lookups(), 5);

        let found = discovery
            .discover_with(&Domain::new("hotel"), 0, Duration::from_millis(10))
            .await;
        assert!(found.is_empty());
        assert_eq!(directory.lookups(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_discover_all_requires_every_domain() {
        let registry = Arc::new(AgentRegistry::new());
        registry.register(AgentCard::new("agent_flight_001", "Skymate", "flight"));
        let discovery = SpecialistDiscovery::new(registry.clone(), DiscoveryPolicy::default());

        let domains = [Domain::new("flight"), Domain::new("hotel")];
        let outcome = discovery.discover_all(&domains).await;

        assert!(!outcome.is_complete());
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.missing(), vec![&Domain::new("hotel")]);
        assert_eq!(outcome.first(&domains[0]).unwrap().as_str(), "agent_flight_001");
    }

    #[tokio::test(start_paused = true)]
    async fn test_discover_all_sees_registration_between_rounds() {
        let registry = Arc::new(AgentRegistry::new());
        let discovery = SpecialistDiscovery::new(registry.clone(), DiscoveryPolicy::default());

        let r = registry.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            r.register(AgentCard::new("agent_flight_001", "Skymate", "flight"));
            r.register(AgentCard::new("agent_hotel_001", "Hotelio", "hotel"));
        });

        let domains = [Domain::new("flight"), Domain::new("hotel")];
        let outcome = discovery.discover_all(&domains).await;

        assert!(outcome.is_complete());
        assert_eq!(outcome.attempts, 2);
    }
}
