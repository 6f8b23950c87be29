//! Agent registry: identity → card, domain → identities.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use huddle_models::{AgentCard, AgentId, Domain};
use tokio::sync::broadcast;
use tracing::debug;

/// Registry change notification.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryEvent {
    /// A card was inserted or overwritten.
    Registered { card: AgentCard },
    /// A card was removed.
    Unregistered { agent_id: AgentId },
}

#[derive(Debug, Default)]
struct RegistryInner {
    cards: HashMap<AgentId, AgentCard>,
    /// Identities per domain, in registration order.
    by_domain: HashMap<Domain, Vec<AgentId>>,
    /// `find_by_domain` calls per domain.
    lookups: HashMap<Domain, u64>,
}

impl RegistryInner {
    fn purge(&mut self, agent_id: &AgentId) {
        self.by_domain.retain(|_, ids| {
            ids.retain(|id| id != agent_id);
            !ids.is_empty()
        });
    }
}

/// Directory of the agents currently present in one orchestration run.
///
/// All mutations and lookups go through a single mutex. Call volume is
/// tens of entries, so readers always get a consistent snapshot.
///
/// # Example
///
/// ```
/// use huddle_bus::AgentRegistry;
/// use huddle_models::{AgentCard, Domain};
///
/// let registry = AgentRegistry::new();
/// registry.register(AgentCard::new("agent_flight_001", "Skymate", Domain::FLIGHT));
///
/// let found = registry.find_by_domain(&Domain::new(Domain::FLIGHT));
/// assert_eq!(found[0].as_str(), "agent_flight_001");
/// ```
pub struct AgentRegistry {
    inner: Mutex<RegistryInner>,
    event_tx: broadcast::Sender<RegistryEvent>,
}

impl AgentRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            inner: Mutex::new(RegistryInner::default()),
            event_tx,
        }
    }

    // A panicking holder cannot leave the maps half-updated, so poison is ignored.
    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts or overwrites the card under its identity.
    ///
    /// Re-registering under the same domain keeps the identity's position in
    /// the domain index; a new domain moves it to the end of that domain.
    pub fn register(&self, card: AgentCard) {
        {
            let mut inner = self.lock();
            let same_domain = inner
                .cards
                .get(&card.id)
                .is_some_and(|prev| prev.domain == card.domain);

            if !same_domain {
                inner.purge(&card.id);
                inner
                    .by_domain
                    .entry(card.domain.clone())
                    .or_default()
                    .push(card.id.clone());
            }
            inner.cards.insert(card.id.clone(), card.clone());
        }

        debug!(agent_id = %card.id, domain = %card.domain, "agent registered");
        let _ = self.event_tx.send(RegistryEvent::Registered { card });
    }

    /// Removes the card and purges the identity from every domain.
    ///
    /// Returns the removed card, or `None` if the identity was absent.
    pub fn unregister(&self, agent_id: &AgentId) -> Option<AgentCard> {
        let removed = {
            let mut inner = self.lock();
            let removed = inner.cards.remove(agent_id);
            inner.purge(agent_id);
            removed
        };

        if removed.is_some() {
            debug!(agent_id = %agent_id, "agent unregistered");
            let _ = self.event_tx.send(RegistryEvent::Unregistered {
                agent_id: agent_id.clone(),
            });
        }
        removed
    }

    /// Identities currently registered for `domain`, in registration order.
    pub fn find_by_domain(&self, domain: &Domain) -> Vec<AgentId> {
        let mut inner = self.lock();
        *inner.lookups.entry(domain.clone()).or_default() += 1;
        inner.by_domain.get(domain).cloned().unwrap_or_default()
    }

    /// Number of `find_by_domain` calls made for `domain`.
    pub fn lookups(&self, domain: &Domain) -> u64 {
        self.lock().lookups.get(domain).copied().unwrap_or_default()
    }

    /// Gets a card by identity.
    pub fn get(&self, agent_id: &AgentId) -> Option<AgentCard> {
        self.lock().cards.get(agent_id).cloned()
    }

    /// Returns true if the identity is registered.
    pub fn contains(&self, agent_id: &AgentId) -> bool {
        self.lock().cards.contains_key(agent_id)
    }

    /// All registered cards, sorted by identity.
    pub fn list(&self) -> Vec<AgentCard> {
        let mut cards: Vec<AgentCard> = self.lock().cards.values().cloned().collect();
        cards.sort_by(|a, b| a.id.cmp(&b.id));
        cards
    }

    /// Returns the number of registered agents.
    pub fn len(&self) -> usize {
        self.lock().cards.len()
    }

    /// Returns true if no agents are registered.
    pub fn is_empty(&self) -> bool {
        self.lock().cards.is_empty()
    }

    /// Subscribes to registry changes.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.event_tx.subscribe()
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
