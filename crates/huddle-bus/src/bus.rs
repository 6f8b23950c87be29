//! Per-run bundle of registry, router and discovery.

use std::sync::Arc;

use huddle_models::{AgentCard, AgentId, MessageKind, MessagePayload};

use crate::discovery::{DiscoveryPolicy, SpecialistDiscovery};
use crate::registry::AgentRegistry;
use crate::router::{Delivery, MessageHandler, MessageRouter};

/// The agent-to-agent bus handed to every agent in one orchestration run.
///
/// Cloning is cheap; clones share the same registry and router.
#[derive(Clone)]
pub struct A2ABus {
    registry: Arc<AgentRegistry>,
    router: Arc<MessageRouter>,
    discovery: Arc<SpecialistDiscovery>,
}

impl A2ABus {
    /// Creates an empty bus with the given discovery policy.
    pub fn new(policy: DiscoveryPolicy) -> Self {
        let registry = Arc::new(AgentRegistry::new());
        let router = Arc::new(MessageRouter::new(Arc::clone(&registry)));
        let discovery = Arc::new(SpecialistDiscovery::new(Arc::clone(&registry), policy));
        Self {
            registry,
            router,
            discovery,
        }
    }

    /// Returns the registry.
    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Returns the router.
    pub fn router(&self) -> &MessageRouter {
        &self.router
    }

    /// Returns the discovery helper.
    pub fn discovery(&self) -> &SpecialistDiscovery {
        &self.discovery
    }

    /// Publishes `card`.
    pub fn register(&self, card: AgentCard) {
        self.registry.register(card);
    }

    /// Installs a handler. See [`MessageRouter::on_message`].
    pub fn on_message(&self, agent_id: &AgentId, kind: MessageKind, handler: MessageHandler) -> bool {
        self.router.on_message(agent_id, kind, handler)
    }

    /// Sends a message. See [`MessageRouter::send`].
    pub fn send(&self, from: &AgentId, to: &AgentId, payload: MessagePayload) -> Delivery {
        self.router.send(from, to, payload)
    }

    /// Unregisters the agent and drops its inbox.
    ///
    /// Returns true if the agent was registered.
    pub fn detach(&self, agent_id: &AgentId) -> bool {
        self.router.remove_agent(agent_id);
        self.registry.unregister(agent_id).is_some()
    }
}

impl Default for A2ABus {
    fn default() -> Self {
        Self::new(DiscoveryPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::handler;
    use huddle_models::{Domain, SpecialistResponse};

    #[tokio::test]
    async fn test_clones_share_state() {
        let bus = A2ABus::default();
        let other = bus.clone();

        bus.register(AgentCard::new("loan_specialist_1", "Loan", Domain::LOAN));
        assert!(other.registry().contains(&"loan_specialist_1".into()));
        assert_eq!(other.discovery().policy(), DiscoveryPolicy::default());
    }

    #[tokio::test]
    async fn test_detach() {
        let bus = A2ABus::default();
        let id: AgentId = "loan_specialist_1".into();
        bus.register(AgentCard::new(id.clone(), "Loan", Domain::LOAN));
        bus.on_message(&id, MessageKind::SpecialistResponse, handler(|_| async { Ok(()) }));

        assert!(bus.detach(&id));
        assert!(!bus.detach(&id));
        assert!(bus.registry().is_empty());

        let payload = MessagePayload::SpecialistResponse(SpecialistResponse {
            response: "x".into(),
        });
        assert_eq!(bus.send(&"cs".into(), &id, payload), Delivery::UnknownAgent);
    }
}
