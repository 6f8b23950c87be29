//! Agent capability cards.
//!
//! An [`AgentCard`] is the immutable descriptor an agent publishes when it
//! enters its session. The registry indexes cards by identity and by
//! [`Domain`]; capabilities and description are diagnostic only.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::AgentId;

/// Coarse capability category used for discovery (e.g. "flight").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domain(String);

impl Domain {
    /// Travel coordination (the travel primary).
    pub const TRAVEL: &'static str = "travel";
    /// Flight search specialist.
    pub const FLIGHT: &'static str = "flight";
    /// Hotel search specialist.
    pub const HOTEL: &'static str = "hotel";
    /// Email automation specialist.
    pub const EMAIL: &'static str = "email";
    /// Loan information specialist.
    pub const LOAN: &'static str = "loan";
    /// General customer service (the customer-service primary).
    pub const CUSTOMER_SERVICE: &'static str = "customer_service";
    /// Knowledge assistant (the assistant primary).
    pub const ASSISTANT: &'static str = "assistant";

    /// Creates a domain from a string.
    pub fn new(domain: impl Into<String>) -> Self {
        Self(domain.into())
    }

    /// Returns the domain name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Domain {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Domain {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Capability descriptor for one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentCard {
    /// Unique identity, stable for the agent's lifetime in the registry.
    pub id: AgentId,
    /// Human-readable label.
    pub name: String,
    /// Capability category used for discovery.
    pub domain: Domain,
    /// Capability tags. Not matched against in routing.
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Free text.
    #[serde(default)]
    pub description: String,
}

impl AgentCard {
    /// Creates a card with no capabilities and an empty description.
    pub fn new(id: impl Into<AgentId>, name: impl Into<String>, domain: impl Into<Domain>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            domain: domain.into(),
            capabilities: Vec::new(),
            description: String::new(),
        }
    }

    /// Sets the capability tags.
    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_builder() {
        let card = AgentCard::new("agent_flight_001", "Skymate", Domain::FLIGHT)
            .with_capabilities(["search_flights", "modify_bookings"])
            .with_description("Handles all flight-related tasks");

        assert_eq!(card.id.as_str(), "agent_flight_001");
        assert_eq!(card.domain.as_str(), "flight");
        assert_eq!(card.capabilities.len(), 2);
        assert_eq!(card.description, "Handles all flight-related tasks");
    }

    #[test]
    fn test_card_deserialize_defaults() {
        let json = r#"{"id": "a", "name": "A", "domain": "hotel"}"#;
        let card: AgentCard = serde_json::from_str(json).unwrap();
        assert!(card.capabilities.is_empty());
        assert!(card.description.is_empty());
        assert_eq!(card.domain, Domain::from("hotel"));
    }
}
