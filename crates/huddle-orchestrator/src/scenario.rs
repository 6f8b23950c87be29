//! Scenarios: which agents make up a meeting's cohort.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use huddle_agents::{
    Agent, AssistantAgent, BookingSpecialist, CustomerServiceAgent, EmailAgent, KeywordIndex, KnowledgeRetriever,
    LoanAgent, TravelAgent,
};
use huddle_models::MeetingConfig;
use tracing::info;

use crate::error::{OrchestratorError, Result};

/// The agents of one orchestration run.
pub struct Cohort {
    /// The user-facing agent.
    pub primary: Arc<dyn Agent>,
    /// Background agents, each serving the domain on its card.
    pub specialists: Vec<Arc<dyn Agent>>,
}

/// Builds a fresh cohort for every meeting request.
pub trait Scenario: Send + Sync {
    fn name(&self) -> &str;

    fn cohort(&self, meeting: &MeetingConfig) -> Cohort;
}

/// Travel booking: coordinator plus flight, hotel and email specialists.
#[derive(Debug, Default)]
pub struct TravelScenario;

impl Scenario for TravelScenario {
    fn name(&self) -> &str {
        "travel"
    }

    fn cohort(&self, meeting: &MeetingConfig) -> Cohort {
        Cohort {
            primary: Arc::new(TravelAgent::new(meeting)),
            specialists: vec![
                Arc::new(BookingSpecialist::flight()) as Arc<dyn Agent>,
                Arc::new(BookingSpecialist::hotel()),
                Arc::new(EmailAgent::new()),
            ],
        }
    }
}

/// Customer service desk with a loan specialist.
#[derive(Debug, Default)]
pub struct CustomerServiceScenario;

impl Scenario for CustomerServiceScenario {
    fn name(&self) -> &str {
        "customer_service"
    }

    fn cohort(&self, meeting: &MeetingConfig) -> Cohort {
        Cohort {
            primary: Arc::new(CustomerServiceAgent::new(meeting)),
            specialists: vec![Arc::new(LoanAgent::new()) as Arc<dyn Agent>],
        }
    }
}

/// A single assistant, optionally backed by a knowledge base.
#[derive(Default)]
pub struct AssistantScenario {
    retriever: Option<Arc<dyn KnowledgeRetriever>>,
}

impl AssistantScenario {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retriever(mut self, retriever: Arc<dyn KnowledgeRetriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }
}

impl Scenario for AssistantScenario {
    fn name(&self) -> &str {
        "assistant"
    }

    fn cohort(&self, meeting: &MeetingConfig) -> Cohort {
        let mut agent = AssistantAgent::new(meeting);
        if let Some(retriever) = &self.retriever {
            agent = agent.with_retriever(Arc::clone(retriever));
        }
        Cohort {
            primary: Arc::new(agent),
            specialists: Vec::new(),
        }
    }
}

/// Scenario names accepted in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioKind {
    Travel,
    CustomerService,
    Assistant,
}

impl ScenarioKind {
    /// Builds the scenario. `knowledge_file` is only read by the assistant.
    pub fn build(self, knowledge_file: Option<&Path>) -> Result<Arc<dyn Scenario>> {
        let scenario: Arc<dyn Scenario> = match self {
            Self::Travel => Arc::new(TravelScenario),
            Self::CustomerService => Arc::new(CustomerServiceScenario),
            Self::Assistant => {
                let mut scenario = AssistantScenario::new();
                if let Some(path) = knowledge_file {
                    let index = KeywordIndex::load(path)?;
                    info!(path = %path.display(), chunks = index.len(), "knowledge base loaded");
                    scenario = scenario.with_retriever(Arc::new(index));
                }
                Arc::new(scenario)
            }
        };
        Ok(scenario)
    }
}

impl FromStr for ScenarioKind {
    type Err = OrchestratorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "travel" => Ok(Self::Travel),
            "customer_service" | "customer-service" => Ok(Self::CustomerService),
            "assistant" => Ok(Self::Assistant),
            other => Err(OrchestratorError::UnknownScenario(other.to_string())),
        }
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Travel => "travel",
            Self::CustomerService => "customer_service",
            Self::Assistant => "assistant",
        };
        f.write_str(s)
    }
}
