//! Single-agent voice assistant with optional knowledge retrieval.

use std::sync::Arc;

use async_trait::async_trait;
use huddle_models::{AgentCard, AgentId, Domain, MeetingConfig};

use crate::agent::{end_call, end_call_tool, primary_instructions, Agent};
use crate::context::AgentContext;
use crate::error::{AgentError, Result};
use crate::knowledge::KnowledgeRetriever;
use crate::tool::{ToolCall, ToolDefinition, ToolResult};

/// Identity of the assistant.
pub const ASSISTANT_ID: &str = "voice_agent";

const DEFAULT_INSTRUCTIONS: &str = "You are a helpful voice assistant. Answer questions clearly and \
     briefly. When context from the knowledge base is provided, base your answer on it.";

pub struct AssistantAgent {
    id: AgentId,
    instructions: String,
    retriever: Option<Arc<dyn KnowledgeRetriever>>,
}

impl AssistantAgent {
    pub fn new(meeting: &MeetingConfig) -> Self {
        Self {
            id: AgentId::from(ASSISTANT_ID),
            instructions: primary_instructions(
                meeting.system_prompt.as_deref(),
                meeting.behavior.personality.as_deref(),
                DEFAULT_INSTRUCTIONS,
            ),
            retriever: None,
        }
    }

    /// Consults `retriever` before every turn.
    pub fn with_retriever(mut self, retriever: Arc<dyn KnowledgeRetriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }
}

#[async_trait]
impl Agent for AssistantAgent {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn card(&self) -> AgentCard {
        AgentCard::new(self.id.clone(), "Voice Assistant", Domain::ASSISTANT)
            .with_capabilities(["conversation", "knowledge_lookup", "call_control"])
            .with_description("Answers questions in the meeting, using the knowledge base when available")
    }

    fn instructions(&self) -> &str {
        &self.instructions
    }

    fn display_name(&self) -> &str {
        "Assistant"
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        vec![end_call_tool()]
    }

    async fn on_enter(&self, ctx: &AgentContext) -> Result<()> {
        ctx.say("Hey, How can I help you today?").await;
        Ok(())
    }

    async fn on_exit(&self, ctx: &AgentContext) -> Result<()> {
        ctx.say("Goodbye!").await;
        Ok(())
    }

    async fn execute_tool(&self, call: &ToolCall, ctx: &AgentContext) -> Result<ToolResult> {
        match call.name.as_str() {
            "end_call" => Ok(end_call(call, ctx, "Goodbye!").await),
            other => Err(AgentError::ToolNotFound(other.to_string())),
        }
    }

    fn retriever(&self) -> Option<Arc<dyn KnowledgeRetriever>> {
        self.retriever.clone()
    }
}
