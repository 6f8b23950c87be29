//! Core Agent trait definition.
//!
//! An agent is a behavioural unit: instructions for its pipeline, a
//! handler table for agent-to-agent messages, lifecycle hooks and, for
//! user-facing agents, function tools the model can call. The session
//! that hosts an agent publishes its card and installs its handlers
//! before `on_enter` runs.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use huddle_bus::{BusError, HandlerError, MessageHandler};
use huddle_models::{A2AMessage, AgentCard, AgentId, MessageKind};

use crate::context::AgentContext;
use crate::error::{AgentError, Result};
use crate::knowledge::KnowledgeRetriever;
use crate::tool::{ToolCall, ToolDefinition, ToolResult};

/// Pause between the farewell and leaving the call.
pub const END_CALL_DELAY: Duration = Duration::from_secs(1);

/// Core trait for agents.
///
/// Object-safe so sessions can host any agent as `Arc<dyn Agent>`.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Identity used in the registry and as a message address.
    fn id(&self) -> &AgentId;

    /// Card published while the agent's session runs.
    fn card(&self) -> AgentCard;

    /// Instructions given to the pipeline.
    fn instructions(&self) -> &str;

    /// Name shown in the meeting room.
    fn display_name(&self) -> &str;

    /// Tools exposed to the model.
    fn tools(&self) -> Vec<ToolDefinition> {
        Vec::new()
    }

    /// Message handlers, one per kind. Built once per session.
    fn handlers(&self, _ctx: &AgentContext) -> Vec<(MessageKind, MessageHandler)> {
        Vec::new()
    }

    /// Called once the agent is registered.
    async fn on_enter(&self, _ctx: &AgentContext) -> Result<()> {
        Ok(())
    }

    /// Called when the session ends, before the agent is detached.
    async fn on_exit(&self, _ctx: &AgentContext) -> Result<()> {
        Ok(())
    }

    /// Runs a tool call made by the model.
    async fn execute_tool(&self, call: &ToolCall, _ctx: &AgentContext) -> Result<ToolResult> {
        Err(AgentError::ToolNotFound(call.name.clone()))
    }

    /// Knowledge consulted before each conversation turn.
    fn retriever(&self) -> Option<Arc<dyn KnowledgeRetriever>> {
        None
    }
}

/// Builds primary-agent instructions from the caller's prompt.
///
/// Falls back to `default` when no prompt was supplied and appends the
/// personality when one was given.
pub fn primary_instructions(system_prompt: Option<&str>, personality: Option<&str>, default: &str) -> String {
    let base = system_prompt
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(default);
    match personality.map(str::trim).filter(|p| !p.is_empty()) {
        Some(personality) => format!("{base}\n\nPersonality: {personality}"),
        None => base.to_string(),
    }
}

/// The `end_call` tool shared by user-facing agents.
pub fn end_call_tool() -> ToolDefinition {
    ToolDefinition::without_arguments("end_call", "End the call upon request by the user")
}

/// Says `farewell`, waits [`END_CALL_DELAY`] and stops the session.
pub async fn end_call(call: &ToolCall, ctx: &AgentContext, farewell: &str) -> ToolResult {
    tracing::info!(meeting_id = %ctx.meeting_id, agent_id = %ctx.agent_id, "user requested to end call");
    ctx.say(farewell).await;
    tokio::time::sleep(END_CALL_DELAY).await;
    ctx.request_stop();
    ToolResult::success(&call.id, serde_json::json!({"status": "ending"}))
}

/// Error for a handler that received the wrong payload.
pub fn unexpected_payload(expected: MessageKind, msg: &A2AMessage) -> HandlerError {
    Box::new(BusError::UnexpectedPayload {
        expected,
        actual: msg.kind(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_instructions() {
        assert_eq!(primary_instructions(None, None, "Default."), "Default.");
        assert_eq!(primary_instructions(Some("  "), None, "Default."), "Default.");
        assert_eq!(
            primary_instructions(Some("Be a travel agent."), Some("cheerful"), "Default."),
            "Be a travel agent.\n\nPersonality: cheerful"
        );
    }
}
