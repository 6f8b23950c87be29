//! Turn handling for user-facing agents.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::agent::Agent;
use crate::chat::ChatMessage;
use crate::context::AgentContext;
use crate::knowledge::{search_knowledge, DEFAULT_MAX_RESULTS};
use crate::tool::ToolResult;

/// Maximum pipeline rounds per user turn.
pub const MAX_TOOL_ITERATIONS: usize = 5;

/// Spoken when the pipeline fails.
pub const PIPELINE_APOLOGY: &str = "I'm sorry, I'm having trouble responding right now.";

/// Trims and lowercases a transcript.
pub fn normalize_transcript(transcript: &str) -> String {
    transcript.trim().to_lowercase()
}

/// Owns the conversation history of one user-facing session.
pub struct ConversationFlow {
    agent: Arc<dyn Agent>,
    ctx: AgentContext,
    history: Vec<ChatMessage>,
}

impl ConversationFlow {
    pub fn new(agent: Arc<dyn Agent>, ctx: AgentContext) -> Self {
        Self {
            agent,
            ctx,
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Handles one user utterance and returns the text spoken in reply.
    ///
    /// Collaborator failures are converted to an apology; nothing here
    /// returns an error to the session.
    pub async fn handle_utterance(&mut self, transcript: &str) -> Option<String> {
        let processed = normalize_transcript(transcript);
        if processed.is_empty() {
            return None;
        }

        if let Some(retriever) = self.agent.retriever() {
            let context = search_knowledge(&retriever, &processed, DEFAULT_MAX_RESULTS).await;
            if !context.is_empty() {
                self.history
                    .push(ChatMessage::system(format!("Context from knowledge base: {context}")));
            }
        }
        self.history.push(ChatMessage::user(&processed));

        let tools = self.agent.tools();
        for iteration in 0..MAX_TOOL_ITERATIONS {
            if self.ctx.stop.is_stopped() {
                return None;
            }

            let reply = match self
                .ctx
                .pipeline
                .respond(self.agent.instructions(), &self.history, &tools)
                .await
            {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(
                        meeting_id = %self.ctx.meeting_id,
                        agent_id = %self.ctx.agent_id,
                        error = %e,
                        "pipeline failed"
                    );
                    self.ctx.say(PIPELINE_APOLOGY).await;
                    self.history.push(ChatMessage::assistant(PIPELINE_APOLOGY));
                    return Some(PIPELINE_APOLOGY.to_string());
                }
            };

            if !reply.has_tool_calls() {
                let text = reply.text.unwrap_or_default();
                if !text.is_empty() {
                    self.ctx.say(&text).await;
                    self.history.push(ChatMessage::assistant(&text));
                }
                return Some(text);
            }

            let text = reply.text.unwrap_or_default();
            if !text.is_empty() {
                self.ctx.say(&text).await;
            }
            self.history
                .push(ChatMessage::assistant_with_tools(text, reply.tool_calls.clone()));

            for call in &reply.tool_calls {
                debug!(
                    agent_id = %self.ctx.agent_id,
                    tool = %call.name,
                    iteration,
                    "executing tool"
                );
                let result = match self.agent.execute_tool(call, &self.ctx).await {
                    Ok(result) => result,
                    Err(e) => {
                        warn!(agent_id = %self.ctx.agent_id, tool = %call.name, error = %e, "tool failed");
                        ToolResult::error(&call.id, e.to_string())
                    }
                };
                self.history.push(ChatMessage::tool(&call.name, result));
            }
        }

        warn!(
            agent_id = %self.ctx.agent_id,
            max = MAX_TOOL_ITERATIONS,
            "tool loop limit reached"
        );
        None
    }
}
