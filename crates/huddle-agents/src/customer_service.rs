//! Customer-service primary that forwards questions to domain specialists.

use std::time::Duration;

use async_trait::async_trait;
use huddle_bus::{handler, MessageHandler};
use huddle_models::{AgentCard, AgentId, Domain, MeetingConfig, MessageKind, MessagePayload, SpecialistQuery};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::agent::{end_call, end_call_tool, primary_instructions, unexpected_payload, Agent};
use crate::context::AgentContext;
use crate::error::{AgentError, Result};
use crate::tool::{ToolCall, ToolDefinition, ToolResult};

/// Identity of the customer-service agent.
pub const CUSTOMER_SERVICE_ID: &str = "customer_service_1";

const DEFAULT_INSTRUCTIONS: &str = "You are a helpful bank customer service agent. Answer general \
     questions yourself. For loan questions use forward_to_specialist with domain 'loan' and relay \
     the answer. Keep replies brief.";

const GREETING: &str = "Hello! I am your customer service agent. How can I help you today?";

/// Pause before speaking a specialist's answer.
pub const RELAY_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Deserialize)]
struct ForwardArgs {
    query: String,
    domain: String,
}

/// The user-facing customer-service agent.
pub struct CustomerServiceAgent {
    id: AgentId,
    instructions: String,
}

impl CustomerServiceAgent {
    pub fn new(meeting: &MeetingConfig) -> Self {
        Self {
            id: AgentId::from(CUSTOMER_SERVICE_ID),
            instructions: primary_instructions(
                meeting.system_prompt.as_deref(),
                meeting.behavior.personality.as_deref(),
                DEFAULT_INSTRUCTIONS,
            ),
        }
    }

    async fn forward_to_specialist(&self, call: &ToolCall, ctx: &AgentContext) -> Result<ToolResult> {
        let args: ForwardArgs = call.parse_arguments()?;
        let domain = Domain::new(args.domain.trim());
        info!(
            meeting_id = %ctx.meeting_id,
            domain = %domain,
            query = %args.query,
            "forwarding query to specialist"
        );

        let specialists = ctx.bus.discovery().discover(&domain).await;
        let Some(target) = specialists.first() else {
            warn!(domain = %domain, "no specialist found");
            ctx.say(&format!(
                "I'm sorry, I cannot find a specialist for {domain} at the moment. Can I help with anything else?"
            ))
            .await;
            return Ok(ToolResult::error(
                &call.id,
                format!("no specialist found for domain {domain}"),
            ));
        };

        ctx.send(
            target,
            MessagePayload::SpecialistQuery(SpecialistQuery {
                query: args.query,
                from_agent_id: Some(self.id.clone()),
            }),
        );
        let message = format!("Let me get that information for you from our {domain} specialist...");
        ctx.say(&message).await;
        Ok(ToolResult::success(
            &call.id,
            json!({
                "status": "forwarded",
                "specialist": target.as_str(),
                "message": message,
            }),
        ))
    }
}

#[async_trait]
impl Agent for CustomerServiceAgent {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn card(&self) -> AgentCard {
        AgentCard::new(self.id.clone(), "Customer Service Agent", Domain::CUSTOMER_SERVICE)
            .with_capabilities(["query_handling", "specialist_coordination", "call_control"])
            .with_description("Handles general customer queries and coordinates with specialists")
    }

    fn instructions(&self) -> &str {
        &self.instructions
    }

    fn display_name(&self) -> &str {
        "Customer Service Assistant"
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::with_string_args(
                "forward_to_specialist",
                "Forwards a user query to a specialized agent based on domain",
                &[
                    ("query", "The user's query that needs specialist attention"),
                    ("domain", "The domain of the specialist (e.g., 'loan')"),
                ],
            ),
            end_call_tool(),
        ]
    }

    fn handlers(&self, ctx: &AgentContext) -> Vec<(MessageKind, MessageHandler)> {
        let ctx = ctx.clone();
        vec![(
            MessageKind::SpecialistResponse,
            handler(move |msg| {
                let ctx = ctx.clone();
                async move {
                    let MessagePayload::SpecialistResponse(reply) = &msg.payload else {
                        return Err(unexpected_payload(MessageKind::SpecialistResponse, &msg));
                    };
                    if reply.response.is_empty() {
                        warn!(from = %msg.from, "received empty specialist response");
                        return Ok(());
                    }
                    info!(
                        from = %msg.from,
                        domain = msg.sender_domain().unwrap_or("specialist"),
                        "received specialist response"
                    );
                    tokio::time::sleep(RELAY_DELAY).await;
                    ctx.say(&reply.response).await;
                    Ok(())
                }
            }),
        )]
    }

    async fn on_enter(&self, ctx: &AgentContext) -> Result<()> {
        ctx.say(GREETING).await;
        Ok(())
    }

    async fn execute_tool(&self, call: &ToolCall, ctx: &AgentContext) -> Result<ToolResult> {
        match call.name.as_str() {
            "forward_to_specialist" => self.forward_to_specialist(call, ctx).await,
            "end_call" => Ok(end_call(call, ctx, "Goodbye!").await),
            other => Err(AgentError::ToolNotFound(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{recorder, user_facing_ctx};
    use huddle_bus::A2ABus;
    use huddle_models::SpecialistResponse;

    fn agent() -> CustomerServiceAgent {
        CustomerServiceAgent::new(&MeetingConfig::new("meet-123", "tok"))
    }

    fn forward(domain: &str) -> ToolCall {
        ToolCall::with_id(
            "1",
            "forward_to_specialist",
            json!({"query": "What are car loan rates?", "domain": domain}),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_forward_sends_query() {
        let bus = A2ABus::default();
        let loan = recorder(&bus, "loan_specialist_1", Domain::LOAN, &[MessageKind::SpecialistQuery]);
        let (ctx, room) = user_facing_ctx(&bus, CUSTOMER_SERVICE_ID).await;

        let result = agent().execute_tool(&forward("loan"), &ctx).await.unwrap();
        assert_eq!(result.content["status"], "forwarded");
        assert_eq!(result.content["specialist"], "loan_specialist_1");
        assert_eq!(
            room.spoken(),
            vec!["Let me get that information for you from our loan specialist...".to_string()]
        );

        tokio::time::sleep(Duration::from_millis(10)).await;
        let loan = loan.lock().unwrap();
        let MessagePayload::SpecialistQuery(query) = &loan[0].payload else {
            panic!("unexpected payload");
        };
        assert_eq!(query.query, "What are car loan rates?");
        assert_eq!(query.from_agent_id, Some(AgentId::from(CUSTOMER_SERVICE_ID)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_forward_to_unknown_domain() {
        let bus = A2ABus::default();
        let (ctx, room) = user_facing_ctx(&bus, CUSTOMER_SERVICE_ID).await;

        let result = agent().execute_tool(&forward("mortgage"), &ctx).await.unwrap();
        assert!(result.is_error);
        assert_eq!(result.content, json!({"error": "no specialist found for domain mortgage"}));
        assert!(room.spoken()[0].starts_with("I'm sorry, I cannot find a specialist for mortgage"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_speaks_specialist_response() {
        let bus = A2ABus::default();
        let agent = agent();
        let (ctx, room) = user_facing_ctx(&bus, CUSTOMER_SERVICE_ID).await;
        bus.register(agent.card());
        for (kind, h) in agent.handlers(&ctx) {
            bus.on_message(agent.id(), kind, h);
        }

        bus.send(
            &"loan_specialist_1".into(),
            agent.id(),
            MessagePayload::SpecialistResponse(SpecialistResponse {
                response: "Car loans start at 5.9% APR.".into(),
            }),
        );
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(room.spoken(), vec!["Car loans start at 5.9% APR.".to_string()]);
    }

    #[tokio::test]
    async fn test_greets_on_enter() {
        let bus = A2ABus::default();
        let (ctx, room) = user_facing_ctx(&bus, CUSTOMER_SERVICE_ID).await;
        agent().on_enter(&ctx).await.unwrap();
        assert_eq!(room.spoken(), vec![GREETING.to_string()]);
    }
}
