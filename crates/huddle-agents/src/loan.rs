//! Loan specialist.

use std::sync::Arc;

use async_trait::async_trait;
use huddle_bus::{handler, MessageHandler};
use huddle_models::{AgentCard, AgentId, Domain, MessageKind, MessagePayload, SpecialistResponse};
use tracing::{info, warn};

use crate::agent::{unexpected_payload, Agent};
use crate::chat::ChatMessage;
use crate::context::AgentContext;

/// Identity of the loan specialist.
pub const LOAN_AGENT_ID: &str = "loan_specialist_1";

const INSTRUCTIONS: &str = "You are a highly specialized loan expert at a bank. \
     You receive direct queries related to loans. \
     Provide accurate, concise, and helpful information about loans including interest rates, terms, and requirements. \
     You can discuss personal loans, car loans, home loans, and business loans. \
     Keep your responses to 2-3 sentences and focus purely on providing the requested loan information. \
     Do NOT attempt to act as a general customer service agent or ask follow-up questions to the customer. \
     Your goal is to provide the requested information so the customer service agent can relay it.";

/// Reply to a blank query.
pub const EMPTY_QUERY_REPLY: &str = "I received an empty query. Please provide more details.";

/// Reply when the pipeline fails.
pub const UNAVAILABLE_REPLY: &str =
    "I'm sorry, I couldn't retrieve the loan information right now. Please try again shortly.";

/// Background agent answering loan questions through its own pipeline.
pub struct LoanAgent {
    id: AgentId,
}

impl LoanAgent {
    pub fn new() -> Self {
        Self {
            id: AgentId::from(LOAN_AGENT_ID),
        }
    }
}

impl Default for LoanAgent {
    fn default() -> Self {
        Self::new()
    }
}

async fn answer(ctx: &AgentContext, instructions: &str, query: &str) -> String {
    if query.trim().is_empty() {
        return EMPTY_QUERY_REPLY.to_string();
    }
    let history = [ChatMessage::user(query)];
    match ctx.pipeline.respond(instructions, &history, &[]).await {
        Ok(reply) => match reply.text {
            Some(text) if !text.trim().is_empty() => text,
            _ => UNAVAILABLE_REPLY.to_string(),
        },
        Err(e) => {
            warn!(agent_id = %ctx.agent_id, error = %e, "loan pipeline failed");
            UNAVAILABLE_REPLY.to_string()
        }
    }
}

#[async_trait]
impl Agent for LoanAgent {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn card(&self) -> AgentCard {
        AgentCard::new(self.id.clone(), "Loan Specialist Agent", Domain::LOAN)
            .with_capabilities(["loan_consultation", "loan_information", "interest_rates"])
            .with_description("Handles loan queries and provides expert information")
    }

    fn instructions(&self) -> &str {
        INSTRUCTIONS
    }

    fn display_name(&self) -> &str {
        "Loan Specialist"
    }

    fn handlers(&self, ctx: &AgentContext) -> Vec<(MessageKind, MessageHandler)> {
        let ctx = ctx.clone();
        let instructions: Arc<str> = Arc::from(self.instructions());
        vec![(
            MessageKind::SpecialistQuery,
            handler(move |msg| {
                let ctx = ctx.clone();
                let instructions = Arc::clone(&instructions);
                async move {
                    let MessagePayload::SpecialistQuery(query) = &msg.payload else {
                        return Err(unexpected_payload(MessageKind::SpecialistQuery, &msg));
                    };
                    let requester = msg.reply_target();
                    info!(from = %requester, query = %query.query, "received specialist query");

                    let response = answer(&ctx, &instructions, &query.query).await;
                    ctx.send(requester, MessagePayload::SpecialistResponse(SpecialistResponse { response }));
                    Ok(())
                }
            }),
        )]
    }
}
