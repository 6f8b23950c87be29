//! Email automation specialist.

use async_trait::async_trait;
use huddle_bus::{handler, MessageHandler};
use huddle_models::{
    AgentCard, AgentId, Domain, EmailConfirmation, EmailRequest, EmailStatus, MessageKind, MessagePayload,
};
use tracing::{debug, info, warn};

use crate::agent::{unexpected_payload, Agent};
use crate::context::AgentContext;
use crate::travel::TRAVEL_AGENT_ID;

/// Identity of the email specialist.
pub const EMAIL_AGENT_ID: &str = "agent_email_001";

/// Background agent that "sends" booking emails and reports the outcome.
///
/// Delivery is simulated. A recipient without an `@` is reported as
/// failed.
pub struct EmailAgent {
    id: AgentId,
}

impl EmailAgent {
    pub fn new() -> Self {
        Self {
            id: AgentId::from(EMAIL_AGENT_ID),
        }
    }
}

impl Default for EmailAgent {
    fn default() -> Self {
        Self::new()
    }
}

/// "flight_options" -> "Flight Options".
fn title_case(email_type: &str) -> String {
    email_type
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn send_email(request: &EmailRequest) -> EmailStatus {
    let recipient = request.recipient.trim();
    if recipient.is_empty() || !recipient.contains('@') {
        warn!(recipient = %request.recipient, "invalid email recipient");
        return EmailStatus::Failed;
    }
    let preview: String = request.details.chars().take(100).collect();
    info!(
        email_type = %request.email_type,
        subject = %format!("Your {}", title_case(&request.email_type)),
        to = %recipient,
        "email sent"
    );
    debug!(content = %preview, "email body");
    EmailStatus::Sent
}

#[async_trait]
impl Agent for EmailAgent {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn card(&self) -> AgentCard {
        AgentCard::new(self.id.clone(), "Email Automation Service", Domain::EMAIL)
            .with_capabilities(["send_confirmations", "send_updates", "send_notifications"])
            .with_description("Handles all email communications and confirmations")
    }

    fn instructions(&self) -> &str {
        "You are an email automation specialist. You send booking confirmations, travel updates, and \
         important notifications to customers."
    }

    fn display_name(&self) -> &str {
        "Email Specialist"
    }

    fn handlers(&self, ctx: &AgentContext) -> Vec<(MessageKind, MessageHandler)> {
        let ctx = ctx.clone();
        vec![(
            MessageKind::SendBookingEmail,
            handler(move |msg| {
                let ctx = ctx.clone();
                async move {
                    let MessagePayload::SendBookingEmail(request) = &msg.payload else {
                        return Err(unexpected_payload(MessageKind::SendBookingEmail, &msg));
                    };
                    let status = send_email(request);
                    let notify = request
                        .notify
                        .clone()
                        .unwrap_or_else(|| AgentId::from(TRAVEL_AGENT_ID));
                    ctx.send(
                        &notify,
                        MessagePayload::EmailConfirmation(EmailConfirmation {
                            status,
                            email_type: request.email_type.clone(),
                            recipient: request.recipient.clone(),
                        }),
                    );
                    Ok(())
                }
            }),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{background_ctx, recorder};
    use huddle_bus::A2ABus;
    use std::time::Duration;

    fn request(recipient: &str, notify: Option<&str>) -> MessagePayload {
        MessagePayload::SendBookingEmail(EmailRequest {
            email_type: "flight_options".into(),
            details: "Three flights.".into(),
            recipient: recipient.into(),
            notify: notify.map(AgentId::from),
        })
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("flight_options"), "Flight Options");
        assert_eq!(title_case("HOTEL__options"), "Hotel Options");
    }

    #[tokio::test]
    async fn test_confirms_to_notify_target_or_travel_agent() {
        let bus = A2ABus::default();
        let agent = EmailAgent::new();
        let (ctx, _) = background_ctx(&bus, EMAIL_AGENT_ID);
        bus.register(agent.card());
        for (kind, h) in agent.handlers(&ctx) {
            bus.on_message(agent.id(), kind, h);
        }
        let travel = recorder(&bus, TRAVEL_AGENT_ID, Domain::TRAVEL, &[MessageKind::EmailConfirmation]);
        let other = recorder(&bus, "customer_service_1", Domain::CUSTOMER_SERVICE, &[MessageKind::EmailConfirmation]);

        bus.send(&"agent_flight_001".into(), agent.id(), request("ana@example.com", None));
        bus.send(&"agent_flight_001".into(), agent.id(), request("not-an-address", Some("customer_service_1")));
        tokio::time::sleep(Duration::from_millis(20)).await;

        let travel = travel.lock().unwrap();
        let MessagePayload::EmailConfirmation(sent) = &travel[0].payload else {
            panic!("unexpected payload");
        };
        assert_eq!(sent.status, EmailStatus::Sent);
        assert_eq!(sent.recipient, "ana@example.com");

        let other = other.lock().unwrap();
        let MessagePayload::EmailConfirmation(failed) = &other[0].payload else {
            panic!("unexpected payload");
        };
        assert_eq!(failed.status, EmailStatus::Failed);
    }
}
