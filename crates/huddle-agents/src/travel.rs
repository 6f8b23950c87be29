//! Travel coordinator: the primary of the travel scenario.

use std::time::Duration;

use async_trait::async_trait;
use huddle_bus::{handler, MessageHandler};
use huddle_models::{
    AgentCard, AgentId, Domain, EmailStatus, MeetingConfig, MessageKind, MessagePayload, SearchQuery,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::agent::{end_call, end_call_tool, primary_instructions, unexpected_payload, Agent};
use crate::context::AgentContext;
use crate::error::{AgentError, Result};
use crate::tool::{ToolCall, ToolDefinition, ToolResult};

/// Identity of the travel coordinator.
pub const TRAVEL_AGENT_ID: &str = "travel_agent_1";

const DEFAULT_INSTRUCTIONS: &str = "You are a friendly travel agent. Help the customer plan a trip. \
     Ask where and when they want to travel and for their email address, then use \
     book_travel_package to search flights and hotels. Relay the options you receive and keep \
     answers short.";

const GREETING: &str = "Hello! I'm your travel agent. I can help you book flights, hotels, and send you \
     confirmation emails. Where would you like to travel?";

const FAREWELL: &str = "Thank you for choosing our travel services. Have a great trip!";

/// Pause before the greeting.
pub const GREETING_DELAY: Duration = Duration::from_millis(500);

/// Pause before relaying a specialist response.
pub const RELAY_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Deserialize)]
struct BookTravelArgs {
    destination: String,
    #[serde(default)]
    travel_dates: String,
    #[serde(default)]
    email: Option<String>,
}

/// The user-facing travel agent.
pub struct TravelAgent {
    id: AgentId,
    instructions: String,
}

impl TravelAgent {
    pub fn new(meeting: &MeetingConfig) -> Self {
        Self {
            id: AgentId::from(TRAVEL_AGENT_ID),
            instructions: primary_instructions(
                meeting.system_prompt.as_deref(),
                meeting.behavior.personality.as_deref(),
                DEFAULT_INSTRUCTIONS,
            ),
        }
    }

    async fn book_travel_package(&self, call: &ToolCall, ctx: &AgentContext) -> Result<ToolResult> {
        let args: BookTravelArgs = call.parse_arguments()?;
        info!(
            meeting_id = %ctx.meeting_id,
            destination = %args.destination,
            "processing travel package booking"
        );

        ctx.say(&format!(
            "Let me search for travel options to {}. Please wait a moment while I connect to our booking services...",
            args.destination
        ))
        .await;

        let flight = Domain::new(Domain::FLIGHT);
        let hotel = Domain::new(Domain::HOTEL);
        let outcome = ctx
            .bus
            .discovery()
            .discover_all(&[flight.clone(), hotel.clone()])
            .await;
        debug!(attempts = outcome.attempts, complete = outcome.is_complete(), "specialist lookup finished");

        let Some(flight_agent) = outcome.first(&flight).cloned() else {
            ctx.say("I'm sorry, our flight booking service is temporarily unavailable. Please try again in a moment.")
                .await;
            return Ok(ToolResult::error(&call.id, "No flight agent available"));
        };
        let Some(hotel_agent) = outcome.first(&hotel).cloned() else {
            ctx.say("I'm sorry, our hotel booking service is temporarily unavailable. Please try again in a moment.")
                .await;
            return Ok(ToolResult::error(&call.id, "No hotel agent available"));
        };

        ctx.say(&format!(
            "Great! I've connected to our booking services. Searching for flights and hotels for {}...",
            args.destination
        ))
        .await;

        let query = SearchQuery {
            destination: args.destination.clone(),
            dates: args.travel_dates,
            customer_email: args.email,
            from_agent_id: Some(self.id.clone()),
        };
        for (to, payload) in [
            (&flight_agent, MessagePayload::FlightSearchQuery(query.clone())),
            (&hotel_agent, MessagePayload::HotelSearchQuery(query)),
        ] {
            let kind = payload.kind();
            let delivery = ctx.send(to, payload);
            if !delivery.is_queued() {
                warn!(to = %to, kind = %kind, delivery = ?delivery, "search query not delivered");
            }
        }

        Ok(ToolResult::success(
            &call.id,
            json!({
                "status": "processing",
                "message": format!("Searching for travel options to {}...", args.destination),
            }),
        ))
    }
}

fn relay_booking(ctx: AgentContext, kind: MessageKind, prefix: &'static str) -> MessageHandler {
    handler(move |msg| {
        let ctx = ctx.clone();
        async move {
            let response = match &msg.payload {
                MessagePayload::FlightBookingResponse(r) | MessagePayload::HotelBookingResponse(r)
                    if msg.kind() == kind =>
                {
                    r.response.clone()
                }
                _ => return Err(unexpected_payload(kind, &msg)),
            };
            if response.is_empty() {
                return Ok(());
            }
            info!(from = %msg.from, kind = %kind, "received booking response");
            tokio::time::sleep(RELAY_DELAY).await;
            ctx.say(&format!("{prefix}: {response}")).await;
            Ok(())
        }
    })
}

fn email_confirmation(ctx: AgentContext) -> MessageHandler {
    handler(move |msg| {
        let ctx = ctx.clone();
        async move {
            let MessagePayload::EmailConfirmation(confirmation) = &msg.payload else {
                return Err(unexpected_payload(MessageKind::EmailConfirmation, &msg));
            };
            let email_type = confirmation.email_type.replace('_', " ");
            let text = match confirmation.status {
                EmailStatus::Sent => {
                    format!("I've sent you a {email_type} confirmation email. Please check your inbox.")
                }
                EmailStatus::Failed => {
                    format!("I had trouble sending the {email_type} email, but I've recorded your booking details.")
                }
            };
            ctx.say(&text).await;
            Ok(())
        }
    })
}

#[async_trait]
impl Agent for TravelAgent {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn card(&self) -> AgentCard {
        AgentCard::new(self.id.clone(), "Travel Coordinator", Domain::TRAVEL)
            .with_capabilities(["travel_planning", "booking_coordination", "customer_service"])
            .with_description("Main travel agent that coordinates bookings and customer communication")
    }

    fn instructions(&self) -> &str {
        &self.instructions
    }

    fn display_name(&self) -> &str {
        "Travel Agent"
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::with_string_args(
                "book_travel_package",
                "Book a complete travel package including flights and hotels",
                &[
                    ("destination", "Where the customer wants to travel"),
                    ("travel_dates", "When they want to travel"),
                    ("email", "Customer email for confirmations"),
                ],
            ),
            end_call_tool(),
        ]
    }

    fn handlers(&self, ctx: &AgentContext) -> Vec<(MessageKind, MessageHandler)> {
        vec![
            (
                MessageKind::FlightBookingResponse,
                relay_booking(ctx.clone(), MessageKind::FlightBookingResponse, "Flight update"),
            ),
            (
                MessageKind::HotelBookingResponse,
                relay_booking(ctx.clone(), MessageKind::HotelBookingResponse, "Hotel update"),
            ),
            (MessageKind::EmailConfirmation, email_confirmation(ctx.clone())),
        ]
    }

    async fn on_enter(&self, ctx: &AgentContext) -> Result<()> {
        tokio::time::sleep(GREETING_DELAY).await;
        ctx.say(GREETING).await;
        Ok(())
    }

    async fn execute_tool(&self, call: &ToolCall, ctx: &AgentContext) -> Result<ToolResult> {
        match call.name.as_str() {
            "book_travel_package" => self.book_travel_package(call, ctx).await,
            "end_call" => Ok(end_call(call, ctx, FAREWELL).await),
            other => Err(AgentError::ToolNotFound(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{recorder, user_facing_ctx};
    use huddle_bus::{A2ABus, DiscoveryPolicy};
    use huddle_models::{BookingDetails, BookingResponse, EmailConfirmation};
    use tokio::time::Instant;

    fn agent() -> TravelAgent {
        TravelAgent::new(&MeetingConfig::new("meet-123", "tok"))
    }

    fn book_call() -> ToolCall {
        ToolCall::with_id(
            "1",
            "book_travel_package",
            json!({"destination": "Lisbon", "travel_dates": "May 3-10", "email": "ana@example.com"}),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_book_sends_both_queries() {
        let bus = A2ABus::new(DiscoveryPolicy::default());
        let flights = recorder(&bus, "agent_flight_001", Domain::FLIGHT, &[MessageKind::FlightSearchQuery]);
        let hotels = recorder(&bus, "agent_hotel_001", Domain::HOTEL, &[MessageKind::HotelSearchQuery]);
        let (ctx, room) = user_facing_ctx(&bus, TRAVEL_AGENT_ID).await;

        let result = agent().execute_tool(&book_call(), &ctx).await.unwrap();
        assert!(!result.is_error);
        assert_eq!(result.content["status"], "processing");

        tokio::time::sleep(Duration::from_millis(10)).await;
        let flights = flights.lock().unwrap();
        assert_eq!(flights.len(), 1);
        let MessagePayload::FlightSearchQuery(query) = &flights[0].payload else {
            panic!("unexpected payload");
        };
        assert_eq!(query.destination, "Lisbon");
        assert_eq!(query.customer_email.as_deref(), Some("ana@example.com"));
        assert_eq!(query.from_agent_id, Some(AgentId::from(TRAVEL_AGENT_ID)));
        assert_eq!(hotels.lock().unwrap().len(), 1);

        let spoken = room.spoken();
        assert_eq!(spoken.len(), 2);
        assert!(spoken[1].starts_with("Great! I've connected to our booking services."));
    }

    #[tokio::test(start_paused = true)]
    async fn test_book_without_hotel_is_unavailable() {
        let bus = A2ABus::new(DiscoveryPolicy::default());
        let flights = recorder(&bus, "agent_flight_001", Domain::FLIGHT, &[MessageKind::FlightSearchQuery]);
        let (ctx, room) = user_facing_ctx(&bus, TRAVEL_AGENT_ID).await;

        let start = Instant::now();
        let result = agent().execute_tool(&book_call(), &ctx).await.unwrap();
        assert!(result.is_error);
        assert_eq!(result.content, json!({"error": "No hotel agent available"}));
        // Three lookups, two pauses.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(4) && elapsed < Duration::from_secs(5));

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(flights.lock().unwrap().is_empty());
        assert!(room.spoken()[1].contains("hotel booking service is temporarily unavailable"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_relays_responses_and_confirmation() {
        let bus = A2ABus::default();
        let agent = agent();
        let (ctx, room) = user_facing_ctx(&bus, TRAVEL_AGENT_ID).await;
        bus.register(agent.card());
        for (kind, h) in agent.handlers(&ctx) {
            bus.on_message(agent.id(), kind, h);
        }

        let details = BookingDetails {
            service: "flight".into(),
            status: "options_available".into(),
            destination: "Lisbon".into(),
            dates: "May 3-10".into(),
        };
        bus.send(
            &"agent_flight_001".into(),
            agent.id(),
            MessagePayload::FlightBookingResponse(BookingResponse {
                response: "Three flights found.".into(),
                booking_details: Some(details),
            }),
        );
        bus.send(
            &"agent_email_001".into(),
            agent.id(),
            MessagePayload::EmailConfirmation(EmailConfirmation {
                status: EmailStatus::Sent,
                email_type: "flight_options".into(),
                recipient: "ana@example.com".into(),
            }),
        );

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(
            room.spoken(),
            vec![
                "Flight update: Three flights found.".to_string(),
                "I've sent you a flight options confirmation email. Please check your inbox.".to_string(),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_call_stops_session() {
        let bus = A2ABus::default();
        let (ctx, room) = user_facing_ctx(&bus, TRAVEL_AGENT_ID).await;

        let call = ToolCall::with_id("2", "end_call", json!({}));
        agent().execute_tool(&call, &ctx).await.unwrap();
        assert!(ctx.stop.is_stopped());
        assert_eq!(room.spoken(), vec![FAREWELL.to_string()]);

        let unknown = ToolCall::with_id("3", "fly_me", json!({}));
        assert!(matches!(
            agent().execute_tool(&unknown, &ctx).await,
            Err(AgentError::ToolNotFound(_))
        ));
    }

    #[test]
    fn test_instructions_use_prompt() {
        let meeting = MeetingConfig::new("meet-123", "tok").with_system_prompt("Only book Europe.");
        assert_eq!(TravelAgent::new(&meeting).instructions(), "Only book Europe.");
        assert!(agent().instructions().starts_with("You are a friendly travel agent."));
    }
}
