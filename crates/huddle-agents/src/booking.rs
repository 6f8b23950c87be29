//! Flight and hotel search specialists.
//!
//! Both answer a search query with three canned options, reply to the
//! requester and then ask the email specialist to mail the options. The
//! email lookup is a single registry read; a missing email specialist
//! only skips the email.

use async_trait::async_trait;
use huddle_bus::{handler, MessageHandler};
use huddle_models::{
    AgentCard, AgentId, BookingDetails, BookingResponse, Domain, EmailRequest, MessageKind, MessagePayload,
    SearchQuery,
};
use tracing::{debug, info, warn};

use crate::agent::{unexpected_payload, Agent};
use crate::context::AgentContext;

/// Recipient used when the query carried no customer email.
pub const FALLBACK_RECIPIENT: &str = "customer@example.com";

/// What a [`BookingSpecialist`] searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingService {
    Flight,
    Hotel,
}

impl BookingService {
    /// Registry identity of the specialist.
    pub fn agent_id(&self) -> &'static str {
        match self {
            Self::Flight => "agent_flight_001",
            Self::Hotel => "agent_hotel_001",
        }
    }

    pub fn domain(&self) -> &'static str {
        match self {
            Self::Flight => Domain::FLIGHT,
            Self::Hotel => Domain::HOTEL,
        }
    }

    /// Kind of query this service answers.
    pub fn query_kind(&self) -> MessageKind {
        match self {
            Self::Flight => MessageKind::FlightSearchQuery,
            Self::Hotel => MessageKind::HotelSearchQuery,
        }
    }

    fn email_type(&self) -> &'static str {
        match self {
            Self::Flight => "flight_options",
            Self::Hotel => "hotel_options",
        }
    }

    fn response_payload(&self, response: BookingResponse) -> MessagePayload {
        match self {
            Self::Flight => MessagePayload::FlightBookingResponse(response),
            Self::Hotel => MessagePayload::HotelBookingResponse(response),
        }
    }

    /// Canned options text for a search.
    pub fn options(&self, destination: &str, dates: &str) -> String {
        match self {
            Self::Flight => format!(
                "I found several flight options to {destination} for {dates}:\n\n\
                 ✈️ Option 1: Direct flight - $299\n   Departure: 8:00 AM, Arrival: 11:30 AM\n   Airline: SkyWings Airways\n\n\
                 ✈️ Option 2: Economy Plus - $399\n   Departure: 2:15 PM, Arrival: 5:45 PM\n   Airline: CloudJet Airlines\n\n\
                 ✈️ Option 3: Premium Economy - $549\n   Departure: 6:30 PM, Arrival: 10:00 PM\n   Airline: AeroLink Express\n\n\
                 All flights include complimentary snacks and beverages. \
                 Would you like me to proceed with booking one of these options?"
            ),
            Self::Hotel => format!(
                "I found excellent hotel options in {destination} for {dates}:\n\n\
                 🏨 Option 1: Grand Plaza Hotel (4⭐) - $180/night\n   • Free WiFi, Pool, Gym, Restaurant\n   • Downtown location, 5-min walk to attractions\n\n\
                 🏨 Option 2: Comfort Inn & Suites (3⭐) - $120/night\n   • Free breakfast, WiFi, Parking\n   • Business center, Airport shuttle\n\n\
                 🏨 Option 3: Luxury Resort & Spa (5⭐) - $350/night\n   • Full-service spa, Pool, Beach access\n   • Multiple restaurants, Concierge service\n\n\
                 All hotels offer 24/7 front desk and room service. \
                 Which option would you prefer for your stay?"
            ),
        }
    }
}

impl std::fmt::Display for BookingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.domain())
    }
}

/// Background specialist for one [`BookingService`].
pub struct BookingSpecialist {
    service: BookingService,
    id: AgentId,
}

impl BookingSpecialist {
    pub fn new(service: BookingService) -> Self {
        Self {
            service,
            id: AgentId::from(service.agent_id()),
        }
    }

    pub fn flight() -> Self {
        Self::new(BookingService::Flight)
    }

    pub fn hotel() -> Self {
        Self::new(BookingService::Hotel)
    }

    pub fn service(&self) -> BookingService {
        self.service
    }
}

async fn answer_search(service: BookingService, ctx: &AgentContext, query: &SearchQuery, requester: &AgentId) {
    if query.destination.trim().is_empty() {
        warn!(agent_id = %ctx.agent_id, from = %requester, "received empty search query");
        return;
    }
    info!(
        agent_id = %ctx.agent_id,
        destination = %query.destination,
        from = %requester,
        "received search query"
    );

    let options = service.options(&query.destination, &query.dates);
    let response = BookingResponse {
        response: options.clone(),
        booking_details: Some(BookingDetails {
            service: service.domain().to_string(),
            status: "options_available".to_string(),
            destination: query.destination.clone(),
            dates: query.dates.clone(),
        }),
    };
    ctx.send(requester, service.response_payload(response));

    let email_agents = ctx.bus.registry().find_by_domain(&Domain::new(Domain::EMAIL));
    let Some(email_agent) = email_agents.first() else {
        debug!(agent_id = %ctx.agent_id, "no email specialist registered, skipping email");
        return;
    };
    ctx.send(
        email_agent,
        MessagePayload::SendBookingEmail(EmailRequest {
            email_type: service.email_type().to_string(),
            details: options,
            recipient: query
                .customer_email
                .clone()
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| FALLBACK_RECIPIENT.to_string()),
            notify: Some(requester.clone()),
        }),
    );
}

#[async_trait]
impl Agent for BookingSpecialist {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn card(&self) -> AgentCard {
        match self.service {
            BookingService::Flight => AgentCard::new(self.id.clone(), "Skymate", Domain::FLIGHT)
                .with_capabilities(["search_flights", "modify_bookings", "show_flight_status"])
                .with_description("Handles all flight-related tasks"),
            BookingService::Hotel => AgentCard::new(self.id.clone(), "Hotel Booking Specialist", Domain::HOTEL)
                .with_capabilities(["search_hotels", "modify_reservations", "check_availability"])
                .with_description("Handles all hotel-related tasks"),
        }
    }

    fn instructions(&self) -> &str {
        match self.service {
            BookingService::Flight => {
                "You are Skymate, a specialized flight booking expert. You help customers find and book \
                 flights to their destinations. Provide detailed flight information including times, prices, \
                 and airlines. Keep responses concise and professional."
            }
            BookingService::Hotel => {
                "You are a specialized hotel booking expert. You help customers find and book hotels at \
                 their destinations. Provide detailed hotel information including amenities, prices, and \
                 locations. Keep responses helpful and concise."
            }
        }
    }

    fn display_name(&self) -> &str {
        match self.service {
            BookingService::Flight => "Flight Specialist",
            BookingService::Hotel => "Hotel Specialist",
        }
    }

    fn handlers(&self, ctx: &AgentContext) -> Vec<(MessageKind, MessageHandler)> {
        let service = self.service;
        let kind = service.query_kind();
        let ctx = ctx.clone();
        vec![(
            kind,
            handler(move |msg| {
                let ctx = ctx.clone();
                async move {
                    let query = match &msg.payload {
                        MessagePayload::FlightSearchQuery(q) | MessagePayload::HotelSearchQuery(q)
                            if msg.kind() == kind =>
                        {
                            q
                        }
                        _ => return Err(unexpected_payload(kind, &msg)),
                    };
                    answer_search(service, &ctx, query, msg.reply_target()).await;
                    Ok(())
                }
            }),
        )]
    }
}
