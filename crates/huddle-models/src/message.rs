//! Agent-to-agent (A2A) messages.
//!
//! Every message is one-way and point-to-point. The payload is a tagged
//! union keyed by [`MessageKind`]; each kind has exactly one payload shape,
//! so handlers validate shape by matching on the variant they expect.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::card::AgentCard;
use crate::ids::{AgentId, MessageId};

/// The type selector of a message. Handlers are installed per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Primary → flight specialist.
    FlightSearchQuery,
    /// Primary → hotel specialist.
    HotelSearchQuery,
    /// Flight specialist → primary.
    FlightBookingResponse,
    /// Hotel specialist → primary.
    HotelBookingResponse,
    /// Specialist → email specialist.
    SendBookingEmail,
    /// Email specialist → primary.
    EmailConfirmation,
    /// Primary → any domain specialist.
    SpecialistQuery,
    /// Domain specialist → primary.
    SpecialistResponse,
}

impl MessageKind {
    /// All kinds, in declaration order.
    pub const ALL: [MessageKind; 8] = [
        MessageKind::FlightSearchQuery,
        MessageKind::HotelSearchQuery,
        MessageKind::FlightBookingResponse,
        MessageKind::HotelBookingResponse,
        MessageKind::SendBookingEmail,
        MessageKind::EmailConfirmation,
        MessageKind::SpecialistQuery,
        MessageKind::SpecialistResponse,
    ];

    /// Wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FlightSearchQuery => "flight_search_query",
            Self::HotelSearchQuery => "hotel_search_query",
            Self::FlightBookingResponse => "flight_booking_response",
            Self::HotelBookingResponse => "hotel_booking_response",
            Self::SendBookingEmail => "send_booking_email",
            Self::EmailConfirmation => "email_confirmation",
            Self::SpecialistQuery => "specialist_query",
            Self::SpecialistResponse => "specialist_response",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unrecognised message kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown message kind: {0}")]
pub struct UnknownMessageKind(pub String);

impl FromStr for MessageKind {
    type Err = UnknownMessageKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownMessageKind(s.to_string()))
    }
}

/// Search request sent to a flight or hotel specialist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Where the customer wants to travel.
    pub destination: String,
    /// When they want to travel (free text).
    pub dates: String,
    /// Customer email for confirmations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    /// Agent that should receive the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_agent_id: Option<AgentId>,
}

/// Structured part of a booking response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDetails {
    /// "flight" or "hotel".
    pub service: String,
    /// e.g. "options_available".
    pub status: String,
    /// Destination the options are for.
    pub destination: String,
    /// Travel dates the options are for.
    pub dates: String,
}

/// Specialist answer to a search query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingResponse {
    /// Human-readable options text.
    pub response: String,
    /// Structured booking details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_details: Option<BookingDetails>,
}

/// Request for the email specialist to send a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailRequest {
    /// Kind of email, e.g. "flight_options".
    pub email_type: String,
    /// Email body.
    pub details: String,
    /// Recipient address.
    pub recipient: String,
    /// Agent to notify with an [`EmailConfirmation`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify: Option<AgentId>,
}

/// Outcome of an email send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailStatus {
    /// The email was sent.
    Sent,
    /// Sending failed.
    Failed,
}

/// Email specialist report back to the primary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailConfirmation {
    /// Send outcome.
    pub status: EmailStatus,
    /// Kind of email that was sent.
    pub email_type: String,
    /// Recipient address.
    pub recipient: String,
}

/// Free-text question forwarded to a domain specialist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialistQuery {
    /// The user's query.
    pub query: String,
    /// Agent that should receive the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_agent_id: Option<AgentId>,
}

/// Specialist answer to a [`SpecialistQuery`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialistResponse {
    /// Answer text.
    pub response: String,
}

/// Message payload, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum MessagePayload {
    /// See [`MessageKind::FlightSearchQuery`].
    FlightSearchQuery(SearchQuery),
    /// See [`MessageKind::HotelSearchQuery`].
    HotelSearchQuery(SearchQuery),
    /// See [`MessageKind::FlightBookingResponse`].
    FlightBookingResponse(BookingResponse),
    /// See [`MessageKind::HotelBookingResponse`].
    HotelBookingResponse(BookingResponse),
    /// See [`MessageKind::SendBookingEmail`].
    SendBookingEmail(EmailRequest),
    /// See [`MessageKind::EmailConfirmation`].
    EmailConfirmation(EmailConfirmation),
    /// See [`MessageKind::SpecialistQuery`].
    SpecialistQuery(SpecialistQuery),
    /// See [`MessageKind::SpecialistResponse`].
    SpecialistResponse(SpecialistResponse),
}

impl MessagePayload {
    /// Returns the kind this payload is tagged with.
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::FlightSearchQuery(_) => MessageKind::FlightSearchQuery,
            Self::HotelSearchQuery(_) => MessageKind::HotelSearchQuery,
            Self::FlightBookingResponse(_) => MessageKind::FlightBookingResponse,
            Self::HotelBookingResponse(_) => MessageKind::HotelBookingResponse,
            Self::SendBookingEmail(_) => MessageKind::SendBookingEmail,
            Self::EmailConfirmation(_) => MessageKind::EmailConfirmation,
            Self::SpecialistQuery(_) => MessageKind::SpecialistQuery,
            Self::SpecialistResponse(_) => MessageKind::SpecialistResponse,
        }
    }

    /// The agent a query asks to be answered at, if the payload names one.
    pub fn requester(&self) -> Option<&AgentId> {
        match self {
            Self::FlightSearchQuery(q) | Self::HotelSearchQuery(q) => q.from_agent_id.as_ref(),
            Self::SpecialistQuery(q) => q.from_agent_id.as_ref(),
            _ => None,
        }
    }
}

/// A routed message as seen by the recipient's handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct A2AMessage {
    /// Unique message identifier.
    pub id: MessageId,
    /// Sender identity.
    pub from: AgentId,
    /// Recipient identity.
    pub to: AgentId,
    /// Typed payload.
    #[serde(flatten)]
    pub payload: MessagePayload,
    /// Sender's card, when the sender was registered at send time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_card: Option<AgentCard>,
    /// When the message was sent.
    pub sent_at: DateTime<Utc>,
}

impl A2AMessage {
    /// Creates a message without a sender card.
    pub fn new(from: AgentId, to: AgentId, payload: MessagePayload) -> Self {
        Self {
            id: MessageId::new(),
            from,
            to,
            payload,
            sender_card: None,
            sent_at: Utc::now(),
        }
    }

    /// Attaches the sender's card.
    pub fn with_sender_card(mut self, card: Option<AgentCard>) -> Self {
        self.sender_card = card;
        self
    }

    /// Returns the message kind.
    pub fn kind(&self) -> MessageKind {
        self.payload.kind()
    }

    /// Where a reply should go: the payload's requester, else the sender.
    pub fn reply_target(&self) -> &AgentId {
        self.payload.requester().unwrap_or(&self.from)
    }

    /// Domain of the sender, if its card travelled with the message.
    pub fn sender_domain(&self) -> Option<&str> {
        self.sender_card.as_ref().map(|c| c.domain.as_str())
    }
}
