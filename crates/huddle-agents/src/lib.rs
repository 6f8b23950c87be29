//! Huddle Agents - the agents and the collaborators they talk through.
//!
//! - **agent**: the [`Agent`] trait every agent implements
//! - **context**: [`AgentContext`] handed to hooks, tools and handlers
//! - **pipeline**: language-model contract, with a Gemini client
//!   ([`gemini`]) and a scripted stand-in ([`scripted`])
//! - **room**: meeting-room contract and an in-process room
//! - **knowledge**: retrieval contract and a keyword index
//! - **flow**: per-utterance conversation handling with a bounded tool loop
//!
//! Concrete agents:
//!
//! | Agent | Id | Domain | Role |
//! |---|---|---|---|
//! | [`TravelAgent`] | `travel_agent_1` | travel | primary |
//! | [`BookingSpecialist`] | `agent_flight_001` / `agent_hotel_001` | flight / hotel | specialist |
//! | [`EmailAgent`] | `agent_email_001` | email | specialist |
//! | [`CustomerServiceAgent`] | `customer_service_1` | customer_service | primary |
//! | [`LoanAgent`] | `loan_specialist_1` | loan | specialist |
//! | [`AssistantAgent`] | `voice_agent` | assistant | primary |

pub mod agent;
pub mod assistant;
pub mod booking;
pub mod chat;
pub mod context;
pub mod customer_service;
pub mod email;
pub mod error;
pub mod flow;
pub mod gemini;
pub mod knowledge;
pub mod loan;
pub mod pipeline;
pub mod room;
pub mod scripted;
pub mod tool;
pub mod travel;

pub use agent::{end_call, end_call_tool, primary_instructions, unexpected_payload, Agent, END_CALL_DELAY};
pub use assistant::{AssistantAgent, ASSISTANT_ID};
pub use booking::{BookingService, BookingSpecialist};
pub use chat::{ChatMessage, ChatRole};
pub use context::{AgentContext, StopSignal};
pub use customer_service::{CustomerServiceAgent, CUSTOMER_SERVICE_ID};
pub use email::{EmailAgent, EMAIL_AGENT_ID};
pub use error::{AgentError, PipelineError, Result, RetrievalError, RoomError};
pub use flow::{normalize_transcript, ConversationFlow, MAX_TOOL_ITERATIONS, PIPELINE_APOLOGY};
pub use gemini::{GeminiClient, GeminiPipeline, GeminiPipelineFactory, DEFAULT_GEMINI_API_URL};
pub use knowledge::{
    format_context, search_knowledge, KeywordIndex, KnowledgeChunk, KnowledgeHit, KnowledgeRetriever,
    DEFAULT_MAX_RESULTS,
};
pub use loan::{LoanAgent, LOAN_AGENT_ID};
pub use pipeline::{Pipeline, PipelineFactory, PipelineMode, PipelineReply, PipelineSpec};
pub use room::{JoinRequest, LocalRoom, LocalRoomFactory, MeetingRoom, RoomFactory};
pub use scripted::{ScriptedPipeline, ScriptedPipelineFactory};
pub use tool::{ToolCall, ToolDefinition, ToolResult};
pub use travel::{TravelAgent, TRAVEL_AGENT_ID};
