//! One agent's session within a meeting.
//!
//! A session owns the lifecycle of a single agent:
//!
//! ```text
//! Created -> Starting -> Running -> Ended
//!               |           |
//!               +-----------+--> Failed
//! ```
//!
//! `Starting` joins the room (user-facing sessions only), publishes the
//! agent's card, installs its handlers and runs `on_enter`. `Running`
//! processes room utterances (user-facing) or just waits (background)
//! until the stop signal is raised or the room closes. On the way out the
//! session runs `on_exit`, leaves the room and detaches the agent from the
//! bus.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use huddle_agents::{Agent, AgentContext, ConversationFlow, JoinRequest, MeetingRoom, Pipeline, StopSignal};
use huddle_bus::A2ABus;
use huddle_models::{AgentId, MeetingId, RunId, SessionRole, SessionState};
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

use crate::error::SessionError;
use crate::event::SessionEvent;

/// What a finished session reports to its orchestrator.
#[derive(Debug)]
pub struct SessionOutcome {
    pub agent_id: AgentId,
    pub role: SessionRole,
    /// Final state.
    pub state: SessionState,
    /// True if the agent's card was published at some point.
    pub registered: bool,
    pub error: Option<SessionError>,
}

impl SessionOutcome {
    /// Returns true if the session ended without error.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.state == SessionState::Ended
    }
}

/// Point-in-time view of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub role: SessionRole,
    pub agent_id: AgentId,
    pub run_id: RunId,
    pub state: SessionState,
    pub user_facing: bool,
    /// True while the agent's card is in the run's registry.
    pub registered: bool,
}

/// A single agent session.
pub struct Session {
    meeting_id: MeetingId,
    run_id: RunId,
    role: SessionRole,
    agent: Arc<dyn Agent>,
    bus: A2ABus,
    pipeline: Arc<dyn Pipeline>,
    room: Option<(Arc<dyn MeetingRoom>, JoinRequest)>,
    stop: StopSignal,
    state: watch::Sender<SessionState>,
    events: Option<broadcast::Sender<SessionEvent>>,
    started: AtomicBool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("meeting_id", &self.meeting_id)
            .field("run_id", &self.run_id)
            .field("role", &self.role)
            .field("agent_id", self.agent.id())
            .field("state", &self.state())
            .field("user_facing", &self.room.is_some())
            .finish()
    }
}

impl Session {
    /// Creates a background session.
    pub fn new(
        meeting_id: MeetingId,
        run_id: RunId,
        role: SessionRole,
        agent: Arc<dyn Agent>,
        bus: A2ABus,
        pipeline: Arc<dyn Pipeline>,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Created);
        Self {
            meeting_id,
            run_id,
            role,
            agent,
            bus,
            pipeline,
            room: None,
            stop: StopSignal::new(),
            state,
            events: None,
            started: AtomicBool::new(false),
        }
    }

    /// Makes the session user-facing: it joins `room` with `request`.
    pub fn with_room(mut self, room: Arc<dyn MeetingRoom>, request: JoinRequest) -> Self {
        self.room = Some((room, request));
        self
    }

    /// Publishes state changes on `events`.
    pub fn with_events(mut self, events: broadcast::Sender<SessionEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn meeting_id(&self) -> &MeetingId {
        &self.meeting_id
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn role(&self) -> &SessionRole {
        &self.role
    }

    pub fn agent_id(&self) -> &AgentId {
        self.agent.id()
    }

    /// The bus of the run this session belongs to.
    pub fn bus(&self) -> &A2ABus {
        &self.bus
    }

    /// Returns true if the session joins the meeting room.
    pub fn is_user_facing(&self) -> bool {
        self.room.is_some()
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Subscribes to state changes.
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            role: self.role.clone(),
            agent_id: self.agent.id().clone(),
            run_id: self.run_id.clone(),
            state: self.state(),
            user_facing: self.is_user_facing(),
            registered: self.bus.registry().contains(self.agent.id()),
        }
    }

    /// Asks the session to end.
    ///
    /// Safe before `run`, during startup and after the session ended.
    /// Returns true on the first call only.
    pub fn stop(&self) -> bool {
        let first = self.stop.stop();
        if first {
            info!(
                meeting_id = %self.meeting_id,
                agent_id = %self.agent.id(),
                state = %self.state(),
                "stop requested"
            );
        }
        first
    }

    /// Returns true once a stop was requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop.is_stopped()
    }

    /// Waits until the session is `Ended` or `Failed`.
    pub async fn wait_terminal(&self) -> SessionState {
        let mut rx = self.state.subscribe();
        let state = match rx.wait_for(|state| state.is_terminal()).await {
            Ok(state) => *state,
            Err(_) => self.state(),
        };
        state
    }

    /// Runs the session to completion. Only the first call does anything.
    pub async fn run(&self) -> SessionOutcome {
        if self.started.swap(true, Ordering::SeqCst) {
            return self.outcome(false, Some(SessionError::AlreadyStarted(self.agent.id().clone())));
        }

        if self.stop.is_stopped() {
            debug!(agent_id = %self.agent.id(), "stopped before start");
            self.set_state(SessionState::Ended);
            return self.outcome(false, None);
        }

        self.set_state(SessionState::Starting);
        let ctx = self.context();

        if let Some((room, request)) = &self.room {
            if let Err(e) = room.join(request).await {
                error!(
                    meeting_id = %self.meeting_id,
                    agent_id = %self.agent.id(),
                    error = %e,
                    "failed to join room"
                );
                self.set_state(SessionState::Failed);
                return self.outcome(false, Some(e.into()));
            }
        }

        self.bus.register(self.agent.card());
        for (kind, handler) in self.agent.handlers(&ctx) {
            self.bus.on_message(self.agent.id(), kind, handler);
        }
        info!(
            meeting_id = %self.meeting_id,
            agent_id = %self.agent.id(),
            role = %self.role,
            "agent registered"
        );

        let mut failure = match self.agent.on_enter(&ctx).await {
            Ok(()) => {
                self.set_state(SessionState::Running);
                self.process(&ctx).await;
                None
            }
            Err(source) => {
                error!(agent_id = %self.agent.id(), error = %source, "on_enter failed");
                Some(SessionError::Enter {
                    agent: self.agent.id().clone(),
                    source,
                })
            }
        };

        if failure.is_none() {
            if let Err(source) = self.agent.on_exit(&ctx).await {
                warn!(agent_id = %self.agent.id(), error = %source, "on_exit failed");
                failure = Some(SessionError::Exit {
                    agent: self.agent.id().clone(),
                    source,
                });
            }
        }

        if let Some((room, _)) = &self.room {
            room.leave().await;
        }
        self.bus.detach(self.agent.id());

        self.set_state(if failure.is_some() {
            SessionState::Failed
        } else {
            SessionState::Ended
        });
        info!(
            meeting_id = %self.meeting_id,
            agent_id = %self.agent.id(),
            state = %self.state(),
            "session finished"
        );
        self.outcome(true, failure)
    }

    async fn process(&self, ctx: &AgentContext) {
        let Some((room, _)) = &self.room else {
            self.stop.stopped().await;
            return;
        };

        let mut flow = ConversationFlow::new(Arc::clone(&self.agent), ctx.clone());
        loop {
            tokio::select! {
                biased;
                _ = self.stop.stopped() => break,
                utterance = room.next_utterance() => match utterance {
                    Some(text) => {
                        flow.handle_utterance(&text).await;
                    }
                    None => {
                        info!(meeting_id = %self.meeting_id, agent_id = %self.agent.id(), "room closed");
                        break;
                    }
                },
            }
        }
    }

    fn context(&self) -> AgentContext {
        AgentContext {
            meeting_id: self.meeting_id.clone(),
            agent_id: self.agent.id().clone(),
            bus: self.bus.clone(),
            pipeline: Arc::clone(&self.pipeline),
            room: self.room.as_ref().map(|(room, _)| Arc::clone(room)),
            stop: self.stop.clone(),
        }
    }

    fn set_state(&self, state: SessionState) {
        self.state.send_replace(state);
        debug!(agent_id = %self.agent.id(), state = %state, "session state changed");
        if let Some(events) = &self.events {
            // No subscribers is fine.
            let _ = events.send(SessionEvent::StateChanged {
                meeting_id: self.meeting_id.clone(),
                run_id: self.run_id.clone(),
                role: self.role.clone(),
                agent_id: self.agent.id().clone(),
                state,
            });
        }
    }

    fn outcome(&self, registered: bool, error: Option<SessionError>) -> SessionOutcome {
        SessionOutcome {
            agent_id: self.agent.id().clone(),
            role: self.role.clone(),
            state: self.state(),
            registered,
            error,
        }
    }
}
