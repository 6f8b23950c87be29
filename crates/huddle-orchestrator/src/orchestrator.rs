//! Session orchestrator: starts one meeting's cohort and tears it down.
//!
//! A run moves through
//!
//! ```text
//! Building -> SpecialistsStarting -> Settling -> PrimaryStarting -> Running -> Draining -> Done
//! ```
//!
//! Specialists are launched first so their cards are in the run's registry
//! before the primary can issue a discovery call. The run waits for every
//! session task, then removes its table entry with a run-guarded pop: if a
//! leave request or a newer run got there first, the drain does nothing.

use std::sync::Arc;

use futures::future::join_all;
use huddle_agents::{JoinRequest, PipelineFactory, PipelineMode, PipelineSpec, RoomFactory};
use huddle_bus::{A2ABus, RegistryEvent};
use huddle_core::Settings;
use huddle_models::{AgentId, MeetingConfig, MeetingId, RunId, RunPhase, SessionRole, SessionState};
use huddle_runtime::{
    DrainOutcome, RuntimeConfig, Session, SessionError, SessionEvent, SessionOutcome, SessionTable, SettlePolicy,
};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::error::OrchestratorError;
use crate::report::{OrchestrationReport, RunOutcome};
use crate::scenario::Scenario;

/// Result of a leave request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The meeting's entry was popped and its sessions asked to stop.
    Removed { run_id: RunId, sessions: usize },
    /// No entry for the meeting.
    NotFound,
}

/// Starts and drains agent cohorts, one run per meeting request.
///
/// Cloning is cheap; clones share the session table and event channel.
#[derive(Clone)]
pub struct SessionOrchestrator {
    scenario: Arc<dyn Scenario>,
    pipelines: Arc<dyn PipelineFactory>,
    rooms: Arc<dyn RoomFactory>,
    table: Arc<SessionTable>,
    config: RuntimeConfig,
    missing_credentials: Vec<String>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionOrchestrator {
    pub fn new(
        scenario: Arc<dyn Scenario>,
        pipelines: Arc<dyn PipelineFactory>,
        rooms: Arc<dyn RoomFactory>,
        config: RuntimeConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity);
        Self {
            scenario,
            pipelines,
            rooms,
            table: Arc::new(SessionTable::new()),
            config,
            missing_credentials: Vec::new(),
            events,
        }
    }

    /// Shares an existing session table.
    pub fn with_table(mut self, table: Arc<SessionTable>) -> Self {
        self.table = table;
        self
    }

    /// Rejects every run while `settings` lacks a required credential.
    pub fn with_settings(mut self, settings: &Settings) -> Self {
        self.missing_credentials = settings.missing_credentials();
        self
    }

    /// Rejects every run, reporting `missing` as the absent settings.
    pub fn with_missing_credentials(mut self, missing: Vec<String>) -> Self {
        self.missing_credentials = missing;
        self
    }

    pub fn table(&self) -> &Arc<SessionTable> {
        &self.table
    }

    pub fn scenario_name(&self) -> &str {
        self.scenario.name()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Subscribes to run and session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Runs orchestration for `meeting` in the background.
    pub fn spawn(&self, meeting: MeetingConfig) -> JoinHandle<OrchestrationReport> {
        let this = self.clone();
        tokio::spawn(async move { this.run(meeting).await })
    }

    /// Runs orchestration for `meeting` until every session is terminal.
    pub async fn run(&self, meeting: MeetingConfig) -> OrchestrationReport {
        let run_id = RunId::new();
        let span = info_span!("run", meeting_id = %meeting.meeting_id, run_id = %run_id);
        self.execute(run_id, meeting).instrument(span).await
    }

    /// Pops the meeting's entry and asks each of its sessions to stop.
    pub fn leave(&self, meeting_id: &MeetingId) -> LeaveOutcome {
        let Some(removed) = self.table.remove_all(meeting_id) else {
            info!(meeting_id = %meeting_id, "leave: no active sessions");
            return LeaveOutcome::NotFound;
        };
        for session in &removed.sessions {
            session.stop();
        }
        info!(
            meeting_id = %meeting_id,
            run_id = %removed.run_id,
            sessions = removed.sessions.len(),
            "leave: sessions stopped"
        );
        LeaveOutcome::Removed {
            run_id: removed.run_id,
            sessions: removed.sessions.len(),
        }
    }

    async fn execute(&self, run_id: RunId, meeting: MeetingConfig) -> OrchestrationReport {
        let meeting_id = meeting.meeting_id.clone();
        self.phase(&meeting_id, &run_id, RunPhase::Building);

        if !self.missing_credentials.is_empty() {
            let err = OrchestratorError::ConfigurationMissing(self.missing_credentials.clone());
            error!(error = %err, "orchestration rejected");
            self.emit(SessionEvent::Rejected {
                meeting_id: meeting_id.clone(),
                run_id: run_id.clone(),
                reason: err.to_string(),
            });
            self.phase(&meeting_id, &run_id, RunPhase::Done);
            return OrchestrationReport::rejected(meeting_id, run_id, self.missing_credentials.clone());
        }

        if let Some(prior) = self.table.remove_all(&meeting_id) {
            info!(prior_run = %prior.run_id, sessions = prior.sessions.len(), "stopping prior run for meeting");
            for session in &prior.sessions {
                session.stop();
            }
        }

        let bus = A2ABus::new(self.config.discovery);
        let cohort = self.scenario.cohort(&meeting);

        let background = PipelineSpec::for_meeting(PipelineMode::Background, &meeting);
        let specialists: Vec<Arc<Session>> = cohort
            .specialists
            .into_iter()
            .map(|agent| {
                let role = SessionRole::Specialist(agent.id().clone());
                let pipeline = self.pipelines.create(&background);
                Arc::new(
                    Session::new(meeting_id.clone(), run_id.clone(), role, agent, bus.clone(), pipeline)
                        .with_events(self.events.clone()),
                )
            })
            .collect();

        let primary = {
            let pipeline = self
                .pipelines
                .create(&PipelineSpec::for_meeting(PipelineMode::Interactive, &meeting));
            let request = JoinRequest {
                meeting_id: meeting_id.clone(),
                auth_token: meeting.auth_token.clone(),
                display_name: cohort.primary.display_name().to_string(),
                voice: Some(meeting.voice.clone()),
            };
            let room = self.rooms.create(&meeting_id);
            Arc::new(
                Session::new(
                    meeting_id.clone(),
                    run_id.clone(),
                    SessionRole::Primary,
                    cohort.primary,
                    bus.clone(),
                    pipeline,
                )
                .with_room(room, request)
                .with_events(self.events.clone()),
            )
        };

        for session in specialists.iter().chain(std::iter::once(&primary)) {
            let displaced = self
                .table
                .add(&meeting_id, &run_id, session.role().clone(), Arc::clone(session));
            for other in displaced {
                warn!(agent_id = %other.agent_id(), run_id = %other.run_id(), "displaced session stopped");
                other.stop();
            }
        }

        let registrations = bus.registry().subscribe();

        self.phase(&meeting_id, &run_id, RunPhase::SpecialistsStarting);
        let specialist_tasks: Vec<JoinHandle<SessionOutcome>> = specialists.iter().map(launch).collect();

        self.phase(&meeting_id, &run_id, RunPhase::Settling);
        self.settle(&bus, &specialists, registrations).await;

        self.phase(&meeting_id, &run_id, RunPhase::PrimaryStarting);
        let primary_task = launch(&primary);
        self.phase(&meeting_id, &run_id, RunPhase::Running);

        // A call that ended normally takes its specialists with it. A failed
        // primary leaves them running until they end or the meeting is left.
        let primary_outcome = collect(&primary, &bus, primary_task).await;
        if primary_outcome.is_success() {
            for session in &specialists {
                session.stop();
            }
        } else if !specialists.is_empty() {
            warn!(
                agent_id = %primary_outcome.agent_id,
                state = %primary_outcome.state,
                specialists = specialists.len(),
                "primary failed; specialists keep running"
            );
        }
        let mut sessions: Vec<SessionOutcome> = join_all(
            specialists
                .iter()
                .zip(specialist_tasks)
                .map(|(session, task)| collect(session, &bus, task)),
        )
        .await;
        sessions.push(primary_outcome);

        for outcome in sessions.iter().filter(|o| o.error.is_some()) {
            warn!(
                agent_id = %outcome.agent_id,
                role = %outcome.role,
                state = %outcome.state,
                error = ?outcome.error,
                "session failed"
            );
        }

        self.phase(&meeting_id, &run_id, RunPhase::Draining);
        let drain = match self.table.remove_run(&meeting_id, &run_id) {
            Some(removed) => {
                for session in &removed.sessions {
                    bus.detach(session.agent_id());
                }
                DrainOutcome::Removed {
                    sessions: removed.sessions.len(),
                }
            }
            None => {
                debug!("entry already removed, skipping teardown");
                DrainOutcome::AlreadyRemoved
            }
        };
        info!(drain = ?drain, sessions = sessions.len(), "run drained");
        self.emit(SessionEvent::Drained {
            meeting_id: meeting_id.clone(),
            run_id: run_id.clone(),
            outcome: drain,
        });
        self.phase(&meeting_id, &run_id, RunPhase::Done);

        OrchestrationReport {
            meeting_id,
            run_id,
            outcome: RunOutcome::Completed,
            sessions,
            drain: Some(drain),
        }
    }

    async fn settle(
        &self,
        bus: &A2ABus,
        specialists: &[Arc<Session>],
        mut registrations: broadcast::Receiver<RegistryEvent>,
    ) {
        let delay = self.config.settle_delay;
        match self.config.settle_policy {
            SettlePolicy::FixedDelay => tokio::time::sleep(delay).await,
            SettlePolicy::AwaitRegistration => {
                let wanted: Vec<AgentId> = specialists.iter().map(|s| s.agent_id().clone()).collect();
                let all_registered = async {
                    loop {
                        if wanted.iter().all(|id| bus.registry().contains(id)) {
                            return;
                        }
                        if let Err(broadcast::error::RecvError::Closed) = registrations.recv().await {
                            return;
                        }
                    }
                };
                if tokio::time::timeout(delay, all_registered).await.is_err() {
                    warn!(delay = ?delay, "settle delay elapsed before every specialist registered");
                }
            }
        }
    }

    fn phase(&self, meeting_id: &MeetingId, run_id: &RunId, phase: RunPhase) {
        debug!(phase = %phase, "run phase");
        self.emit(SessionEvent::phase(meeting_id, run_id, phase));
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

fn launch(session: &Arc<Session>) -> JoinHandle<SessionOutcome> {
    let span = info_span!("session", agent_id = %session.agent_id(), role = %session.role());
    let session = Arc::clone(session);
    tokio::spawn(async move { session.run().await }.instrument(span))
}

async fn collect(session: &Arc<Session>, bus: &A2ABus, task: JoinHandle<SessionOutcome>) -> SessionOutcome {
    match task.await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(agent_id = %session.agent_id(), error = %e, "session task did not complete");
            SessionOutcome {
                agent_id: session.agent_id().clone(),
                role: session.role().clone(),
                state: SessionState::Failed,
                registered: bus.registry().contains(session.agent_id()),
                error: Some(SessionError::TaskFailed {
                    agent: session.agent_id().clone(),
                    message: e.to_string(),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{AssistantScenario, CustomerServiceScenario};
    use huddle_agents::{LocalRoomFactory, ScriptedPipelineFactory};
    use std::time::Duration;

    fn orchestrator(scenario: Arc<dyn Scenario>, config: RuntimeConfig) -> (SessionOrchestrator, Arc<LocalRoomFactory>) {
        let rooms = Arc::new(LocalRoomFactory::new());
        let orchestrator = SessionOrchestrator::new(
            scenario,
            Arc::new(ScriptedPipelineFactory::new()),
            rooms.clone(),
            config,
        );
        (orchestrator, rooms)
    }

    async fn wait_for_phase(rx: &mut broadcast::Receiver<SessionEvent>, wanted: RunPhase) -> tokio::time::Instant {
        loop {
            if let SessionEvent::PhaseChanged { phase, .. } = rx.recv().await.unwrap() {
                if phase == wanted {
                    return tokio::time::Instant::now();
                }
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_settle_delay() {
        let (orchestrator, _rooms) = orchestrator(Arc::new(CustomerServiceScenario), RuntimeConfig::default());
        let mut rx = orchestrator.subscribe();
        let meeting: MeetingId = "meet-123".into();

        let handle = orchestrator.spawn(MeetingConfig::new(meeting.clone(), "tok"));
        let settling = wait_for_phase(&mut rx, RunPhase::Settling).await;
        let primary = wait_for_phase(&mut rx, RunPhase::PrimaryStarting).await;
        assert!(primary - settling >= Duration::from_secs(3));

        assert!(matches!(orchestrator.leave(&meeting), LeaveOutcome::Removed { sessions: 2, .. }));
        let report = handle.await.unwrap();
        assert!(report.is_completed());
        assert_eq!(report.drain, Some(DrainOutcome::AlreadyRemoved));
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_registration_settles_early() {
        let config = RuntimeConfig::default()
            .with_settle_delay(Duration::from_secs(10))
            .with_settle_policy(SettlePolicy::AwaitRegistration);
        let (orchestrator, _rooms) = orchestrator(Arc::new(CustomerServiceScenario), config);
        let mut rx = orchestrator.subscribe();
        let meeting: MeetingId = "meet-123".into();

        let handle = orchestrator.spawn(MeetingConfig::new(meeting.clone(), "tok"));
        let settling = wait_for_phase(&mut rx, RunPhase::Settling).await;
        let primary = wait_for_phase(&mut rx, RunPhase::PrimaryStarting).await;
        assert!(primary - settling < Duration::from_secs(10));

        orchestrator.leave(&meeting);
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_primary_end_stops_specialists() {
        let (orchestrator, rooms) = orchestrator(Arc::new(CustomerServiceScenario), RuntimeConfig::default());
        let mut rx = orchestrator.subscribe();
        let meeting: MeetingId = "meet-123".into();

        let handle = orchestrator.spawn(MeetingConfig::new(meeting.clone(), "tok"));
        wait_for_phase(&mut rx, RunPhase::Running).await;

        // The user hanging up closes the room.
        rooms.room(&meeting).unwrap().close();
        let report = handle.await.unwrap();

        assert_eq!(report.drain, Some(DrainOutcome::Removed { sessions: 2 }));
        assert!(report.sessions.iter().all(|s| s.state == SessionState::Ended));
        assert_eq!(report.failures().count(), 0);
        assert!(!orchestrator.table().contains(&meeting));
    }

    #[tokio::test]
    async fn test_leave_unknown_meeting() {
        let (orchestrator, _rooms) = orchestrator(Arc::new(AssistantScenario::new()), RuntimeConfig::default());
        assert_eq!(orchestrator.leave(&"missing".into()), LeaveOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_with_settings_rejects_without_key() {
        let (orchestrator, _rooms) = orchestrator(Arc::new(AssistantScenario::new()), RuntimeConfig::default());
        let orchestrator = orchestrator.with_settings(&Settings::default());

        let report = orchestrator.run(MeetingConfig::new("meet-123", "tok")).await;
        assert_eq!(
            report.outcome,
            RunOutcome::Rejected {
                missing: vec!["GOOGLE_API_KEY".to_string()]
            }
        );
        assert!(orchestrator.table().is_empty());
    }
}
