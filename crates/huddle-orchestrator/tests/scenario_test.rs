//! End-to-end orchestration scenarios on virtual time.

use std::sync::Arc;
use std::time::Duration;

use huddle_agents::{
    Agent, AssistantAgent, BookingSpecialist, EmailAgent, LocalRoom, LocalRoomFactory, Pipeline, PipelineMode, PipelineReply,
    ScriptedPipeline, ScriptedPipelineFactory, ToolCall, TravelAgent,
};
use huddle_models::{
    AgentCard, AgentId, Domain, MeetingConfig, MeetingId, MessageKind, RunId, RunPhase, SessionRole, SessionState,
};
use huddle_orchestrator::{
    AssistantScenario, Cohort, CustomerServiceScenario, LeaveOutcome, RunOutcome, Scenario, SessionOrchestrator,
    TravelScenario,
};
use huddle_runtime::{DrainOutcome, RuntimeConfig, SessionEvent};
use serde_json::json;
use tokio::sync::broadcast;
use tokio::time::Instant;

struct Harness {
    orchestrator: SessionOrchestrator,
    pipelines: Arc<ScriptedPipelineFactory>,
    rooms: Arc<LocalRoomFactory>,
    events: broadcast::Receiver<SessionEvent>,
}

fn harness(scenario: Arc<dyn Scenario>) -> Harness {
    let pipelines = Arc::new(ScriptedPipelineFactory::new());
    let rooms = Arc::new(LocalRoomFactory::new());
    let orchestrator = SessionOrchestrator::new(scenario, pipelines.clone(), rooms.clone(), RuntimeConfig::default());
    let events = orchestrator.subscribe();
    Harness {
        orchestrator,
        pipelines,
        rooms,
        events,
    }
}

async fn wait_for<F>(rx: &mut broadcast::Receiver<SessionEvent>, mut matches: F) -> SessionEvent
where
    F: FnMut(&SessionEvent) -> bool,
{
    loop {
        let event = rx.recv().await.unwrap();
        if matches(&event) {
            return event;
        }
    }
}

async fn wait_for_phase(rx: &mut broadcast::Receiver<SessionEvent>, wanted: RunPhase) -> RunId {
    let event = wait_for(rx, |e| matches!(e, SessionEvent::PhaseChanged { phase, .. } if *phase == wanted)).await;
    event.run_id().clone()
}

/// Polls the room until `done` holds, on virtual time.
async fn wait_until_spoken<F>(room: &LocalRoom, done: F) -> Vec<String>
where
    F: Fn(&[String]) -> bool,
{
    for _ in 0..400 {
        let spoken = room.spoken();
        if done(&spoken) {
            return spoken;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("room never said what was expected: {:?}", room.spoken());
}

fn interactive_pipeline(pipelines: &ScriptedPipelineFactory) -> Arc<ScriptedPipeline> {
    pipelines
        .created()
        .into_iter()
        .rev()
        .find(|p| p.mode() == PipelineMode::Interactive)
        .unwrap()
}

fn count(spoken: &[String], prefix: &str) -> usize {
    spoken.iter().filter(|line| line.starts_with(prefix)).count()
}

fn book_paris() -> PipelineReply {
    PipelineReply::tool_calls(vec![ToolCall::new(
        "book_travel_package",
        json!({
            "destination": "Paris",
            "travel_dates": "June 1-7",
            "email": "ana@example.com",
        }),
    )])
}

#[tokio::test(start_paused = true)]
async fn test_travel_happy_path() {
    let mut h = harness(Arc::new(TravelScenario));
    let meeting: MeetingId = "meet-travel".into();

    let run = h.orchestrator.spawn(MeetingConfig::new(meeting.clone(), "tok"));
    wait_for_phase(&mut h.events, RunPhase::Running).await;

    let room = h.rooms.room(&meeting).unwrap();
    interactive_pipeline(&h.pipelines).push_reply(book_paris());
    room.push_utterance("I want to go to Paris in June");

    let spoken = wait_until_spoken(&room, |s| {
        count(s, "Flight update:") >= 1
            && count(s, "Hotel update:") >= 1
            && s.iter().filter(|l| l.contains("confirmation email")).count() >= 2
    })
    .await;

    // Give any duplicate delivery a chance to show up.
    tokio::time::sleep(Duration::from_secs(2)).await;
    let spoken_later = room.spoken();
    assert_eq!(count(&spoken_later, "Flight update:"), 1);
    assert_eq!(count(&spoken_later, "Hotel update:"), 1);
    assert!(spoken.iter().any(|l| l.contains("flight options confirmation email")));
    assert!(spoken.iter().any(|l| l.contains("hotel options confirmation email")));

    assert!(matches!(
        h.orchestrator.leave(&meeting),
        LeaveOutcome::Removed { sessions: 4, .. }
    ));
    let report = run.await.unwrap();
    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.sessions.len(), 4);
    assert!(report.sessions.iter().all(|s| s.state == SessionState::Ended && s.registered));
}

/// Travel cohort without a hotel specialist.
struct NoHotelScenario;

impl Scenario for NoHotelScenario {
    fn name(&self) -> &str {
        "travel_without_hotel"
    }

    fn cohort(&self, meeting: &MeetingConfig) -> Cohort {
        Cohort {
            primary: Arc::new(TravelAgent::new(meeting)),
            specialists: vec![
                Arc::new(BookingSpecialist::flight()) as Arc<dyn Agent>,
                Arc::new(EmailAgent::new()),
            ],
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_hotel_discovery_failure() {
    let mut h = harness(Arc::new(NoHotelScenario));
    let meeting: MeetingId = "meet-nohotel".into();

    let run = h.orchestrator.spawn(MeetingConfig::new(meeting.clone(), "tok"));
    wait_for_phase(&mut h.events, RunPhase::Running).await;

    let room = h.rooms.room(&meeting).unwrap();
    let pipeline = interactive_pipeline(&h.pipelines);
    pipeline.push_reply(book_paris());
    wait_until_spoken(&room, |s| !s.is_empty()).await;

    let asked = Instant::now();
    room.push_utterance("Book Paris please");
    let spoken = wait_until_spoken(&room, |s| s.iter().any(|l| l.contains("hotel booking service is temporarily unavailable"))).await;
    let elapsed = asked.elapsed();

    // Three lookups, two intervals between them.
    assert!(elapsed >= Duration::from_secs(4), "gave up after {elapsed:?}");
    assert!(elapsed < Duration::from_secs(5), "gave up after {elapsed:?}");

    tokio::time::sleep(Duration::from_secs(3)).await;
    let spoken_later = room.spoken();
    assert_eq!(count(&spoken_later, "Flight update:"), 0);
    assert_eq!(count(&spoken_later, "Hotel update:"), 0);
    assert!(!spoken.iter().any(|l| l.starts_with("Great! I've connected")));

    let primary = h.orchestrator.table().get(&meeting, &SessionRole::Primary).unwrap();
    let bus = primary.bus();
    assert_eq!(bus.registry().lookups(&Domain::new(Domain::HOTEL)), 3);
    assert_eq!(bus.router().sent_count(MessageKind::HotelSearchQuery), 0);
    assert_eq!(bus.router().sent_count(MessageKind::FlightSearchQuery), 0);

    h.orchestrator.leave(&meeting);
    let report = run.await.unwrap();
    assert_eq!(report.failures().count(), 0);
}

/// Minimal background agent serving the flight domain.
struct FlightDesk {
    id: AgentId,
}

impl Agent for FlightDesk {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn card(&self) -> AgentCard {
        AgentCard::new(self.id.clone(), "Flight desk", Domain::FLIGHT)
    }

    fn instructions(&self) -> &str {
        "Answer flight questions."
    }

    fn display_name(&self) -> &str {
        "Flight desk"
    }
}

/// Two specialists sharing one domain.
struct TwinFlightScenario;

impl Scenario for TwinFlightScenario {
    fn name(&self) -> &str {
        "twin_flight"
    }

    fn cohort(&self, meeting: &MeetingConfig) -> Cohort {
        Cohort {
            primary: Arc::new(AssistantAgent::new(meeting)),
            specialists: vec![
                Arc::new(FlightDesk { id: "flight_a".into() }) as Arc<dyn Agent>,
                Arc::new(FlightDesk { id: "flight_b".into() }),
            ],
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_same_domain_specialists_coexist() {
    let mut h = harness(Arc::new(TwinFlightScenario));
    let meeting: MeetingId = "meet-twins".into();

    let run = h.orchestrator.spawn(MeetingConfig::new(meeting.clone(), "tok"));
    wait_for(&mut h.events, |e| {
        matches!(
            e,
            SessionEvent::StateChanged { role: SessionRole::Primary, state: SessionState::Running, .. }
        )
    })
    .await;

    let snapshots = h.orchestrator.table().snapshots(&meeting);
    assert_eq!(snapshots.len(), 3);
    let mut specialists: Vec<String> = snapshots
        .iter()
        .filter(|s| s.role != SessionRole::Primary)
        .inspect(|s| {
            assert_eq!(s.state, SessionState::Running);
            assert!(s.registered);
        })
        .map(|s| s.role.to_string())
        .collect();
    specialists.sort();
    assert_eq!(specialists, vec!["specialist:flight_a", "specialist:flight_b"]);

    let primary = h.orchestrator.table().get(&meeting, &SessionRole::Primary).unwrap();
    let mut flights = primary.bus().registry().find_by_domain(&Domain::new(Domain::FLIGHT));
    flights.sort();
    assert_eq!(flights, vec![AgentId::from("flight_a"), AgentId::from("flight_b")]);

    assert!(matches!(
        h.orchestrator.leave(&meeting),
        LeaveOutcome::Removed { sessions: 3, .. }
    ));
    let report = run.await.unwrap();
    assert_eq!(report.sessions.len(), 3);
    assert!(report.sessions.iter().all(|s| s.state == SessionState::Ended && s.registered));
}

#[tokio::test(start_paused = true)]
async fn test_failed_primary_leaves_specialists_running() {
    let mut h = harness(Arc::new(CustomerServiceScenario));
    let meeting: MeetingId = "meet-badroom".into();

    // The room refuses an empty token, so only the primary's join fails.
    let run = h.orchestrator.spawn(MeetingConfig::new(meeting.clone(), ""));
    wait_for(&mut h.events, |e| {
        matches!(
            e,
            SessionEvent::StateChanged { role: SessionRole::Primary, state: SessionState::Failed, .. }
        )
    })
    .await;
    tokio::time::sleep(Duration::from_secs(5)).await;

    let snapshots = h.orchestrator.table().snapshots(&meeting);
    let loan = snapshots
        .iter()
        .find(|s| s.role != SessionRole::Primary)
        .unwrap();
    assert_eq!(loan.state, SessionState::Running);
    assert!(loan.registered);

    assert!(matches!(
        h.orchestrator.leave(&meeting),
        LeaveOutcome::Removed { sessions: 2, .. }
    ));
    let report = run.await.unwrap();
    assert_eq!(report.failures().count(), 1);
    let primary = report.sessions.iter().find(|s| s.role == SessionRole::Primary).unwrap();
    assert_eq!(primary.state, SessionState::Failed);
    assert!(primary.error.is_some());
    let specialist = report.sessions.iter().find(|s| s.role != SessionRole::Primary).unwrap();
    assert_eq!(specialist.state, SessionState::Ended);
}

#[tokio::test(start_paused = true)]
async fn test_mid_run_cancellation() {
    let mut h = harness(Arc::new(AssistantScenario::new()));
    let meeting: MeetingId = "meet-cancel".into();

    let run = h.orchestrator.spawn(MeetingConfig::new(meeting.clone(), "tok"));
    wait_for(&mut h.events, |e| {
        matches!(
            e,
            SessionEvent::StateChanged { role: SessionRole::Primary, state: SessionState::Running, .. }
        )
    })
    .await;
    assert!(h.orchestrator.table().contains(&meeting));

    assert!(matches!(
        h.orchestrator.leave(&meeting),
        LeaveOutcome::Removed { sessions: 1, .. }
    ));
    assert!(!h.orchestrator.table().contains(&meeting));
    assert_eq!(h.orchestrator.leave(&meeting), LeaveOutcome::NotFound);

    let report = run.await.unwrap();
    assert_eq!(report.drain, Some(DrainOutcome::AlreadyRemoved));
    assert_eq!(report.sessions[0].state, SessionState::Ended);

    let drained = wait_for(&mut h.events, |e| matches!(e, SessionEvent::Drained { .. })).await;
    assert!(matches!(
        drained,
        SessionEvent::Drained { outcome: DrainOutcome::AlreadyRemoved, .. }
    ));

    let room = h.rooms.room(&meeting).unwrap();
    assert!(room.has_left());
    assert_eq!(room.spoken().last().map(String::as_str), Some("Goodbye!"));
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_join_replaces_prior_run() {
    let mut h = harness(Arc::new(CustomerServiceScenario));
    let meeting: MeetingId = "meet-dup".into();

    let first = h.orchestrator.spawn(MeetingConfig::new(meeting.clone(), "tok"));
    let first_run = wait_for_phase(&mut h.events, RunPhase::Running).await;
    assert_eq!(h.orchestrator.table().run_id(&meeting), Some(first_run.clone()));

    let second = h.orchestrator.spawn(MeetingConfig::new(meeting.clone(), "tok"));

    let first_report = first.await.unwrap();
    assert_eq!(first_report.run_id, first_run);
    assert_eq!(first_report.drain, Some(DrainOutcome::AlreadyRemoved));
    assert!(first_report.sessions.iter().all(|s| s.state == SessionState::Ended));

    let second_run = wait_for(&mut h.events, |e| {
        matches!(e, SessionEvent::PhaseChanged { phase: RunPhase::Running, run_id, .. } if *run_id != first_run)
    })
    .await
    .run_id()
    .clone();

    assert_eq!(h.orchestrator.table().run_id(&meeting), Some(second_run.clone()));
    let roles: Vec<SessionRole> = h
        .orchestrator
        .table()
        .sessions(&meeting)
        .iter()
        .map(|s| s.role().clone())
        .collect();
    assert_eq!(roles.len(), 2);
    assert!(h
        .orchestrator
        .table()
        .sessions(&meeting)
        .iter()
        .all(|s| s.run_id() == &second_run));

    h.orchestrator.leave(&meeting);
    let second_report = second.await.unwrap();
    assert_eq!(second_report.run_id, second_run);
    assert!(h.orchestrator.table().is_empty());
}

#[tokio::test]
async fn test_missing_configuration_rejects_run() {
    let h = harness(Arc::new(TravelScenario));
    let orchestrator = h
        .orchestrator
        .clone()
        .with_missing_credentials(vec!["GOOGLE_API_KEY".to_string()]);
    let mut events = orchestrator.subscribe();
    let meeting: MeetingId = "meet-nokey".into();

    let report = orchestrator.run(MeetingConfig::new(meeting.clone(), "tok")).await;

    assert_eq!(
        report.outcome,
        RunOutcome::Rejected {
            missing: vec!["GOOGLE_API_KEY".to_string()]
        }
    );
    assert!(report.sessions.is_empty());
    assert!(h.pipelines.created().is_empty());
    assert!(h.rooms.room(&meeting).is_none());
    assert!(!orchestrator.table().contains(&meeting));

    let rejected = wait_for(&mut events, |e| matches!(e, SessionEvent::Rejected { .. })).await;
    assert_eq!(rejected.meeting_id(), &meeting);
    wait_for_phase(&mut events, RunPhase::Done).await;
}
