//! Per-meeting table of live sessions.
//!
//! Each meeting maps to the sessions of exactly one orchestration run,
//! tagged with that run's [`RunId`]. A newer run for the same meeting
//! displaces the older entry, and a run's own cleanup only removes the
//! entry while it still carries its id. Every operation takes the table
//! lock once, so check-then-remove sequences are atomic.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use huddle_models::{MeetingId, RunId, SessionRole};
use tracing::debug;

use crate::session::{Session, SessionSnapshot};

struct SessionEntry {
    run_id: RunId,
    sessions: BTreeMap<SessionRole, Arc<Session>>,
}

/// Sessions removed from the table in one step.
#[derive(Debug)]
pub struct RemovedRun {
    pub run_id: RunId,
    pub sessions: Vec<Arc<Session>>,
}

/// Thread-safe `meeting -> (run, role -> session)` table.
#[derive(Default)]
pub struct SessionTable {
    entries: Mutex<HashMap<MeetingId, SessionEntry>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<MeetingId, SessionEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records `session` under `meeting_id` for `run_id`.
    ///
    /// Returns the sessions this displaced: the whole entry if it belonged
    /// to a different run, otherwise a previous session with the same role.
    pub fn add(&self, meeting_id: &MeetingId, run_id: &RunId, role: SessionRole, session: Arc<Session>) -> Vec<Arc<Session>> {
        let mut entries = self.lock();
        let mut displaced = Vec::new();

        let stale = entries
            .get(meeting_id)
            .is_some_and(|entry| entry.run_id != *run_id);
        if stale {
            if let Some(old) = entries.remove(meeting_id) {
                debug!(meeting_id = %meeting_id, old_run = %old.run_id, new_run = %run_id, "run displaced");
                displaced.extend(old.sessions.into_values());
            }
        }

        let entry = entries.entry(meeting_id.clone()).or_insert_with(|| SessionEntry {
            run_id: run_id.clone(),
            sessions: BTreeMap::new(),
        });
        if let Some(previous) = entry.sessions.insert(role, session) {
            displaced.push(previous);
        }
        displaced
    }

    /// Returns the session for `role` in `meeting_id`.
    pub fn get(&self, meeting_id: &MeetingId, role: &SessionRole) -> Option<Arc<Session>> {
        self.lock()
            .get(meeting_id)
            .and_then(|entry| entry.sessions.get(role).cloned())
    }

    /// All sessions of `meeting_id`, primary first.
    pub fn sessions(&self, meeting_id: &MeetingId) -> Vec<Arc<Session>> {
        self.lock()
            .get(meeting_id)
            .map(|entry| entry.sessions.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Snapshots of the sessions of `meeting_id`.
    pub fn snapshots(&self, meeting_id: &MeetingId) -> Vec<SessionSnapshot> {
        self.sessions(meeting_id).iter().map(|s| s.snapshot()).collect()
    }

    /// The run currently owning `meeting_id`.
    pub fn run_id(&self, meeting_id: &MeetingId) -> Option<RunId> {
        self.lock().get(meeting_id).map(|entry| entry.run_id.clone())
    }

    /// Pops the meeting's entry, whichever run owns it.
    pub fn remove_all(&self, meeting_id: &MeetingId) -> Option<RemovedRun> {
        let entry = self.lock().remove(meeting_id)?;
        Some(RemovedRun {
            run_id: entry.run_id,
            sessions: entry.sessions.into_values().collect(),
        })
    }

    /// Pops the meeting's entry only if it still belongs to `run_id`.
    pub fn remove_run(&self, meeting_id: &MeetingId, run_id: &RunId) -> Option<RemovedRun> {
        let mut entries = self.lock();
        if entries.get(meeting_id)?.run_id != *run_id {
            return None;
        }
        let entry = entries.remove(meeting_id)?;
        Some(RemovedRun {
            run_id: entry.run_id,
            sessions: entry.sessions.into_values().collect(),
        })
    }

    pub fn contains(&self, meeting_id: &MeetingId) -> bool {
        self.lock().contains_key(meeting_id)
    }

    /// Meetings with an entry, sorted.
    pub fn meeting_ids(&self) -> Vec<MeetingId> {
        let mut ids: Vec<MeetingId> = self.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of meetings with an entry.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
