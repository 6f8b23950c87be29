//! Meeting-room collaborator.
//!
//! User-facing sessions join the live room with the caller's token, speak
//! into it and read transcribed utterances from it. Background sessions
//! never touch a room.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use huddle_models::{MeetingId, VoiceParams};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::RoomError;

/// Parameters for joining a room.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinRequest {
    pub meeting_id: MeetingId,
    pub auth_token: String,
    pub display_name: String,
    pub voice: Option<VoiceParams>,
}

/// A real-time meeting room.
#[async_trait]
pub trait MeetingRoom: Send + Sync {
    /// Attaches to the room.
    async fn join(&self, request: &JoinRequest) -> Result<(), RoomError>;

    /// Speaks `text` into the room.
    async fn say(&self, text: &str) -> Result<(), RoomError>;

    /// Waits for the next transcribed user utterance.
    ///
    /// Returns `None` once the room is closed.
    async fn next_utterance(&self) -> Option<String>;

    /// Detaches from the room. Safe to call more than once.
    async fn leave(&self);
}

/// Creates rooms for user-facing sessions.
pub trait RoomFactory: Send + Sync {
    /// Creates a room handle for `meeting_id`.
    fn create(&self, meeting_id: &MeetingId) -> Arc<dyn MeetingRoom>;
}

#[derive(Default)]
struct RoomState {
    joined: Option<JoinRequest>,
    spoken: Vec<String>,
    left: bool,
}

/// In-process room.
///
/// Utterances are pushed in by the host (or a test); spoken lines are
/// recorded and can be read back.
pub struct LocalRoom {
    state: Mutex<RoomState>,
    utterance_tx: Mutex<Option<mpsc::UnboundedSender<String>>>,
    utterance_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<String>>,
}

impl LocalRoom {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state: Mutex::new(RoomState::default()),
            utterance_tx: Mutex::new(Some(tx)),
            utterance_rx: tokio::sync::Mutex::new(rx),
        }
    }

    /// Queues a user utterance. Returns false if the room is closed.
    pub fn push_utterance(&self, text: impl Into<String>) -> bool {
        self.utterance_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|tx| tx.send(text.into()).is_ok())
    }

    /// Ends the utterance stream.
    pub fn close(&self) {
        self.utterance_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Lines spoken so far.
    pub fn spoken(&self) -> Vec<String> {
        self.lock_state().spoken.clone()
    }

    /// The join request, if joined.
    pub fn joined(&self) -> Option<JoinRequest> {
        self.lock_state().joined.clone()
    }

    /// Returns true once `leave` has been called.
    pub fn has_left(&self) -> bool {
        self.lock_state().left
    }

    fn lock_state(&self) -> MutexGuard<'_, RoomState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for LocalRoom {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MeetingRoom for LocalRoom {
    async fn join(&self, request: &JoinRequest) -> Result<(), RoomError> {
        if request.auth_token.trim().is_empty() {
            return Err(RoomError::Join("empty auth token".to_string()));
        }
        let mut state = self.lock_state();
        state.joined = Some(request.clone());
        state.left = false;
        info!(
            meeting_id = %request.meeting_id,
            display_name = %request.display_name,
            "joined room"
        );
        Ok(())
    }

    async fn say(&self, text: &str) -> Result<(), RoomError> {
        let mut state = self.lock_state();
        if state.joined.is_none() || state.left {
            return Err(RoomError::NotJoined);
        }
        debug!(text = %text, "speaking");
        state.spoken.push(text.to_string());
        Ok(())
    }

    async fn next_utterance(&self) -> Option<String> {
        self.utterance_rx.lock().await.recv().await
    }

    async fn leave(&self) {
        self.lock_state().left = true;
        self.close();
    }
}

/// Factory keeping the latest [`LocalRoom`] per meeting.
#[derive(Default)]
pub struct LocalRoomFactory {
    rooms: Mutex<HashMap<MeetingId, Arc<LocalRoom>>>,
}

impl LocalRoomFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently created room for `meeting_id`.
    pub fn room(&self, meeting_id: &MeetingId) -> Option<Arc<LocalRoom>> {
        self.rooms
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(meeting_id)
            .cloned()
    }
}

impl RoomFactory for LocalRoomFactory {
    fn create(&self, meeting_id: &MeetingId) -> Arc<dyn MeetingRoom> {
        let room = Arc::new(LocalRoom::new());
        self.rooms
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(meeting_id.clone(), Arc::clone(&room));
        room
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(token: &str) -> JoinRequest {
        JoinRequest {
            meeting_id: "meet-123".into(),
            auth_token: token.to_string(),
            display_name: "Travel Agent".to_string(),
            voice: None,
        }
    }

    #[tokio::test]
    async fn test_say_requires_join() {
        let room = LocalRoom::new();
        assert_eq!(room.say("hello").await, Err(RoomError::NotJoined));

        room.join(&request("tok")).await.unwrap();
        room.say("hello").await.unwrap();
        assert_eq!(room.spoken(), vec!["hello".to_string()]);

        room.leave().await;
        room.leave().await;
        assert!(room.has_left());
        assert_eq!(room.say("again").await, Err(RoomError::NotJoined));
    }

    #[tokio::test]
    async fn test_join_rejects_empty_token() {
        let room = LocalRoom::new();
        assert!(matches!(room.join(&request("  ")).await, Err(RoomError::Join(_))));
        assert!(room.joined().is_none());
    }

    #[tokio::test]
    async fn test_utterances_end_on_close() {
        let room = LocalRoom::new();
        assert!(room.push_utterance("I want to go to Lisbon"));
        room.close();
        assert!(!room.push_utterance("ignored"));

        assert_eq!(room.next_utterance().await.as_deref(), Some("I want to go to Lisbon"));
        assert_eq!(room.next_utterance().await, None);
    }

    #[test]
    fn test_factory_keeps_latest_room() {
        let factory = LocalRoomFactory::new();
        let meeting: MeetingId = "meet-123".into();
        let _first = factory.create(&meeting);
        let _second = factory.create(&meeting);
        assert!(factory.room(&meeting).is_some());
        assert!(factory.room(&"other".into()).is_none());
    }
}
