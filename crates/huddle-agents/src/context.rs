//! Per-session handle given to agent hooks, tools and handlers.

use std::sync::Arc;

use huddle_bus::{A2ABus, Delivery};
use huddle_models::{AgentId, MeetingId, MessagePayload};
use tokio::sync::watch;
use tracing::warn;

use crate::pipeline::Pipeline;
use crate::room::MeetingRoom;

/// Cooperative stop flag shared by a session and its agent.
///
/// Stopping is idempotent and never fails.
#[derive(Debug, Clone)]
pub struct StopSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl StopSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Raises the flag. Returns true on the first call only.
    pub fn stop(&self) -> bool {
        self.tx.send_if_modified(|stopped| {
            if *stopped {
                false
            } else {
                *stopped = true;
                true
            }
        })
    }

    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the flag is raised.
    pub async fn stopped(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// What an agent sees of its session.
#[derive(Clone)]
pub struct AgentContext {
    pub meeting_id: MeetingId,
    pub agent_id: AgentId,
    pub bus: A2ABus,
    pub pipeline: Arc<dyn Pipeline>,
    pub room: Option<Arc<dyn MeetingRoom>>,
    pub stop: StopSignal,
}

impl AgentContext {
    /// Speaks into the room. Background agents have no room and say nothing.
    pub async fn say(&self, text: &str) {
        let Some(room) = &self.room else {
            return;
        };
        if let Err(e) = room.say(text).await {
            warn!(
                meeting_id = %self.meeting_id,
                agent_id = %self.agent_id,
                error = %e,
                "failed to speak"
            );
        }
    }

    /// Sends a message from this agent.
    pub fn send(&self, to: &AgentId, payload: MessagePayload) -> Delivery {
        self.bus.send(&self.agent_id, to, payload)
    }

    /// Asks this agent's own session to end.
    pub fn request_stop(&self) -> bool {
        self.stop.stop()
    }

    /// Returns true if the session is user-facing.
    pub fn is_user_facing(&self) -> bool {
        self.room.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let stop = StopSignal::new();
        assert!(!stop.is_stopped());
        assert!(stop.stop());
        assert!(!stop.stop());
        assert!(stop.is_stopped());
        stop.stopped().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_wakes_waiter() {
        let stop = StopSignal::new();
        let waiter = {
            let stop = stop.clone();
            tokio::spawn(async move { stop.stopped().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());
        stop.stop();
        waiter.await.unwrap();
    }
}
