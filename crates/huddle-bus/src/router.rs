//! Typed message routing between agents.
//!
//! Each agent owns an inbox: a handler table keyed by [`MessageKind`] and a
//! worker task that runs handler invocations one at a time in arrival
//! order. `send` resolves the handler, queues the invocation and returns
//! without waiting for it.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::BoxFuture;
use futures::FutureExt;
use huddle_models::{A2AMessage, AgentId, MessageKind, MessagePayload};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::error::BusError;
use crate::registry::AgentRegistry;

/// Error type handlers may return.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of one handler invocation. Logged by the worker, never returned to the sender.
pub type HandlerResult = Result<(), HandlerError>;

/// A message handler installed for one (agent, kind) pair.
pub type MessageHandler = Arc<dyn Fn(A2AMessage) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Wraps an async closure as a [`MessageHandler`].
pub fn handler<F, Fut>(f: F) -> MessageHandler
where
    F: Fn(A2AMessage) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |msg| f(msg).boxed())
}

/// What happened to a sent message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Queued on the recipient's inbox.
    Queued,
    /// Recipient has no inbox.
    UnknownAgent,
    /// Recipient has no handler for the message kind.
    NoHandler,
}

impl Delivery {
    /// Returns true if the message was queued.
    pub fn is_queued(&self) -> bool {
        matches!(self, Self::Queued)
    }
}

type Job = (MessageHandler, A2AMessage);

struct Inbox {
    handlers: HashMap<MessageKind, MessageHandler>,
    tx: mpsc::UnboundedSender<Job>,
}

impl Inbox {
    fn spawn(agent_id: AgentId) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(agent_id, rx));
        Self {
            handlers: HashMap::new(),
            tx,
        }
    }
}

async fn run_worker(agent_id: AgentId, mut rx: mpsc::UnboundedReceiver<Job>) {
    while let Some((handler, msg)) = rx.recv().await {
        let kind = msg.kind();
        let from = msg.from.clone();

        match AssertUnwindSafe(handler(msg)).catch_unwind().await {
            Ok(Ok(())) => debug!(agent_id = %agent_id, kind = %kind, from = %from, "message handled"),
            Ok(Err(e)) => {
                warn!(agent_id = %agent_id, kind = %kind, from = %from, error = %e, "message handler failed")
            }
            Err(_) => {
                let e = BusError::HandlerPanicked {
                    agent: agent_id.clone(),
                    kind,
                };
                error!(error = %e, from = %from, "message handler panicked");
            }
        }
    }
    debug!(agent_id = %agent_id, "inbox closed");
}

/// Delivers typed messages to per-agent handler tables.
pub struct MessageRouter {
    registry: Arc<AgentRegistry>,
    inboxes: Mutex<HashMap<AgentId, Inbox>>,
    /// `send` calls per kind, delivered or not.
    sent: Mutex<HashMap<MessageKind, u64>>,
}

impl MessageRouter {
    /// Creates a router that attaches sender cards from `registry`.
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self {
            registry,
            inboxes: Mutex::new(HashMap::new()),
            sent: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<AgentId, Inbox>> {
        self.inboxes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Installs `handler` as the handler for `kind` on `agent_id`.
    ///
    /// Replaces any previous handler for the pair. Returns true if one was
    /// replaced. Must be called inside a tokio runtime.
    pub fn on_message(&self, agent_id: &AgentId, kind: MessageKind, handler: MessageHandler) -> bool {
        let mut inboxes = self.lock();
        let inbox = inboxes
            .entry(agent_id.clone())
            .or_insert_with(|| Inbox::spawn(agent_id.clone()));
        let replaced = inbox.handlers.insert(kind, handler).is_some();

        debug!(agent_id = %agent_id, kind = %kind, replaced, "handler installed");
        replaced
    }

    /// Sends `payload` from `from` to `to`.
    ///
    /// Never fails from the sender's point of view; a routing miss is
    /// logged and reported through the returned [`Delivery`].
    pub fn send(&self, from: &AgentId, to: &AgentId, payload: MessagePayload) -> Delivery {
        let kind = payload.kind();
        *self
            .sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(kind)
            .or_default() += 1;

        let job = {
            let inboxes = self.lock();
            let Some(inbox) = inboxes.get(to) else {
                warn!(from = %from, to = %to, kind = %kind, "routing miss: unknown agent");
                return Delivery::UnknownAgent;
            };
            let Some(handler) = inbox.handlers.get(&kind) else {
                warn!(from = %from, to = %to, kind = %kind, "routing miss: no handler");
                return Delivery::NoHandler;
            };
            (handler.clone(), inbox.tx.clone())
        };

        let (handler, tx) = job;
        let msg = A2AMessage::new(from.clone(), to.clone(), payload)
            .with_sender_card(self.registry.get(from));

        if tx.send((handler, msg)).is_err() {
            warn!(from = %from, to = %to, kind = %kind, "routing miss: inbox closed");
            return Delivery::UnknownAgent;
        }
        debug!(from = %from, to = %to, kind = %kind, "message queued");
        Delivery::Queued
    }

    /// Drops the agent's inbox. Queued invocations still run.
    pub fn remove_agent(&self, agent_id: &AgentId) -> bool {
        self.lock().remove(agent_id).is_some()
    }

    /// Message kinds `agent_id` has handlers for, sorted.
    pub fn handler_kinds(&self, agent_id: &AgentId) -> Vec<MessageKind> {
        let mut kinds: Vec<MessageKind> = self
            .lock()
            .get(agent_id)
            .map(|inbox| inbox.handlers.keys().copied().collect())
            .unwrap_or_default();
        kinds.sort();
        kinds
    }

    /// Number of `send` calls made for `kind`, including routing misses.
    pub fn sent_count(&self, kind: MessageKind) -> u64 {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .copied()
            .unwrap_or_default()
    }

    /// Returns true if `agent_id` has an inbox.
    pub fn has_agent(&self, agent_id: &AgentId) -> bool {
        self.lock().contains_key(agent_id)
    }
}
