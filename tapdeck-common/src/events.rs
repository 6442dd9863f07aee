//! Engine notice types and the EventBus
//!
//! The playback engine pushes notices over its event stream; the transport
//! layer decodes them into [`EngineNotice`] values and fans them out on an
//! [`EventBus`] so every interested component (refresh loop, queue pager,
//! control surface) receives its own copy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Asynchronous notices pushed by the playback engine
///
/// Notices are serialized on the engine's event stream and can be re-emitted
/// locally. Each carries the engine-side timestamp of the underlying change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineNotice {
    /// Current track changed: new metadata, new duration
    ///
    /// Triggers: track info re-read, seek control update, immediate
    /// position refresh, queue page resync.
    MetadataChanged {
        /// Track identifier (None when the engine has nothing loaded)
        track_id: Option<Uuid>,
        /// When the track changed
        timestamp: DateTime<Utc>,
    },

    /// Playback flipped between playing and paused
    PlaystateChanged {
        /// Whether the engine is now playing
        playing: bool,
        /// When the state changed
        timestamp: DateTime<Utc>,
    },

    /// Queue contents or ordering changed
    QueueChanged {
        /// New queue length
        length: usize,
        /// When the queue changed
        timestamp: DateTime<Utc>,
    },

    /// Periodic keep-alive from the engine's event stream
    KeepAlive {
        /// When the ping was emitted
        timestamp: DateTime<Utc>,
    },
}

impl EngineNotice {
    /// Get notice type as string for filtering and logging
    pub fn notice_type(&self) -> &str {
        match self {
            EngineNotice::MetadataChanged { .. } => "MetadataChanged",
            EngineNotice::PlaystateChanged { .. } => "PlaystateChanged",
            EngineNotice::QueueChanged { .. } => "QueueChanged",
            EngineNotice::KeepAlive { .. } => "KeepAlive",
        }
    }
}

/// Central distribution bus for engine notices
///
/// Wraps tokio::broadcast, providing:
/// - Non-blocking publish (slow subscribers don't block the transport)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EngineNotice>,
    capacity: usize,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future notices
    ///
    /// Notices emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineNotice> {
        self.tx.subscribe()
    }

    /// Emit a notice to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        notice: EngineNotice,
    ) -> Result<usize, broadcast::error::SendError<EngineNotice>> {
        self.tx.send(notice)
    }

    /// Emit a notice, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, notice: EngineNotice) {
        let _ = self.tx.send(notice);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
