//! Typed command/query façade over the engine connection
//!
//! [`EngineProxy`] is a clonable handle over an mpsc request channel; a
//! single transport task consumes requests sequentially, which serializes
//! all engine traffic. Each request carries a oneshot reply channel, and
//! every call is wrapped in a bounded timeout: a closed channel maps to
//! [`EngineError::Unavailable`], an elapsed timer to [`EngineError::Timeout`].
//! No call ever blocks its caller indefinitely.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

/// One poll's worth of playback state
///
/// Immutable value; no lifecycle beyond the poll cycle that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    /// Current position in milliseconds (−1 = unknown)
    pub position_ms: i64,
    /// Total duration in milliseconds
    pub duration_ms: i64,
    /// Whether the engine is playing (vs paused)
    pub is_playing: bool,
}

/// Current track metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    /// Track identifier (None when nothing is loaded)
    pub track_id: Option<Uuid>,
    /// Track title
    pub title: String,
    /// Artist display name
    pub artist: String,
    /// Track duration in milliseconds
    pub duration_ms: i64,
}

/// Shuffle mode reported and accepted by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShuffleMode {
    None,
    Normal,
}

/// Repeat mode reported and accepted by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatMode {
    None,
    All,
    Current,
}

/// Requests serviced by the transport task
///
/// Each variant carries the oneshot reply channel for its result; the
/// transport answers every request it dequeues, and a dropped reply means
/// the connection went away.
#[derive(Debug)]
pub enum EngineRequest {
    Position {
        reply: oneshot::Sender<EngineResult<i64>>,
    },
    Duration {
        reply: oneshot::Sender<EngineResult<i64>>,
    },
    Snapshot {
        reply: oneshot::Sender<EngineResult<PlaybackSnapshot>>,
    },
    Seek {
        target_ms: i64,
        reply: oneshot::Sender<EngineResult<()>>,
    },
    Play {
        reply: oneshot::Sender<EngineResult<()>>,
    },
    Pause {
        reply: oneshot::Sender<EngineResult<()>>,
    },
    IsPlaying {
        reply: oneshot::Sender<EngineResult<bool>>,
    },
    Next {
        reply: oneshot::Sender<EngineResult<()>>,
    },
    Prev {
        reply: oneshot::Sender<EngineResult<()>>,
    },
    QueueLength {
        reply: oneshot::Sender<EngineResult<usize>>,
    },
    QueuePosition {
        reply: oneshot::Sender<EngineResult<usize>>,
    },
    SetQueuePosition {
        index: usize,
        reply: oneshot::Sender<EngineResult<()>>,
    },
    ShuffleMode {
        reply: oneshot::Sender<EngineResult<ShuffleMode>>,
    },
    SetShuffleMode {
        mode: ShuffleMode,
        reply: oneshot::Sender<EngineResult<()>>,
    },
    RepeatMode {
        reply: oneshot::Sender<EngineResult<RepeatMode>>,
    },
    SetRepeatMode {
        mode: RepeatMode,
        reply: oneshot::Sender<EngineResult<()>>,
    },
    TrackInfo {
        reply: oneshot::Sender<EngineResult<TrackInfo>>,
    },
}

/// Clonable command/query handle to the engine
///
/// This is the only path any component uses to reach the engine. The same
/// constructor serves the HTTP transport and in-process test engines.
#[derive(Debug, Clone)]
pub struct EngineProxy {
    tx: mpsc::Sender<EngineRequest>,
    call_timeout: Duration,
}

impl EngineProxy {
    /// Create a proxy over a request channel with the given per-call timeout
    pub fn new(tx: mpsc::Sender<EngineRequest>, call_timeout: Duration) -> Self {
        Self { tx, call_timeout }
    }

    async fn call<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<EngineResult<T>>) -> EngineRequest,
    ) -> EngineResult<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| EngineError::Unavailable)?;

        match tokio::time::timeout(self.call_timeout, reply_rx).await {
            Err(_) => Err(EngineError::Timeout),
            Ok(Err(_)) => Err(EngineError::Unavailable),
            Ok(Ok(result)) => result,
        }
    }

    /// Current position in milliseconds (−1 = unknown)
    pub async fn position(&self) -> EngineResult<i64> {
        self.call(|reply| EngineRequest::Position { reply }).await
    }

    /// Current track duration in milliseconds
    pub async fn duration(&self) -> EngineResult<i64> {
        self.call(|reply| EngineRequest::Duration { reply }).await
    }

    /// Position, duration and playstate in one round trip
    pub async fn snapshot(&self) -> EngineResult<PlaybackSnapshot> {
        self.call(|reply| EngineRequest::Snapshot { reply }).await
    }

    /// Seek to the given position in the current track
    pub async fn seek(&self, target_ms: i64) -> EngineResult<()> {
        self.call(|reply| EngineRequest::Seek { target_ms, reply })
            .await
    }

    pub async fn play(&self) -> EngineResult<()> {
        self.call(|reply| EngineRequest::Play { reply }).await
    }

    pub async fn pause(&self) -> EngineResult<()> {
        self.call(|reply| EngineRequest::Pause { reply }).await
    }

    pub async fn is_playing(&self) -> EngineResult<bool> {
        self.call(|reply| EngineRequest::IsPlaying { reply }).await
    }

    /// Advance to the next queue entry
    pub async fn next(&self) -> EngineResult<()> {
        self.call(|reply| EngineRequest::Next { reply }).await
    }

    /// Return to the previous queue entry
    pub async fn prev(&self) -> EngineResult<()> {
        self.call(|reply| EngineRequest::Prev { reply }).await
    }

    pub async fn queue_length(&self) -> EngineResult<usize> {
        self.call(|reply| EngineRequest::QueueLength { reply }).await
    }

    pub async fn queue_position(&self) -> EngineResult<usize> {
        self.call(|reply| EngineRequest::QueuePosition { reply })
            .await
    }

    pub async fn set_queue_position(&self, index: usize) -> EngineResult<()> {
        self.call(|reply| EngineRequest::SetQueuePosition { index, reply })
            .await
    }

    pub async fn shuffle_mode(&self) -> EngineResult<ShuffleMode> {
        self.call(|reply| EngineRequest::ShuffleMode { reply }).await
    }

    pub async fn set_shuffle_mode(&self, mode: ShuffleMode) -> EngineResult<()> {
        self.call(|reply| EngineRequest::SetShuffleMode { mode, reply })
            .await
    }

    pub async fn repeat_mode(&self) -> EngineResult<RepeatMode> {
        self.call(|reply| EngineRequest::RepeatMode { reply }).await
    }

    pub async fn set_repeat_mode(&self, mode: RepeatMode) -> EngineResult<()> {
        self.call(|reply| EngineRequest::SetRepeatMode { mode, reply })
            .await
    }

    /// Current track metadata
    pub async fn track_info(&self) -> EngineResult<TrackInfo> {
        self.call(|reply| EngineRequest::TrackInfo { reply }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_closed_channel_is_unavailable() {
        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        let proxy = EngineProxy::new(tx, Duration::from_millis(100));
        assert_eq!(proxy.position().await, Err(EngineError::Unavailable));
    }

    #[tokio::test]
    async fn test_dropped_reply_is_unavailable() {
        let (tx, mut rx) = mpsc::channel(4);
        let proxy = EngineProxy::new(tx, Duration::from_secs(5));

        let server = tokio::spawn(async move {
            // Dequeue the request and drop the reply channel without answering
            let req = rx.recv().await.unwrap();
            drop(req);
        });

        assert_eq!(proxy.duration().await, Err(EngineError::Unavailable));
        server.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unanswered_call_times_out() {
        let (tx, mut rx) = mpsc::channel(4);
        let proxy = EngineProxy::new(tx, Duration::from_millis(250));

        let server = tokio::spawn(async move {
            // Park the request so the reply channel stays open but silent
            let mut parked = Vec::new();
            while let Some(req) = rx.recv().await {
                parked.push(req);
            }
        });

        assert_eq!(proxy.is_playing().await, Err(EngineError::Timeout));
        drop(proxy);
        server.abort();
    }

    #[tokio::test]
    async fn test_reply_round_trip() {
        let (tx, mut rx) = mpsc::channel(4);
        let proxy = EngineProxy::new(tx, Duration::from_secs(1));

        tokio::spawn(async move {
            if let Some(EngineRequest::Snapshot { reply }) = rx.recv().await {
                let _ = reply.send(Ok(PlaybackSnapshot {
                    position_ms: 42_000,
                    duration_ms: 180_000,
                    is_playing: true,
                }));
            }
        });

        let snap = proxy.snapshot().await.unwrap();
        assert_eq!(snap.position_ms, 42_000);
        assert_eq!(snap.duration_ms, 180_000);
        assert!(snap.is_playing);
    }
}
