//! HTTP transport to the playback engine
//!
//! Two tasks cross the process boundary:
//! - the request task ([`HttpTransport::run`]) consumes [`EngineRequest`]s
//!   sequentially and maps them onto the engine's REST endpoints;
//! - the notice listener ([`run_notice_stream`]) holds the engine's event
//!   stream open and fans decoded notices out on the [`EventBus`].
//!
//! The request task never issues a command while the connection is marked
//! down; it answers `Unavailable` immediately instead.

use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use tapdeck_common::events::{EngineNotice, EventBus};

use crate::error::{EngineError, EngineResult, Error, Result};
use crate::remote::proxy::{EngineRequest, PlaybackSnapshot, RepeatMode, ShuffleMode, TrackInfo};

const USER_AGENT: &str = concat!("tapdeck/", env!("CARGO_PKG_VERSION"));

/// Connect timeout for the long-lived event stream request
const STREAM_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// ========================================
// Wire types
// ========================================

#[derive(Debug, Deserialize)]
struct PositionResponse {
    position_ms: i64,
    duration_ms: i64,
    playing: bool,
}

#[derive(Debug, Deserialize)]
struct QueueResponse {
    length: usize,
    position: usize,
}

#[derive(Debug, Deserialize)]
struct ShuffleResponse {
    mode: ShuffleMode,
}

#[derive(Debug, Deserialize)]
struct RepeatResponse {
    mode: RepeatMode,
}

#[derive(Debug, Serialize)]
struct SeekBody {
    position_ms: i64,
}

#[derive(Debug, Serialize)]
struct QueuePositionBody {
    index: usize,
}

#[derive(Debug, Serialize)]
struct ShuffleBody {
    mode: ShuffleMode,
}

#[derive(Debug, Serialize)]
struct RepeatBody {
    mode: RepeatMode,
}

// ========================================
// Client construction
// ========================================

/// Build the request client with a bounded per-request timeout
pub fn build_client(call_timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(call_timeout)
        .build()
        .map_err(|e| Error::Connect(e.to_string()))
}

/// Build the event-stream client
///
/// No total timeout here: the stream request stays open for the life of
/// the connection. Only the initial connect is bounded.
pub fn build_stream_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(STREAM_CONNECT_TIMEOUT)
        .build()
        .map_err(|e| Error::Connect(e.to_string()))
}

/// Probe the engine's health endpoint; used once at attach time
pub async fn health_check(client: &reqwest::Client, base_url: &str) -> Result<()> {
    let url = format!("{}/health", base_url);
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| Error::Connect(format!("engine not reachable: {}", e)))?;
    if !response.status().is_success() {
        return Err(Error::Connect(format!(
            "engine health check failed: {}",
            response.status()
        )));
    }
    Ok(())
}

fn map_request_error(e: reqwest::Error) -> EngineError {
    if e.is_timeout() {
        EngineError::Timeout
    } else {
        EngineError::Unavailable
    }
}

// ========================================
// Request task
// ========================================

/// Sequential consumer of [`EngineRequest`]s
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    connected: watch::Receiver<bool>,
}

impl HttpTransport {
    pub fn new(
        client: reqwest::Client,
        base_url: String,
        connected: watch::Receiver<bool>,
    ) -> Self {
        Self {
            client,
            base_url,
            connected,
        }
    }

    /// Serve requests until every proxy handle is dropped
    pub async fn run(self, mut rx: mpsc::Receiver<EngineRequest>) {
        while let Some(request) = rx.recv().await {
            self.handle(request).await;
        }
        debug!("Engine request channel closed, transport task exiting");
    }

    async fn handle(&self, request: EngineRequest) {
        // While disconnected no command reaches the wire
        if !*self.connected.borrow() {
            answer_unavailable(request);
            return;
        }

        match request {
            EngineRequest::Position { reply } => {
                let result = self
                    .get_json::<PositionResponse>("/api/v1/playback/position")
                    .await
                    .map(|r| r.position_ms);
                let _ = reply.send(result);
            }
            EngineRequest::Duration { reply } => {
                let result = self
                    .get_json::<PositionResponse>("/api/v1/playback/position")
                    .await
                    .map(|r| r.duration_ms);
                let _ = reply.send(result);
            }
            EngineRequest::Snapshot { reply } => {
                let result = self
                    .get_json::<PositionResponse>("/api/v1/playback/position")
                    .await
                    .map(|r| PlaybackSnapshot {
                        position_ms: r.position_ms,
                        duration_ms: r.duration_ms,
                        is_playing: r.playing,
                    });
                let _ = reply.send(result);
            }
            EngineRequest::Seek { target_ms, reply } => {
                let result = self
                    .post_json(
                        "/api/v1/playback/seek",
                        &SeekBody {
                            position_ms: target_ms,
                        },
                    )
                    .await;
                let _ = reply.send(result);
            }
            EngineRequest::Play { reply } => {
                let _ = reply.send(self.post_empty("/api/v1/playback/play").await);
            }
            EngineRequest::Pause { reply } => {
                let _ = reply.send(self.post_empty("/api/v1/playback/pause").await);
            }
            EngineRequest::IsPlaying { reply } => {
                let result = self
                    .get_json::<PositionResponse>("/api/v1/playback/position")
                    .await
                    .map(|r| r.playing);
                let _ = reply.send(result);
            }
            EngineRequest::Next { reply } => {
                let _ = reply.send(self.post_empty("/api/v1/playback/next").await);
            }
            EngineRequest::Prev { reply } => {
                let _ = reply.send(self.post_empty("/api/v1/playback/previous").await);
            }
            EngineRequest::QueueLength { reply } => {
                let result = self
                    .get_json::<QueueResponse>("/api/v1/playback/queue")
                    .await
                    .map(|r| r.length);
                let _ = reply.send(result);
            }
            EngineRequest::QueuePosition { reply } => {
                let result = self
                    .get_json::<QueueResponse>("/api/v1/playback/queue")
                    .await
                    .map(|r| r.position);
                let _ = reply.send(result);
            }
            EngineRequest::SetQueuePosition { index, reply } => {
                let result = self
                    .post_json("/api/v1/playback/queue/position", &QueuePositionBody { index })
                    .await;
                let _ = reply.send(result);
            }
            EngineRequest::ShuffleMode { reply } => {
                let result = self
                    .get_json::<ShuffleResponse>("/api/v1/playback/shuffle")
                    .await
                    .map(|r| r.mode);
                let _ = reply.send(result);
            }
            EngineRequest::SetShuffleMode { mode, reply } => {
                let result = self
                    .post_json("/api/v1/playback/shuffle", &ShuffleBody { mode })
                    .await;
                let _ = reply.send(result);
            }
            EngineRequest::RepeatMode { reply } => {
                let result = self
                    .get_json::<RepeatResponse>("/api/v1/playback/repeat")
                    .await
                    .map(|r| r.mode);
                let _ = reply.send(result);
            }
            EngineRequest::SetRepeatMode { mode, reply } => {
                let result = self
                    .post_json("/api/v1/playback/repeat", &RepeatBody { mode })
                    .await;
                let _ = reply.send(result);
            }
            EngineRequest::TrackInfo { reply } => {
                let result = self.get_json::<TrackInfo>("/api/v1/playback/track").await;
                let _ = reply.send(result);
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> EngineResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = %status, "Engine query failed");
            return Err(EngineError::Unavailable);
        }

        response.json::<T>().await.map_err(map_request_error)
    }

    async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> EngineResult<()> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = %status, "Engine command failed");
            return Err(EngineError::Unavailable);
        }
        Ok(())
    }

    async fn post_empty(&self, path: &str) -> EngineResult<()> {
        self.post_json(path, &serde_json::json!({})).await
    }
}

fn answer_unavailable(request: EngineRequest) {
    match request {
        EngineRequest::Position { reply } | EngineRequest::Duration { reply } => {
            let _ = reply.send(Err(EngineError::Unavailable));
        }
        EngineRequest::Snapshot { reply } => {
            let _ = reply.send(Err(EngineError::Unavailable));
        }
        EngineRequest::Seek { reply, .. }
        | EngineRequest::Play { reply }
        | EngineRequest::Pause { reply }
        | EngineRequest::Next { reply }
        | EngineRequest::Prev { reply }
        | EngineRequest::SetQueuePosition { reply, .. }
        | EngineRequest::SetShuffleMode { reply, .. }
        | EngineRequest::SetRepeatMode { reply, .. } => {
            let _ = reply.send(Err(EngineError::Unavailable));
        }
        EngineRequest::IsPlaying { reply } => {
            let _ = reply.send(Err(EngineError::Unavailable));
        }
        EngineRequest::QueueLength { reply } | EngineRequest::QueuePosition { reply } => {
            let _ = reply.send(Err(EngineError::Unavailable));
        }
        EngineRequest::ShuffleMode { reply } => {
            let _ = reply.send(Err(EngineError::Unavailable));
        }
        EngineRequest::RepeatMode { reply } => {
            let _ = reply.send(Err(EngineError::Unavailable));
        }
        EngineRequest::TrackInfo { reply } => {
            let _ = reply.send(Err(EngineError::Unavailable));
        }
    }
}

// ========================================
// Event stream listener
// ========================================

/// One `event:`/`data:` frame from the engine's event stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// Event name (empty when the frame carried none)
    pub event: String,
    /// Data payload (multi-line data joined with newlines)
    pub data: String,
}

/// Incremental decoder for the line-oriented event-stream framing
///
/// Feed raw chunks as they arrive; complete frames come back out. Partial
/// lines and frames are buffered across pushes.
#[derive(Debug, Default)]
pub struct SseFrameDecoder {
    buf: String,
    event: String,
    data: Vec<String>,
}

impl SseFrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a chunk of bytes, returning any frames it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buf.push_str(&String::from_utf8_lossy(chunk));

        let mut frames = Vec::new();
        while let Some(newline) = self.buf.find('\n') {
            let line: String = self.buf.drain(..=newline).collect();
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                // Blank line terminates a frame
                if !self.data.is_empty() || !self.event.is_empty() {
                    frames.push(SseFrame {
                        event: std::mem::take(&mut self.event),
                        data: std::mem::take(&mut self.data).join("\n"),
                    });
                }
            } else if let Some(value) = line.strip_prefix("event:") {
                self.event = value.trim_start().to_string();
            } else if let Some(value) = line.strip_prefix("data:") {
                self.data.push(value.trim_start().to_string());
            }
            // id: and comment lines are ignored
        }
        frames
    }
}

/// Hold the engine's event stream open and fan notices out on the bus
///
/// When the stream ends or errors the connection is marked down: the
/// engine process going away must push every component into its
/// disconnected branch rather than leaving them on stale state.
pub async fn run_notice_stream(
    client: reqwest::Client,
    base_url: String,
    bus: EventBus,
    connected: watch::Sender<bool>,
) {
    let url = format!("{}/api/v1/events", base_url);

    let response = match client
        .get(&url)
        .header("accept", "text/event-stream")
        .send()
        .await
    {
        Ok(r) if r.status().is_success() => r,
        Ok(r) => {
            warn!(status = %r.status(), "Event stream rejected");
            let _ = connected.send(false);
            return;
        }
        Err(e) => {
            warn!(error = %e, "Event stream connect failed");
            let _ = connected.send(false);
            return;
        }
    };

    let mut stream = response.bytes_stream();
    let mut decoder = SseFrameDecoder::new();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Event stream read failed");
                break;
            }
        };

        for frame in decoder.push(&chunk) {
            match serde_json::from_str::<EngineNotice>(&frame.data) {
                Ok(notice) => {
                    debug!(notice = notice.notice_type(), "Engine notice");
                    bus.emit_lossy(notice);
                }
                Err(e) => {
                    debug!(error = %e, event = %frame.event, "Undecodable notice frame");
                }
            }
        }
    }

    // Stream ended: the engine went away
    let _ = connected.send(false);
    debug!("Event stream closed, connection marked down");
}
