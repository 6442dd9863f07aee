#![allow(dead_code)]

//! Shared test fixtures: an in-process engine serving the request channel
//! and a recording render surface.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use tapdeck_rc::remote::proxy::{
    EngineProxy, EngineRequest, PlaybackSnapshot, RepeatMode, ShuffleMode, TrackInfo,
};
use tapdeck_rc::render::Render;

/// Commands the fake engine has been asked to execute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCall {
    Seek(i64),
    Play,
    Pause,
    Next,
    Prev,
    SetQueuePosition(usize),
    SetShuffle(ShuffleMode),
    SetRepeat(RepeatMode),
}

/// Scriptable engine state behind the fake transport
#[derive(Debug)]
pub struct EngineState {
    pub position_ms: i64,
    pub playing: bool,
    pub queue_pos: usize,
    /// Per-track durations; the current track's duration is authoritative
    pub durations: Vec<i64>,
    pub shuffle: ShuffleMode,
    pub repeat: RepeatMode,
    /// Commands received, in order
    pub calls: Vec<EngineCall>,
    /// Snapshot polls served (for tick accounting)
    pub snapshots: usize,
    /// Answer every request with Unavailable
    pub fail_all: bool,
    /// Park requests unanswered so proxy calls time out
    pub stall: bool,
}

impl EngineState {
    pub fn new(durations: Vec<i64>) -> Self {
        Self {
            position_ms: 0,
            playing: true,
            queue_pos: 0,
            durations,
            shuffle: ShuffleMode::None,
            repeat: RepeatMode::None,
            calls: Vec::new(),
            snapshots: 0,
            fail_all: false,
            stall: false,
        }
    }

    pub fn queue_len(&self) -> usize {
        self.durations.len()
    }

    pub fn duration(&self) -> i64 {
        self.durations.get(self.queue_pos).copied().unwrap_or(0)
    }

    pub fn seek_calls(&self) -> Vec<i64> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                EngineCall::Seek(target) => Some(*target),
                _ => None,
            })
            .collect()
    }
}

/// Fake engine: a task serving the proxy's request channel from scripted
/// state
pub struct FakeEngine {
    pub state: Arc<Mutex<EngineState>>,
    pub proxy: EngineProxy,
    task: JoinHandle<()>,
}

impl FakeEngine {
    pub fn spawn(state: EngineState) -> Self {
        Self::spawn_with_timeout(state, Duration::from_millis(1000))
    }

    pub fn spawn_with_timeout(state: EngineState, call_timeout: Duration) -> Self {
        let state = Arc::new(Mutex::new(state));
        let (tx, mut rx) = mpsc::channel::<EngineRequest>(32);
        let proxy = EngineProxy::new(tx, call_timeout);

        let served = state.clone();
        let task = tokio::spawn(async move {
            let mut parked = Vec::new();
            while let Some(request) = rx.recv().await {
                let mut s = served.lock().unwrap();
                if s.stall {
                    parked.push(request);
                    continue;
                }
                if s.fail_all {
                    refuse(request);
                    continue;
                }
                serve(&mut s, request);
            }
        });

        Self { state, proxy, task }
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn seek_calls(&self) -> Vec<i64> {
        self.state.lock().unwrap().seek_calls()
    }

    pub fn snapshots(&self) -> usize {
        self.state.lock().unwrap().snapshots
    }

    pub fn set_fail_all(&self, fail: bool) {
        self.state.lock().unwrap().fail_all = fail;
    }

    pub fn shutdown(self) {
        self.task.abort();
    }
}

fn serve(s: &mut EngineState, request: EngineRequest) {
    match request {
        EngineRequest::Position { reply } => {
            let _ = reply.send(Ok(s.position_ms));
        }
        EngineRequest::Duration { reply } => {
            let _ = reply.send(Ok(s.duration()));
        }
        EngineRequest::Snapshot { reply } => {
            s.snapshots += 1;
            let _ = reply.send(Ok(PlaybackSnapshot {
                position_ms: s.position_ms,
                duration_ms: s.duration(),
                is_playing: s.playing,
            }));
        }
        EngineRequest::Seek { target_ms, reply } => {
            s.calls.push(EngineCall::Seek(target_ms));
            s.position_ms = target_ms;
            let _ = reply.send(Ok(()));
        }
        EngineRequest::Play { reply } => {
            s.calls.push(EngineCall::Play);
            s.playing = true;
            let _ = reply.send(Ok(()));
        }
        EngineRequest::Pause { reply } => {
            s.calls.push(EngineCall::Pause);
            s.playing = false;
            let _ = reply.send(Ok(()));
        }
        EngineRequest::IsPlaying { reply } => {
            let _ = reply.send(Ok(s.playing));
        }
        EngineRequest::Next { reply } => {
            s.calls.push(EngineCall::Next);
            let len = s.queue_len().max(1);
            s.queue_pos = (s.queue_pos + 1) % len;
            let _ = reply.send(Ok(()));
        }
        EngineRequest::Prev { reply } => {
            s.calls.push(EngineCall::Prev);
            s.queue_pos = if s.queue_pos == 0 {
                s.queue_len().saturating_sub(1)
            } else {
                s.queue_pos - 1
            };
            let _ = reply.send(Ok(()));
        }
        EngineRequest::QueueLength { reply } => {
            let _ = reply.send(Ok(s.queue_len()));
        }
        EngineRequest::QueuePosition { reply } => {
            let _ = reply.send(Ok(s.queue_pos));
        }
        EngineRequest::SetQueuePosition { index, reply } => {
            s.calls.push(EngineCall::SetQueuePosition(index));
            s.queue_pos = index;
            let _ = reply.send(Ok(()));
        }
        EngineRequest::ShuffleMode { reply } => {
            let _ = reply.send(Ok(s.shuffle));
        }
        EngineRequest::SetShuffleMode { mode, reply } => {
            s.calls.push(EngineCall::SetShuffle(mode));
            s.shuffle = mode;
            let _ = reply.send(Ok(()));
        }
        EngineRequest::RepeatMode { reply } => {
            let _ = reply.send(Ok(s.repeat));
        }
        EngineRequest::SetRepeatMode { mode, reply } => {
            s.calls.push(EngineCall::SetRepeat(mode));
            s.repeat = mode;
            let _ = reply.send(Ok(()));
        }
        EngineRequest::TrackInfo { reply } => {
            let _ = reply.send(Ok(TrackInfo {
                track_id: None,
                title: format!("Track {}", s.queue_pos + 1),
                artist: "Test Artist".to_string(),
                duration_ms: s.duration(),
            }));
        }
    }
}

fn refuse(request: EngineRequest) {
    use tapdeck_rc::error::EngineError;
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

/// One recorded display mutation
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOp {
    Position(String),
    Total(String),
    Progress(i64),
    Blink(bool),
    Page(usize),
    Playing(bool),
    Seekable(bool),
    Shuffle(bool),
    Repeat(RepeatMode),
    Track(String),
}

/// Render surface that records every mutation for assertions
#[derive(Debug, Clone, Default)]
pub struct RecordingRender {
    ops: Arc<Mutex<Vec<RenderOp>>>,
}

impl RecordingRender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> Vec<RenderOp> {
        self.ops.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.ops.lock().unwrap().clear();
    }

    fn last_matching<T>(&self, pick: impl Fn(&RenderOp) -> Option<T>) -> Option<T> {
        self.ops.lock().unwrap().iter().rev().find_map(|op| pick(op))
    }

    pub fn last_position(&self) -> Option<String> {
        self.last_matching(|op| match op {
            RenderOp::Position(text) => Some(text.clone()),
            _ => None,
        })
    }

    pub fn last_total(&self) -> Option<String> {
        self.last_matching(|op| match op {
            RenderOp::Total(text) => Some(text.clone()),
            _ => None,
        })
    }

    pub fn last_progress(&self) -> Option<i64> {
        self.last_matching(|op| match op {
            RenderOp::Progress(permille) => Some(*permille),
            _ => None,
        })
    }

    pub fn last_page(&self) -> Option<usize> {
        self.last_matching(|op| match op {
            RenderOp::Page(page) => Some(*page),
            _ => None,
        })
    }

    pub fn blink_states(&self) -> Vec<bool> {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .filter_map(|op| match op {
                RenderOp::Blink(visible) => Some(*visible),
                _ => None,
            })
            .collect()
    }
}

impl Render for RecordingRender {
    fn render_position(&mut self, text: &str) {
        self.ops.lock().unwrap().push(RenderOp::Position(text.to_string()));
    }

    fn render_total(&mut self, text: &str) {
        self.ops.lock().unwrap().push(RenderOp::Total(text.to_string()));
    }

    fn render_progress(&mut self, permille: i64) {
        self.ops.lock().unwrap().push(RenderOp::Progress(permille));
    }

    fn render_blink(&mut self, visible: bool) {
        self.ops.lock().unwrap().push(RenderOp::Blink(visible));
    }

    fn render_page(&mut self, page: usize) {
        self.ops.lock().unwrap().push(RenderOp::Page(page));
    }

    fn render_playing(&mut self, playing: bool) {
        self.ops.lock().unwrap().push(RenderOp::Playing(playing));
    }

    fn render_seekable(&mut self, seekable: bool) {
        self.ops.lock().unwrap().push(RenderOp::Seekable(seekable));
    }

    fn render_shuffle(&mut self, on: bool) {
        self.ops.lock().unwrap().push(RenderOp::Shuffle(on));
    }

    fn render_repeat(&mut self, mode: RepeatMode) {
        self.ops.lock().unwrap().push(RenderOp::Repeat(mode));
    }

    fn render_track(&mut self, info: &TrackInfo) {
        self.ops.lock().unwrap().push(RenderOp::Track(info.title.clone()));
    }
}
