//! Input boundary types
//!
//! All directional input sources produce the same tagged [`InputPulse`];
//! the seek state machine never branches on where a pulse came from.

use serde::{Deserialize, Serialize};

/// Where a pulse originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
    Touch,
    Trackball,
    Dpad,
}

/// Axis of a directional hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeekDirection {
    Backward,
    Forward,
}

/// One repeated-input event while a directional control remains pressed
///
/// `repeat` 0 is the initial press (arms a session), positive values are
/// auto-repeat pulses, and a negative value encodes the release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputPulse {
    pub source: InputSource,
    pub direction: SeekDirection,
    pub repeat: i32,
    /// Milliseconds since the press started
    pub elapsed_ms: i64,
}

impl InputPulse {
    /// Whether this pulse encodes the release of the control
    pub fn is_release(&self) -> bool {
        self.repeat < 0
    }
}

/// Progress bar drag event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragEvent {
    /// Bar position as a ratio in `[0, 1]`
    pub ratio: f64,
    /// True only for changes the user made, never for programmatic updates
    pub from_user: bool,
}

/// Paging view scroll state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollState {
    /// User started dragging the pager
    Dragging,
    /// Pager is settling after release
    Settling,
    /// Pager came to rest
    Idle,
}

/// Discrete one-shot controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapControl {
    PlayPause,
    Prev,
    Next,
    Shuffle,
    Repeat,
}
