//! Directional-seek acceleration
//!
//! Converts a stream of hold pulses into seek commands with a two-stage
//! speed ramp and track-boundary rollover. One [`SeekAccelerator`] owns at
//! most one [`SeekSession`] at a time; the session is created when a hold
//! begins, mutated on every pulse, and destroyed on release. While a
//! session (or an active bar drag) holds an override position, the refresh
//! loop displays it instead of freshly polled positions, so poll latency
//! never makes the indicator jump backwards mid-gesture.

use tokio::time::{Duration, Instant};
use tracing::debug;

use crate::control::input::{DragEvent, InputPulse, SeekDirection};
use crate::error::EngineResult;
use crate::remote::proxy::EngineProxy;

/// Hold time at which the ramp switches from fine to fast scanning
pub const RAMP_KNEE_MS: i64 = 5000;

/// Seek speed multiplier below the knee
const FINE_MULTIPLIER: i64 = 10;

/// Seek speed multiplier above the knee
const FAST_MULTIPLIER: i64 = 40;

/// Minimum ramped-time spacing between seek commands during a hold
const COMMAND_SPACING_MS: i64 = 250;

/// Minimum wall-clock spacing between seek commands while dragging the bar
const DRAG_COMMAND_SPACING: Duration = Duration::from_millis(250);

/// A backward tap this far into the track restarts it instead of skipping
const TAP_RESTART_THRESHOLD_MS: i64 = 1000;

/// Convert hold time into seek distance
///
/// Fine scrubbing at 10x for the first five seconds of hold, fast scanning
/// at 40x after that. Continuous at the knee.
pub fn ramped_delta(elapsed_ms: i64) -> i64 {
    if elapsed_ms < RAMP_KNEE_MS {
        elapsed_ms * FINE_MULTIPLIER
    } else {
        RAMP_KNEE_MS * FINE_MULTIPLIER + (elapsed_ms - RAMP_KNEE_MS) * FAST_MULTIPLIER
    }
}

/// What the caller should do after feeding an input event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseEffect {
    /// Nothing to do
    None,
    /// Trigger an immediate out-of-cycle position refresh
    Refresh,
}

/// State of one directional hold
#[derive(Debug)]
struct SeekSession {
    /// Engine position captured when the hold began
    anchor_ms: i64,
    direction: SeekDirection,
    elapsed_hold_ms: i64,
    /// Ramped delta at which the last seek command was issued
    last_command_elapsed_ms: i64,
    /// Locally held position shown instead of polled positions
    override_ms: Option<i64>,
    /// False while armed, true once the first repeat pulse arrives
    seeking: bool,
}

/// Directional-seek state machine
#[derive(Debug, Default)]
pub struct SeekAccelerator {
    session: Option<SeekSession>,
    drag_from_touch: bool,
    drag_last_command: Option<Instant>,
    drag_override: Option<i64>,
}

impl SeekAccelerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Position override currently in force, if any
    ///
    /// Takes precedence over freshly polled positions until cleared on
    /// release.
    pub fn override_ms(&self) -> Option<i64> {
        self.session
            .as_ref()
            .and_then(|s| s.override_ms)
            .or(self.drag_override)
    }

    /// Whether a hold session has advanced past the armed stage
    pub fn is_seeking(&self) -> bool {
        self.session.as_ref().map_or(false, |s| s.seeking)
    }

    /// Feed one directional hold pulse
    pub async fn pulse(&mut self, proxy: &EngineProxy, pulse: InputPulse) -> PulseEffect {
        if pulse.repeat == 0 {
            // Initial press: capture the anchor, session armed but not seeking
            match proxy.position().await {
                Ok(anchor) => {
                    self.session = Some(SeekSession {
                        anchor_ms: anchor,
                        direction: pulse.direction,
                        elapsed_hold_ms: pulse.elapsed_ms,
                        last_command_elapsed_ms: 0,
                        override_ms: None,
                        seeking: false,
                    });
                }
                Err(e) => {
                    debug!(error = %e, "Hold arm failed, no session");
                }
            }
            return PulseEffect::None;
        }

        if pulse.is_release() {
            let Some(mut session) = self.session.take() else {
                return PulseEffect::None;
            };

            if !session.seeking {
                // Armed but never scanned: a short tap means adjacent-track
                // navigation, not a seek
                Self::tap_navigate(proxy, pulse.direction, session.anchor_ms).await;
                return PulseEffect::None;
            }

            // Terminal pulse: one last authoritative seek, override cleared
            match Self::scan_step(proxy, &mut session, pulse).await {
                Ok(()) => PulseEffect::Refresh,
                Err(e) => {
                    debug!(error = %e, "Terminal scan pulse abandoned");
                    PulseEffect::None
                }
            }
        } else {
            let Some(session) = self.session.as_mut() else {
                // Repeat without a preceding press; nothing to scan from
                return PulseEffect::None;
            };
            match Self::scan_step(proxy, session, pulse).await {
                Ok(()) => PulseEffect::Refresh,
                Err(e) => {
                    debug!(error = %e, "Scan pulse abandoned");
                    PulseEffect::None
                }
            }
        }
    }

    /// One scanning step of an active session
    async fn scan_step(
        proxy: &EngineProxy,
        session: &mut SeekSession,
        pulse: InputPulse,
    ) -> EngineResult<()> {
        session.seeking = true;
        session.elapsed_hold_ms = pulse.elapsed_ms;
        session.direction = pulse.direction;

        let ramp = ramped_delta(pulse.elapsed_ms);

        let candidate = match pulse.direction {
            SeekDirection::Backward => {
                let mut candidate = session.anchor_ms - ramp;
                if candidate < 0 {
                    // Ran off the start: move to the previous track and
                    // re-base against its duration
                    proxy.prev().await?;
                    let duration = proxy.duration().await?;
                    session.anchor_ms += duration;
                    candidate += duration;
                }
                candidate
            }
            SeekDirection::Forward => {
                let mut candidate = session.anchor_ms + ramp;
                let duration = proxy.duration().await?;
                if candidate >= duration {
                    // Ran off the end: move to the next track. The anchor
                    // may go negative; later pulses re-base from there.
                    proxy.next().await?;
                    session.anchor_ms -= duration;
                    candidate -= duration;
                }
                candidate
            }
        };

        // Throttle on ramped time, not wall-clock: the spacing window grows
        // with ramp speed. A release always issues the final seek.
        if ramp - session.last_command_elapsed_ms > COMMAND_SPACING_MS || pulse.is_release() {
            proxy.seek(candidate).await?;
            session.last_command_elapsed_ms = ramp;
        }

        session.override_ms = if pulse.is_release() {
            None
        } else {
            Some(candidate)
        };
        Ok(())
    }

    async fn tap_navigate(proxy: &EngineProxy, direction: SeekDirection, anchor_ms: i64) {
        let result = match direction {
            SeekDirection::Forward => proxy.next().await,
            SeekDirection::Backward => {
                if anchor_ms < TAP_RESTART_THRESHOLD_MS {
                    proxy.prev().await
                } else {
                    proxy.seek(0).await
                }
            }
        };
        if let Err(e) = result {
            debug!(error = %e, "Tap navigation failed");
        }
    }

    /// User started dragging the progress bar
    pub fn drag_started(&mut self) {
        self.drag_from_touch = true;
        self.drag_last_command = None;
    }

    /// Feed one progress bar change
    ///
    /// `duration_ms` is the current track duration the bar is scaled
    /// against. Programmatic changes (`from_user == false`) are ignored.
    pub async fn drag(
        &mut self,
        proxy: &EngineProxy,
        event: DragEvent,
        duration_ms: i64,
    ) -> PulseEffect {
        if !event.from_user {
            return PulseEffect::None;
        }

        let due = self
            .drag_last_command
            .map_or(true, |t| t.elapsed() > DRAG_COMMAND_SPACING);
        if !due {
            return PulseEffect::None;
        }
        self.drag_last_command = Some(Instant::now());

        let ratio = event.ratio.clamp(0.0, 1.0);
        let target = (duration_ms as f64 * ratio) as i64;
        self.drag_override = Some(target);

        if let Err(e) = proxy.seek(target).await {
            debug!(error = %e, "Drag seek failed");
            return PulseEffect::None;
        }

        if !self.drag_from_touch {
            // Trackball-style nudge: no touch tracking, so refresh at once
            // and let polled positions resume immediately
            self.drag_override = None;
            return PulseEffect::Refresh;
        }
        PulseEffect::None
    }

    /// User released the progress bar
    pub fn drag_released(&mut self) {
        self.drag_override = None;
        self.drag_from_touch = false;
    }

    /// Discard any session in progress without issuing a final seek
    ///
    /// Used at view teardown.
    pub fn abandon(&mut self) {
        self.session = None;
        self.drag_override = None;
        self.drag_from_touch = false;
        self.drag_last_command = None;
    }
}
