//! Adaptive position refresh
//!
//! The refresh loop is cooperative, not a fixed-period timer: every tick
//! renders the current position and computes its own next wake delay.
//! While playing, refreshes align with the next whole-second boundary so
//! the numeric clock flips exactly on time, unless the progress bar needs
//! faster updates to move pixel-smoothly, with a floor so a long track on
//! a narrow bar never busy-polls. While paused or disconnected the loop
//! drops to a flat retry cadence.
//!
//! Scheduling is cancel-and-replace: at most one wake is ever pending, and
//! an out-of-cycle poke (seek pulse, engine notice) replaces it with an
//! immediate tick. Ticks never overlap.

use tracing::debug;

use tapdeck_common::time::{format_track_time_ms, UNKNOWN_TIME};

use crate::config::DEFAULT_RENDER_WIDTH;
use crate::remote::proxy::EngineProxy;
use crate::render::Render;

/// Full-scale progress value (permille)
pub const FULL_SCALE: i64 = 1000;

/// Flat retry delay when disconnected, paused or position is unknown
pub const RETRY_DELAY_MS: i64 = 500;

/// Floor for the smooth-motion refresh interval
const MIN_SMOOTH_DELAY_MS: i64 = 20;

/// A scheduling decision: how long until the next tick
///
/// Recomputed every tick and consumed immediately by the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPlan {
    pub next_delay_ms: i64,
}

impl RefreshPlan {
    fn retry() -> Self {
        Self {
            next_delay_ms: RETRY_DELAY_MS,
        }
    }

    pub fn delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.next_delay_ms.max(0) as u64)
    }
}

/// Next refresh delay while playing
///
/// `remaining` is the time to the next whole-second boundary of the
/// displayed position; `smooth` approximates how often the bar must move
/// by one pixel. The clock boundary wins whenever the bar would refresh
/// slower anyway.
pub fn adaptive_delay(pos_ms: i64, duration_ms: i64, render_width: u32) -> i64 {
    let remaining = 1000 - (pos_ms % 1000);

    let width = i64::from(if render_width == 0 {
        DEFAULT_RENDER_WIDTH
    } else {
        render_width
    });
    let smooth = duration_ms / width;

    if smooth > remaining {
        remaining
    } else {
        smooth.max(MIN_SMOOTH_DELAY_MS)
    }
}

/// Position indicator state and per-tick refresh logic
pub struct PositionScheduler {
    render_width: u32,
    /// Cached duration, refreshed on metadata changes
    duration_ms: i64,
    blink_visible: bool,
}

impl PositionScheduler {
    pub fn new(render_width: u32) -> Self {
        Self {
            render_width,
            duration_ms: 0,
            blink_visible: true,
        }
    }

    /// Duration the progress scale is currently based on
    pub fn duration_ms(&self) -> i64 {
        self.duration_ms
    }

    /// Re-read track duration and metadata after a metadata change
    pub async fn refresh_track_info<R: Render>(&mut self, proxy: &EngineProxy, render: &mut R) {
        match proxy.duration().await {
            Ok(duration) => {
                self.duration_ms = duration;
                render.render_total(&format_track_time_ms(duration));
            }
            Err(e) => {
                // Keep the last known duration; next notice retries
                debug!(error = %e, "Track duration re-read failed");
            }
        }

        match proxy.track_info().await {
            Ok(info) => render.render_track(&info),
            Err(e) => debug!(error = %e, "Track info re-read failed"),
        }
    }

    /// Seeking is only meaningful with a known positive duration
    pub fn update_seek_controls<R: Render>(&self, render: &mut R) {
        render.render_seekable(self.duration_ms > 0);
    }

    /// One refresh cycle: render position and progress, plan the next wake
    pub async fn tick<R: Render>(
        &mut self,
        proxy: &EngineProxy,
        connected: bool,
        override_ms: Option<i64>,
        render: &mut R,
    ) -> RefreshPlan {
        if !connected {
            render.render_position(UNKNOWN_TIME);
            render.render_progress(FULL_SCALE);
            return RefreshPlan::retry();
        }

        let snapshot = match proxy.snapshot().await {
            Ok(s) => s,
            Err(e) => {
                debug!(error = %e, "Position poll failed");
                return RefreshPlan::retry();
            }
        };

        // An override in force beats the polled position
        let pos = override_ms.unwrap_or(snapshot.position_ms);

        if pos < 0 {
            render.render_position(UNKNOWN_TIME);
            render.render_progress(FULL_SCALE);
            return RefreshPlan::retry();
        }

        render.render_position(&format_track_time_ms(pos));
        if self.duration_ms > 0 {
            render.render_progress(FULL_SCALE * pos / self.duration_ms);
        } else {
            render.render_progress(FULL_SCALE);
        }

        if !snapshot.is_playing {
            // Nothing is advancing: blink the counter on a flat cadence
            self.blink_visible = !self.blink_visible;
            render.render_blink(self.blink_visible);
            return RefreshPlan::retry();
        }

        if !self.blink_visible {
            self.blink_visible = true;
            render.render_blink(true);
        }

        RefreshPlan {
            next_delay_ms: adaptive_delay(pos, self.duration_ms, self.render_width),
        }
    }
}
