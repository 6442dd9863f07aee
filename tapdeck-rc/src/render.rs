//! Rendering boundary
//!
//! The control surface produces display updates through this trait; what
//! sits behind it (a widget tree, a headless log) is not this crate's
//! concern. [`TraceRender`] is the production implementation for the
//! headless remote binary.

use tracing::info;

use crate::remote::proxy::{RepeatMode, TrackInfo};

/// Display surface for the transport controls
pub trait Render {
    /// Position text, e.g. `3:20` or `--:--`
    fn render_position(&mut self, text: &str);

    /// Total duration text
    fn render_total(&mut self, text: &str);

    /// Progress in permille of track duration; full scale doubles as the
    /// unknown sentinel
    fn render_progress(&mut self, permille: i64);

    /// Position counter visibility (blinks while paused)
    fn render_blink(&mut self, visible: bool);

    /// Displayed queue page
    fn render_page(&mut self, page: usize);

    /// Play/pause control state
    fn render_playing(&mut self, playing: bool);

    /// Whether seeking is currently possible
    fn render_seekable(&mut self, seekable: bool);

    /// Shuffle control state
    fn render_shuffle(&mut self, on: bool);

    /// Repeat control state
    fn render_repeat(&mut self, mode: RepeatMode);

    /// Current track metadata
    fn render_track(&mut self, info: &TrackInfo);
}

/// Log-backed render surface for the headless binary
#[derive(Debug, Default)]
pub struct TraceRender;

impl Render for TraceRender {
    fn render_position(&mut self, text: &str) {
        info!(target: "tapdeck_rc::display", position = %text);
    }

    fn render_total(&mut self, text: &str) {
        info!(target: "tapdeck_rc::display", total = %text);
    }

    fn render_progress(&mut self, permille: i64) {
        info!(target: "tapdeck_rc::display", progress = permille);
    }

    fn render_blink(&mut self, visible: bool) {
        info!(target: "tapdeck_rc::display", counter_visible = visible);
    }

    fn render_page(&mut self, page: usize) {
        info!(target: "tapdeck_rc::display", page);
    }

    fn render_playing(&mut self, playing: bool) {
        info!(target: "tapdeck_rc::display", playing);
    }

    fn render_seekable(&mut self, seekable: bool) {
        info!(target: "tapdeck_rc::display", seekable);
    }

    fn render_shuffle(&mut self, on: bool) {
        info!(target: "tapdeck_rc::display", shuffle = on);
    }

    fn render_repeat(&mut self, mode: RepeatMode) {
        info!(target: "tapdeck_rc::display", repeat = ?mode);
    }

    fn render_track(&mut self, info: &TrackInfo) {
        info!(
            target: "tapdeck_rc::display",
            title = %info.title,
            artist = %info.artist,
            "Now playing"
        );
    }
}
