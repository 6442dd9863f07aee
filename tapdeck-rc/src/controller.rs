//! View controller
//!
//! One controller task owns every piece of per-view state: the seek
//! accelerator, the position scheduler and the queue cursor are plain
//! structs mutated only from this task, so none of them need locks. The
//! only concurrency is the engine connection behind the proxy.
//!
//! The loop holds at most one pending refresh wake. Input effects and
//! engine notices replace it with an immediate tick (cancel-and-replace),
//! so a poke plus a pending wake still yields exactly one next tick.

use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use tapdeck_common::events::EngineNotice;

use crate::config::Config;
use crate::control::input::{DragEvent, InputPulse, ScrollState, TapControl};
use crate::control::pager::QueueCursor;
use crate::control::refresh::PositionScheduler;
use crate::control::scan::{PulseEffect, SeekAccelerator};
use crate::error::Result;
use crate::remote::lifecycle::EngineLink;
use crate::remote::proxy::{EngineProxy, RepeatMode, ShuffleMode};
use crate::render::Render;

/// Events fed to a controller by its input surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlInput {
    /// Directional hold pulse
    Pulse(InputPulse),
    /// Progress bar drag began (touch tracking started)
    DragStarted,
    /// Progress bar moved
    Drag(DragEvent),
    /// Progress bar drag ended
    DragReleased,
    /// Discrete control tap
    Tap(TapControl),
    /// Pager scroll state transition
    PagerScroll(ScrollState),
    /// Pager settled on a page
    PagerPage(usize),
}

/// Per-view controller over one engine link
pub struct Controller<R: Render> {
    proxy: EngineProxy,
    connected: tokio::sync::watch::Receiver<bool>,
    scheduler: PositionScheduler,
    accel: SeekAccelerator,
    cursor: QueueCursor,
    render: R,
}

impl<R: Render> Controller<R> {
    /// Build a controller for a view attached to `link`
    ///
    /// Fails only when the queue window cannot be constructed; that is the
    /// signal to close the view.
    pub async fn attach(link: &EngineLink, config: &Config, render: R) -> Result<Self> {
        Self::from_parts(link.proxy(), link.watch_connected(), config, render).await
    }

    /// Build a controller from a proxy and connection watch directly
    ///
    /// The seam the engine link and in-process test engines share.
    pub async fn from_parts(
        proxy: EngineProxy,
        connected: tokio::sync::watch::Receiver<bool>,
        config: &Config,
        render: R,
    ) -> Result<Self> {
        let cursor = QueueCursor::attach(&proxy).await?;

        Ok(Self {
            proxy,
            connected,
            scheduler: PositionScheduler::new(config.render_width),
            accel: SeekAccelerator::new(),
            cursor,
            render,
        })
    }

    /// Drive the view until the input channel closes
    ///
    /// Closing the input channel is the teardown signal: the pending wake
    /// is dropped and a hold session in progress is discarded without a
    /// final seek.
    pub async fn run(
        mut self,
        mut input_rx: mpsc::Receiver<ControlInput>,
        mut notices: broadcast::Receiver<EngineNotice>,
    ) -> Result<()> {
        self.initial_sync().await;

        let mut connected_rx = self.connected.clone();
        let mut notices_open = true;
        let mut connected_watch_open = true;
        let mut next_tick = Instant::now();

        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(next_tick) => {
                    let connected = *connected_rx.borrow();
                    let plan = self
                        .scheduler
                        .tick(&self.proxy, connected, self.accel.override_ms(), &mut self.render)
                        .await;
                    next_tick = Instant::now() + plan.delay();
                }

                maybe_input = input_rx.recv() => {
                    match maybe_input {
                        Some(input) => {
                            if self.handle_input(input).await == PulseEffect::Refresh {
                                next_tick = Instant::now();
                            }
                        }
                        None => break,
                    }
                }

                notice = notices.recv(), if notices_open => {
                    match notice {
                        Ok(notice) => {
                            if self.handle_notice(notice).await {
                                next_tick = Instant::now();
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Notice stream lagged, forcing resync");
                            next_tick = Instant::now();
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            notices_open = false;
                        }
                    }
                }

                changed = connected_rx.changed(), if connected_watch_open => {
                    match changed {
                        Ok(()) => {
                            let connected = *connected_rx.borrow();
                            info!(connected, "Engine connection state changed");
                            next_tick = Instant::now();
                        }
                        Err(_) => connected_watch_open = false,
                    }
                }
            }
        }

        // Teardown: discard any hold in progress, no final seek
        self.accel.abandon();
        debug!("Controller torn down");
        Ok(())
    }

    /// First sync after attach, before the loop starts ticking
    async fn initial_sync(&mut self) {
        self.scheduler
            .refresh_track_info(&self.proxy, &mut self.render)
            .await;
        self.scheduler.update_seek_controls(&mut self.render);
        self.render_playstate().await;
        if let Err(e) = self.cursor.resync(&self.proxy, &mut self.render).await {
            debug!(error = %e, "Initial queue page sync failed");
        }
    }

    async fn handle_input(&mut self, input: ControlInput) -> PulseEffect {
        match input {
            ControlInput::Pulse(pulse) => self.accel.pulse(&self.proxy, pulse).await,
            ControlInput::DragStarted => {
                self.accel.drag_started();
                PulseEffect::None
            }
            ControlInput::Drag(event) => {
                self.accel
                    .drag(&self.proxy, event, self.scheduler.duration_ms())
                    .await
            }
            ControlInput::DragReleased => {
                self.accel.drag_released();
                PulseEffect::None
            }
            ControlInput::Tap(tap) => self.handle_tap(tap).await,
            ControlInput::PagerScroll(state) => {
                self.cursor.scroll_state(state);
                PulseEffect::None
            }
            ControlInput::PagerPage(page) => {
                if let Err(e) = self.cursor.page_selected(&self.proxy, page).await {
                    debug!(error = %e, page, "Queue page settle failed");
                }
                PulseEffect::None
            }
        }
    }

    async fn handle_tap(&mut self, tap: TapControl) -> PulseEffect {
        match tap {
            TapControl::PlayPause => {
                match self.proxy.is_playing().await {
                    Ok(true) => {
                        if let Err(e) = self.proxy.pause().await {
                            debug!(error = %e, "Pause failed");
                            return PulseEffect::None;
                        }
                    }
                    Ok(false) => {
                        if let Err(e) = self.proxy.play().await {
                            debug!(error = %e, "Play failed");
                            return PulseEffect::None;
                        }
                    }
                    Err(e) => {
                        debug!(error = %e, "Playstate query failed");
                        return PulseEffect::None;
                    }
                }
                self.render_playstate().await;
                PulseEffect::Refresh
            }
            TapControl::Prev => {
                if let Err(e) = self.proxy.prev().await {
                    debug!(error = %e, "Prev failed");
                }
                PulseEffect::None
            }
            TapControl::Next => {
                if let Err(e) = self.proxy.next().await {
                    debug!(error = %e, "Next failed");
                }
                PulseEffect::None
            }
            TapControl::Shuffle => {
                self.toggle_shuffle().await;
                PulseEffect::None
            }
            TapControl::Repeat => {
                self.cycle_repeat().await;
                PulseEffect::None
            }
        }
    }

    /// Shuffle off <-> on; switching on while repeating one track demotes
    /// repeat to the whole queue
    async fn toggle_shuffle(&mut self) {
        let mode = match self.proxy.shuffle_mode().await {
            Ok(m) => m,
            Err(e) => {
                debug!(error = %e, "Shuffle query failed");
                return;
            }
        };

        match mode {
            ShuffleMode::None => {
                if self.proxy.set_shuffle_mode(ShuffleMode::Normal).await.is_err() {
                    return;
                }
                if let Ok(RepeatMode::Current) = self.proxy.repeat_mode().await {
                    if self.proxy.set_repeat_mode(RepeatMode::All).await.is_ok() {
                        self.render.render_repeat(RepeatMode::All);
                    }
                }
                self.render.render_shuffle(true);
            }
            ShuffleMode::Normal => {
                if self.proxy.set_shuffle_mode(ShuffleMode::None).await.is_err() {
                    return;
                }
                self.render.render_shuffle(false);
            }
        }
    }

    /// Repeat none -> all -> current -> none; repeating one track clears
    /// shuffle
    async fn cycle_repeat(&mut self) {
        let mode = match self.proxy.repeat_mode().await {
            Ok(m) => m,
            Err(e) => {
                debug!(error = %e, "Repeat query failed");
                return;
            }
        };

        match mode {
            RepeatMode::None => {
                if self.proxy.set_repeat_mode(RepeatMode::All).await.is_ok() {
                    self.render.render_repeat(RepeatMode::All);
                }
            }
            RepeatMode::All => {
                if self.proxy.set_repeat_mode(RepeatMode::Current).await.is_err() {
                    return;
                }
                if let Ok(ShuffleMode::Normal) = self.proxy.shuffle_mode().await {
                    if self.proxy.set_shuffle_mode(ShuffleMode::None).await.is_ok() {
                        self.render.render_shuffle(false);
                    }
                }
                self.render.render_repeat(RepeatMode::Current);
            }
            RepeatMode::Current => {
                if self.proxy.set_repeat_mode(RepeatMode::None).await.is_ok() {
                    self.render.render_repeat(RepeatMode::None);
                }
            }
        }
    }

    /// Handle one engine notice; returns true when the refresh loop should
    /// tick immediately
    async fn handle_notice(&mut self, notice: EngineNotice) -> bool {
        match notice {
            EngineNotice::MetadataChanged { .. } => {
                self.scheduler
                    .refresh_track_info(&self.proxy, &mut self.render)
                    .await;
                self.scheduler.update_seek_controls(&mut self.render);
                self.render_playstate().await;
                if let Err(e) = self.cursor.resync(&self.proxy, &mut self.render).await {
                    debug!(error = %e, "Queue page resync failed");
                }
                true
            }
            EngineNotice::PlaystateChanged { playing, .. } => {
                self.render.render_playing(playing);
                true
            }
            EngineNotice::QueueChanged { length, .. } => {
                self.cursor.queue_resized(length);
                false
            }
            EngineNotice::KeepAlive { .. } => false,
        }
    }

    async fn render_playstate(&mut self) {
        match self.proxy.is_playing().await {
            Ok(playing) => self.render.render_playing(playing),
            Err(e) => debug!(error = %e, "Playstate query failed"),
        }
    }
}
