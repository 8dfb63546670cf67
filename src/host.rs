//! Command-line host for live mode and export
//!
//! Reports go to the log; playback is driven by the `live` command loop.

use std::cell::Cell;

use servo_live::{Host, ReportLevel};
use tracing::{debug, error, info, warn};

/// Host running without a UI
#[derive(Debug, Default)]
pub struct HeadlessHost {
    background: bool,
    playing: Cell<bool>,
    cancelled: Cell<bool>,
    registered: Cell<bool>,
    progress: Cell<(i64, i64)>,
}

impl HeadlessHost {
    pub fn new(background: bool) -> Self {
        Self {
            background,
            ..Default::default()
        }
    }

    /// Mark playback as running, clearing an earlier cancellation
    pub fn start_playback(&self) {
        self.cancelled.set(false);
        self.playing.set(true);
    }

    pub fn stop_playback(&self) {
        self.playing.set(false);
    }

    /// Playback was stopped to ramp a position jump
    pub fn playback_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    /// Whether live mode asked for frame-change updates
    pub fn handler_registered(&self) -> bool {
        self.registered.get()
    }
}

impl Host for HeadlessHost {
    fn report(&self, level: ReportLevel, message: &str) {
        match level {
            ReportLevel::Info => info!("{}", message),
            ReportLevel::Warning => warn!("{}", message),
            ReportLevel::Error => error!("{}", message),
        }
    }

    fn is_background(&self) -> bool {
        self.background
    }

    fn is_animation_playing(&self) -> bool {
        self.playing.get()
    }

    fn cancel_playback(&self) {
        debug!("Playback cancelled");
        self.playing.set(false);
        self.cancelled.set(true);
    }

    fn register_update_handler(&self) {
        self.registered.set(true);
    }

    fn unregister_update_handler(&self) {
        self.registered.set(false);
    }

    fn progress_begin(&self, min: i64, max: i64) {
        self.progress.set((min, max));
    }

    fn progress_update(&self, value: i64) {
        let (min, max) = self.progress.get();
        let span = (max - min).max(1);
        debug!("Progress {}%", (value - min) * 100 / span);
    }

    fn progress_end(&self) {
        self.progress.set((0, 0));
    }
}
