//! Host application services used by live mode and export

use std::fmt;

/// Severity of a user-facing report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for ReportLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportLevel::Info => f.write_str("INFO"),
            ReportLevel::Warning => f.write_str("WARNING"),
            ReportLevel::Error => f.write_str("ERROR"),
        }
    }
}

/// Callbacks into the host application
///
/// Everything except [`Host::report`] has a no-op default so simple hosts
/// only implement what they support.
pub trait Host {
    /// Show a message to the user
    fn report(&self, level: ReportLevel, message: &str);

    /// Running without a UI (no port listing check for serial transports)
    fn is_background(&self) -> bool {
        false
    }

    fn is_animation_playing(&self) -> bool {
        false
    }

    /// Stop playback, leaving the current frame in place
    fn cancel_playback(&self) {}

    /// Hook the drive cycle into frame-change and dependency-update events
    fn register_update_handler(&self) {}

    fn unregister_update_handler(&self) {}

    fn progress_begin(&self, _min: i64, _max: i64) {}

    fn progress_update(&self, _value: i64) {}

    fn progress_end(&self) {}
}
