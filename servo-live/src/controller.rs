//! Live mode controller
//!
//! Streams servo positions computed from the current pose to an open
//! transport. The host calls [`LiveController::handle_update`] from its
//! frame-change and dependency-update hooks; everything runs on that single
//! callback thread.
//!
//! State machine:
//!
//! ```text
//! Disconnected --start()--> (Connecting) --ok--> Connected
//!      ^                         |                  |
//!      +---------- error --------+                  |
//!      +------ stop() / write failure --------------+
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use servo_transport::{
    BoxedTransport, ConnectionParams, Connector, ServoCommand, TransportDeviceInfo,
    TransportError, TransportType,
};
use tracing::{debug, error, trace, warn};

use crate::channel::range_limit_value;
use crate::converter::calculate_position;
use crate::error::LiveError;
use crate::host::{Host, ReportLevel};
use crate::registry::{active_channels, SceneGraph};

/// Lowest accepted position jump threshold
pub const MIN_JUMP_THRESHOLD: u16 = 2;
/// Highest accepted position jump threshold
pub const MAX_JUMP_THRESHOLD: u16 = 100;

/// Live mode tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveSettings {
    /// Ramp large jumps one position unit per step instead of jumping
    pub position_jump_handling: bool,
    /// Largest per-servo change sent without ramping
    pub position_jump_threshold: u16,
    /// Pause between ramp steps
    pub step_delay: Duration,
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self {
            position_jump_handling: true,
            position_jump_threshold: 20,
            step_delay: Duration::from_millis(10),
        }
    }
}

impl LiveSettings {
    /// Set the jump threshold, clamped to the accepted range
    pub fn with_threshold(mut self, threshold: u16) -> Self {
        self.position_jump_threshold = range_limit_value(
            threshold,
            Some(MIN_JUMP_THRESHOLD),
            Some(MAX_JUMP_THRESHOLD),
        );
        self
    }
}

/// What one drive cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveOutcome {
    /// Not connected, nothing to do
    Idle,
    /// Another drive cycle is running
    Busy,
    /// Handler suspended (calibration in progress)
    Suspended,
    /// Targets sent directly
    Direct { sent: usize },
    /// Targets ramped in `steps` steps
    Smoothed { steps: u16, sent: usize },
    /// The connection was lost and live mode stopped
    Disconnected,
}

/// One open connection with its last-sent positions
struct LiveSession {
    transport: BoxedTransport,
    params: ConnectionParams,
    last_positions: HashMap<u8, u16>,
}

/// Clears the handling flag when a drive cycle ends
struct HandlingGuard<'a>(&'a AtomicBool);

impl<'a> HandlingGuard<'a> {
    fn try_enter(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for HandlingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Live mode controller
///
/// One long-lived instance per application. The session (transport and
/// position cache) exists only between `start` and `stop`.
pub struct LiveController {
    connector: Box<dyn Connector>,
    settings: Mutex<LiveSettings>,
    session: Mutex<Option<LiveSession>>,
    handling: AtomicBool,
    handler_enabled: AtomicBool,
    stop_requested: AtomicBool,
}

impl LiveController {
    pub fn new(connector: impl Connector + 'static) -> Self {
        Self::with_connector(Box::new(connector))
    }

    pub fn with_connector(connector: Box<dyn Connector>) -> Self {
        Self {
            connector,
            settings: Mutex::new(LiveSettings::default()),
            session: Mutex::new(None),
            handling: AtomicBool::new(false),
            handler_enabled: AtomicBool::new(true),
            stop_requested: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> LiveSettings {
        self.settings.lock().clone()
    }

    pub fn set_settings(&self, settings: LiveSettings) {
        *self.settings.lock() = settings;
    }

    /// Whether the connector can open `transport_type`
    pub fn transport_available(&self, transport_type: TransportType) -> bool {
        self.connector.available(transport_type)
    }

    /// Connected and the transport still reports itself open
    pub fn is_connected(&self) -> bool {
        self.session
            .lock()
            .as_ref()
            .is_some_and(|session| session.transport.is_open())
    }

    /// Last position sent to `servo_id` in this session
    pub fn get_last_position(&self, servo_id: u8) -> Option<u16> {
        self.session
            .lock()
            .as_ref()
            .and_then(|session| session.last_positions.get(&servo_id).copied())
    }

    /// Snapshot of every cached position; empty while disconnected
    pub fn last_positions(&self) -> HashMap<u8, u16> {
        self.session
            .lock()
            .as_ref()
            .map(|session| session.last_positions.clone())
            .unwrap_or_default()
    }

    /// Parameters of the open connection
    pub fn connection_params(&self) -> Option<ConnectionParams> {
        self.session.lock().as_ref().map(|s| s.params.clone())
    }

    pub fn device_info(&self) -> Option<TransportDeviceInfo> {
        self.session
            .lock()
            .as_ref()
            .map(|s| s.transport.device_info().clone())
    }

    /// Ignore host updates until [`Self::resume_handler`]
    pub fn suspend_handler(&self) {
        self.handler_enabled.store(false, Ordering::Release);
    }

    pub fn resume_handler(&self) {
        self.handler_enabled.store(true, Ordering::Release);
    }

    pub fn is_handler_enabled(&self) -> bool {
        self.handler_enabled.load(Ordering::Acquire)
    }

    /// Ask a running drive cycle to end its ramp early and stop live mode
    ///
    /// Safe to call from another thread (signal handlers).
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Open the transport and run the first drive cycle
    pub fn start<S, H>(
        &self,
        params: ConnectionParams,
        scene: &S,
        host: &H,
    ) -> Result<DriveOutcome, LiveError>
    where
        S: SceneGraph + ?Sized,
        H: Host + ?Sized,
    {
        if self.session.lock().is_some() {
            return Err(LiveError::AlreadyConnected);
        }

        let target = params.to_string();
        let opened = if self.connector.available(params.transport_type()) {
            self.connector.open(&params)
        } else {
            Err(TransportError::Unavailable(params.transport_type()))
        };

        let transport = match opened {
            Ok(transport) => transport,
            Err(source) => {
                error!("Failed to open {}: {}", target, source);
                host.report(ReportLevel::Error, &format!("Failed to open {target}"));
                return Err(LiveError::Connection { target, source });
            }
        };

        {
            let mut session = self.session.lock();
            if session.is_some() {
                return Err(LiveError::AlreadyConnected);
            }
            *session = Some(LiveSession {
                transport,
                params,
                last_positions: HashMap::new(),
            });
        }
        self.stop_requested.store(false, Ordering::Release);

        host.report(ReportLevel::Info, &format!("Opened {target}"));
        host.register_update_handler();

        Ok(self.handle_update(scene, host))
    }

    /// Close the transport and drop the position cache
    ///
    /// `unexpected` marks a teardown caused by a lost connection; it is
    /// reported as a warning instead of an info message.
    pub fn stop<H: Host + ?Sized>(&self, host: &H, unexpected: bool) -> Result<(), LiveError> {
        let mut session = self.session.lock().take().ok_or(LiveError::NotConnected)?;
        let target = session.params.to_string();

        if let Err(e) = session.transport.close() {
            debug!("Closing {} failed: {}", target, e);
        }
        session.last_positions.clear();
        drop(session);

        host.unregister_update_handler();

        if unexpected {
            warn!("Live mode connection to {} was closed unexpectedly", target);
            host.report(
                ReportLevel::Warning,
                &format!("Live mode connection to {target} was closed unexpectedly"),
            );
        } else {
            host.report(ReportLevel::Info, &format!("Closed {target}"));
        }
        Ok(())
    }

    /// Send one position unless it equals the cached value
    ///
    /// Returns whether a frame was written. A write failure stops live mode
    /// (reported as unexpected) and is returned as [`LiveError::Transport`].
    pub fn send_position<H: Host + ?Sized>(
        &self,
        host: &H,
        servo_id: u8,
        position: u16,
    ) -> Result<bool, LiveError> {
        let command = ServoCommand::new(servo_id, position);

        let failure = {
            let mut guard = self.session.lock();
            let session = guard.as_mut().ok_or(LiveError::NotConnected)?;

            if session.last_positions.get(&servo_id) == Some(&position) {
                return Ok(false);
            }

            match session.transport.send_command(&command) {
                Ok(()) => {
                    trace!("Sent {} {:02X?}", command, command.encode());
                    session.last_positions.insert(servo_id, position);
                    return Ok(true);
                }
                Err(e) => e,
            }
        };

        error!("Failed to send {}: {}", command, failure);
        // Already torn down if a nested call got there first
        let _ = self.stop(host, true);
        Err(LiveError::Transport(failure))
    }

    /// Drive cycle: compute targets from the current pose and send them
    ///
    /// Never fails; transport errors end live mode instead.
    pub fn handle_update<S, H>(&self, scene: &S, host: &H) -> DriveOutcome
    where
        S: SceneGraph + ?Sized,
        H: Host + ?Sized,
    {
        if !self.is_handler_enabled() {
            return DriveOutcome::Suspended;
        }
        let Some(_guard) = HandlingGuard::try_enter(&self.handling) else {
            trace!("Drive cycle already running, skipping nested update");
            return DriveOutcome::Busy;
        };

        let transport_open = match self.session.lock().as_ref() {
            None => return DriveOutcome::Idle,
            Some(session) => session.transport.is_open(),
        };
        if !transport_open {
            let _ = self.stop(host, true);
            return DriveOutcome::Disconnected;
        }

        let settings = self.settings();
        let targets = self.collect_targets(scene, host);
        let last = self.last_positions();

        let max_diff = targets
            .iter()
            .filter_map(|(id, target)| last.get(id).map(|pos| pos.abs_diff(*target)))
            .max()
            .unwrap_or(0);

        let outcome = if settings.position_jump_handling
            && max_diff > settings.position_jump_threshold
        {
            self.handle_position_jump(&targets, max_diff, &settings, host)
        } else {
            self.handle_direct(&targets, host)
        };

        if self.stop_requested.swap(false, Ordering::AcqRel) && self.session.lock().is_some() {
            let _ = self.stop(host, false);
        }

        outcome
    }

    /// Wire positions for every in-range active channel, in traversal order
    fn collect_targets<S, H>(&self, scene: &S, host: &H) -> Vec<(u8, u16)>
    where
        S: SceneGraph + ?Sized,
        H: Host + ?Sized,
    {
        let mut targets = Vec::new();

        for bone in active_channels(scene) {
            let channel = &bone.channel;
            let rotation = scene.bone_rotation(&bone, channel.rotation_axis);

            let result = match calculate_position(rotation, channel, 0) {
                Ok(result) => result,
                Err(e) => {
                    warn!("Skipping {}: {}", bone.label(), e);
                    host.report(ReportLevel::Warning, &e.to_string());
                    continue;
                }
            };

            if !result.in_range {
                debug!(
                    "Skipping servo {} ({}): position {} out of range",
                    channel.servo_id,
                    bone.label(),
                    result.position
                );
                continue;
            }

            match result.wire_position(channel.servo_id) {
                Ok(position) => targets.push((channel.servo_id, position)),
                Err(e) => warn!("Skipping {}: {}", bone.label(), e),
            }
        }

        targets
    }

    fn handle_direct<H: Host + ?Sized>(&self, targets: &[(u8, u16)], host: &H) -> DriveOutcome {
        let mut sent = 0;
        for &(servo_id, position) in targets {
            match self.send_position(host, servo_id, position) {
                Ok(true) => sent += 1,
                Ok(false) => {}
                Err(_) => return DriveOutcome::Disconnected,
            }
        }
        DriveOutcome::Direct { sent }
    }

    /// Ramp every channel toward its target one unit per step
    ///
    /// Runs exactly `max_diff` steps unless a stop is requested. Channels
    /// without a cached position jump straight to their target.
    fn handle_position_jump<H: Host + ?Sized>(
        &self,
        targets: &[(u8, u16)],
        max_diff: u16,
        settings: &LiveSettings,
        host: &H,
    ) -> DriveOutcome {
        if host.is_animation_playing() {
            host.cancel_playback();
        }

        debug!("Position jump of {} detected, ramping", max_diff);
        host.progress_begin(0, i64::from(max_diff));

        let mut sent = 0;
        let mut steps = 0;
        for step in 0..max_diff {
            if self.stop_requested() {
                debug!("Stop requested after {} ramp steps", steps);
                break;
            }
            host.progress_update(i64::from(step));

            for &(servo_id, target) in targets {
                let next = match self.get_last_position(servo_id) {
                    Some(current) => step_toward(current, target),
                    None => target,
                };
                match self.send_position(host, servo_id, next) {
                    Ok(true) => sent += 1,
                    Ok(false) => {}
                    Err(_) => {
                        host.progress_end();
                        return DriveOutcome::Disconnected;
                    }
                }
            }
            steps += 1;

            if step + 1 < max_diff && !settings.step_delay.is_zero() {
                std::thread::sleep(settings.step_delay);
            }
        }

        host.progress_end();
        DriveOutcome::Smoothed { steps, sent }
    }
}

/// Move `current` one unit toward `target`
fn step_toward(current: u16, target: u16) -> u16 {
    match current.cmp(&target) {
        std::cmp::Ordering::Less => current + 1,
        std::cmp::Ordering::Greater => current - 1,
        std::cmp::Ordering::Equal => current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_toward() {
        assert_eq!(step_toward(90, 45), 89);
        assert_eq!(step_toward(45, 90), 46);
        assert_eq!(step_toward(45, 45), 45);
        assert_eq!(step_toward(0, u16::MAX), 1);
    }

    #[test]
    fn test_threshold_is_clamped() {
        assert_eq!(LiveSettings::default().with_threshold(0).position_jump_threshold, 2);
        assert_eq!(LiveSettings::default().with_threshold(500).position_jump_threshold, 100);
        assert_eq!(LiveSettings::default().with_threshold(30).position_jump_threshold, 30);
    }

    #[test]
    fn test_handling_guard_is_single_flight() {
        let flag = AtomicBool::new(false);
        let guard = HandlingGuard::try_enter(&flag);
        assert!(guard.is_some());
        assert!(HandlingGuard::try_enter(&flag).is_none());
        drop(guard);
        assert!(HandlingGuard::try_enter(&flag).is_some());
    }
}
