//! Interactive min/max calibration during live mode
//!
//! While a session is open the drive cycle is suspended, so edited values
//! reach the servo without the animation pose overriding them. Finishing or
//! dropping the session resumes live updates and re-sends the pose.

use crate::channel::{range_limit_value, ServoChannel, POSITION_LIMIT};
use crate::controller::LiveController;
use crate::error::LiveError;
use crate::host::{Host, ReportLevel};
use crate::registry::SceneGraph;

/// Which bound is being edited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalibrationTarget {
    #[default]
    Min,
    Max,
}

/// An open calibration of one servo
pub struct CalibrationSession<'a, S: SceneGraph + ?Sized, H: Host + ?Sized> {
    controller: &'a LiveController,
    scene: &'a S,
    host: &'a H,
    servo_id: u8,
    position_min: u16,
    position_max: u16,
    target: CalibrationTarget,
    finished: bool,
}

impl<'a, S: SceneGraph + ?Sized, H: Host + ?Sized> CalibrationSession<'a, S, H> {
    /// Start calibrating `servo_id`
    ///
    /// Requires an open connection and a position already sent to the servo;
    /// both bounds start at that position.
    pub fn begin(
        controller: &'a LiveController,
        scene: &'a S,
        host: &'a H,
        servo_id: u8,
    ) -> Result<Self, LiveError> {
        if !controller.is_connected() {
            return Err(LiveError::NotConnected);
        }

        let Some(last_position) = controller.get_last_position(servo_id) else {
            let err = LiveError::NoLastPosition(servo_id);
            host.report(ReportLevel::Error, &err.to_string());
            return Err(err);
        };

        controller.suspend_handler();

        Ok(Self {
            controller,
            scene,
            host,
            servo_id,
            position_min: last_position,
            position_max: last_position,
            target: CalibrationTarget::Min,
            finished: false,
        })
    }

    pub fn servo_id(&self) -> u8 {
        self.servo_id
    }

    pub fn position_min(&self) -> u16 {
        self.position_min
    }

    pub fn position_max(&self) -> u16 {
        self.position_max
    }

    pub fn target(&self) -> CalibrationTarget {
        self.target
    }

    /// Edit the min bound and move the servo there
    pub fn send_min(&mut self, position: u16) -> Result<bool, LiveError> {
        self.position_min = range_limit_value(position, None, Some(POSITION_LIMIT));
        self.target = CalibrationTarget::Min;
        self.controller
            .send_position(self.host, self.servo_id, self.position_min)
    }

    /// Edit the max bound and move the servo there
    pub fn send_max(&mut self, position: u16) -> Result<bool, LiveError> {
        self.position_max = range_limit_value(position, None, Some(POSITION_LIMIT));
        self.target = CalibrationTarget::Max;
        self.controller
            .send_position(self.host, self.servo_id, self.position_max)
    }

    /// Switch the edited bound and move the servo to its value
    pub fn toggle(&mut self, target: CalibrationTarget) -> Result<bool, LiveError> {
        match target {
            CalibrationTarget::Min => self.send_min(self.position_min),
            CalibrationTarget::Max => self.send_max(self.position_max),
        }
    }

    /// Write the calibrated bounds into `channel`
    pub fn apply(&self, channel: &mut ServoChannel) {
        channel.position_min = self.position_min;
        channel.position_max = self.position_max;
    }

    /// End the session: resume live updates and drive the current pose
    pub fn finish(mut self) {
        self.resume();
    }

    fn resume(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;

        if !self.controller.is_handler_enabled() {
            self.controller.resume_handler();
            self.controller.handle_update(self.scene, self.host);
        }
    }
}

impl<S: SceneGraph + ?Sized, H: Host + ?Sized> Drop for CalibrationSession<'_, S, H> {
    fn drop(&mut self) {
        self.resume();
    }
}
