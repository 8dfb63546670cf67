//! Servo channel calibration
//!
//! A channel maps one bone rotation axis to one physical servo.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Highest position the calibration accepts
pub const POSITION_LIMIT: u16 = 10_000;

/// Euler rotation axis read from the bone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RotationAxis {
    #[default]
    X,
    Y,
    Z,
}

impl RotationAxis {
    /// Index into an Euler triple
    pub fn index(self) -> usize {
        match self {
            RotationAxis::X => 0,
            RotationAxis::Y => 1,
            RotationAxis::Z => 2,
        }
    }
}

impl fmt::Display for RotationAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RotationAxis::X => f.write_str("X"),
            RotationAxis::Y => f.write_str("Y"),
            RotationAxis::Z => f.write_str("Z"),
        }
    }
}

/// Optional sub-range that narrows which positions may be sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionLimits {
    pub start: u16,
    pub end: u16,
}

/// Calibration of one bone-to-servo mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServoChannel {
    #[serde(default)]
    pub servo_id: u8,
    #[serde(default = "default_position_min")]
    pub position_min: u16,
    #[serde(default = "default_position_max")]
    pub position_max: u16,
    /// Servo angle (degrees) matching the bone's rest pose
    #[serde(default = "default_neutral_angle")]
    pub neutral_angle: u16,
    /// Manufactured rotation range of the servo in degrees
    #[serde(default = "default_rotation_range")]
    pub rotation_range: u16,
    #[serde(default)]
    pub rotation_axis: RotationAxis,
    #[serde(default)]
    pub reverse_direction: bool,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_limits: Option<PositionLimits>,
}

fn default_position_min() -> u16 {
    150
}
fn default_position_max() -> u16 {
    600
}
fn default_neutral_angle() -> u16 {
    90
}
fn default_rotation_range() -> u16 {
    180
}
fn default_multiplier() -> f64 {
    1.0
}

impl Default for ServoChannel {
    fn default() -> Self {
        Self {
            servo_id: 0,
            position_min: default_position_min(),
            position_max: default_position_max(),
            neutral_angle: default_neutral_angle(),
            rotation_range: default_rotation_range(),
            rotation_axis: RotationAxis::default(),
            reverse_direction: false,
            multiplier: default_multiplier(),
            position_limits: None,
        }
    }
}

impl ServoChannel {
    pub fn new(servo_id: u8) -> Self {
        Self {
            servo_id,
            ..Default::default()
        }
    }

    /// Bounds a position must fall within to be sent
    ///
    /// The sub-range limits replace min/max when set.
    pub fn effective_bounds(&self) -> (u16, u16) {
        match self.position_limits {
            Some(limits) => (limits.start, limits.end),
            None => (self.position_min, self.position_max),
        }
    }

    /// Whether `position` lies within [`Self::effective_bounds`]
    pub fn in_range(&self, position: f64) -> bool {
        let (lo, hi) = self.effective_bounds();
        f64::from(lo) <= position && position <= f64::from(hi)
    }

    /// Check the calibration for values the converter cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidRange {
            servo_id: self.servo_id,
            reason,
        };

        if self.rotation_range == 0 {
            return Err(ConfigError::DivisionByZero {
                servo_id: self.servo_id,
            });
        }
        if self.position_max > POSITION_LIMIT {
            return Err(invalid(format!(
                "max position {} exceeds {}",
                self.position_max, POSITION_LIMIT
            )));
        }
        if self.position_min > self.position_max {
            return Err(invalid(format!(
                "min position {} is above max position {}",
                self.position_min, self.position_max
            )));
        }
        if self.neutral_angle > self.rotation_range {
            return Err(invalid(format!(
                "neutral angle {} is above rotation range {}",
                self.neutral_angle, self.rotation_range
            )));
        }
        if !(self.multiplier.is_finite() && self.multiplier > 0.0) {
            return Err(invalid(format!("multiplier {} must be positive", self.multiplier)));
        }
        if let Some(limits) = self.position_limits {
            if limits.start > limits.end
                || limits.start < self.position_min
                || limits.end > self.position_max
            {
                return Err(invalid(format!(
                    "position limits {}..{} must lie within {}..{}",
                    limits.start, limits.end, self.position_min, self.position_max
                )));
            }
        }
        Ok(())
    }

    /// Set `position_min`, keeping it at or below `position_max`
    pub fn set_position_min(&mut self, value: u16) {
        self.position_min = range_limit_value(value, None, Some(self.position_max));
    }

    /// Set `position_max`, keeping it at or above `position_min`
    pub fn set_position_max(&mut self, value: u16) {
        self.position_max = range_limit_value(value, Some(self.position_min), Some(POSITION_LIMIT));
    }

    /// Set `neutral_angle`, keeping it within the rotation range
    pub fn set_neutral_angle(&mut self, value: u16) {
        self.neutral_angle = range_limit_value(value, None, Some(self.rotation_range));
    }
}

/// Clamp `value` to the bounds that are present
pub fn range_limit_value<T: PartialOrd>(value: T, min: Option<T>, max: Option<T>) -> T {
    match (min, max) {
        (Some(min), _) if value < min => min,
        (_, Some(max)) if value > max => max,
        _ => value,
    }
}
