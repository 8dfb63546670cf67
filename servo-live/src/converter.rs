//! Rotation to servo position conversion

use crate::channel::ServoChannel;
use crate::error::ConfigError;

/// Result of converting one bone rotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionResult {
    /// Position rounded to the requested precision
    pub position: f64,
    /// Servo angle in degrees, rounded to 2 decimals
    pub angle: f64,
    /// Whether the position lies within the channel's effective bounds
    pub in_range: bool,
}

impl PositionResult {
    /// Position as sent on the wire
    pub fn wire_position(&self, servo_id: u8) -> Result<u16, ConfigError> {
        let rounded = self.position.round_ties_even();
        if !(0.0..=f64::from(u16::MAX)).contains(&rounded) {
            return Err(ConfigError::PositionOverflow {
                servo_id,
                position: self.position,
            });
        }
        Ok(rounded as u16)
    }
}

/// Map `value` from `from_low..from_high` onto `to_low..to_high`
///
/// Not clamped; values outside the source range extrapolate.
pub fn linear_map(value: f64, from_low: f64, from_high: f64, to_low: f64, to_high: f64) -> f64 {
    (value - from_low) * (to_high - to_low) / (from_high - from_low) + to_low
}

/// Round half to even at `precision` decimal digits
pub fn round_to(value: f64, precision: u32) -> f64 {
    if precision == 0 {
        return value.round_ties_even();
    }
    let factor = 10f64.powi(precision as i32);
    (value * factor).round_ties_even() / factor
}

/// Convert a bone rotation (degrees) into a servo position
///
/// The rotation is scaled by the multiplier, negated for reversed channels
/// and subtracted from the neutral angle. The resulting servo angle is mapped
/// from `0..rotation_range` onto `position_min..position_max`.
pub fn calculate_position(
    rotation_degrees: f64,
    channel: &ServoChannel,
    precision: u32,
) -> Result<PositionResult, ConfigError> {
    if channel.rotation_range == 0 {
        return Err(ConfigError::DivisionByZero {
            servo_id: channel.servo_id,
        });
    }

    let mut rotation = round_to(rotation_degrees * channel.multiplier, 2);
    if channel.reverse_direction {
        rotation = -rotation;
    }

    let angle = f64::from(channel.neutral_angle) - rotation;
    let position = round_to(
        linear_map(
            angle,
            0.0,
            f64::from(channel.rotation_range),
            f64::from(channel.position_min),
            f64::from(channel.position_max),
        ),
        precision,
    );

    Ok(PositionResult {
        position,
        angle: round_to(angle, 2),
        in_range: channel.in_range(position),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::PositionLimits;

    fn degree_channel() -> ServoChannel {
        ServoChannel {
            position_min: 0,
            position_max: 180,
            neutral_angle: 90,
            rotation_range: 180,
            ..ServoChannel::new(0)
        }
    }

    #[test]
    fn test_neutral_rotation_maps_to_neutral_position() {
        let result = calculate_position(0.0, &degree_channel(), 0).unwrap();
        assert_eq!(result.position, 90.0);
        assert_eq!(result.angle, 90.0);
        assert!(result.in_range);
    }

    #[test]
    fn test_positive_rotation_lowers_angle() {
        let result = calculate_position(45.0, &degree_channel(), 0).unwrap();
        assert_eq!(result.position, 45.0);
        assert_eq!(result.angle, 45.0);
        assert!(result.in_range);
    }

    #[test]
    fn test_reverse_direction() {
        let channel = ServoChannel {
            reverse_direction: true,
            ..degree_channel()
        };
        let result = calculate_position(45.0, &channel, 0).unwrap();
        assert_eq!(result.position, 135.0);
    }

    #[test]
    fn test_multiplier_applies_before_reverse() {
        let channel = ServoChannel {
            multiplier: 2.0,
            reverse_direction: true,
            ..degree_channel()
        };
        let result = calculate_position(20.0, &channel, 0).unwrap();
        assert_eq!(result.angle, 130.0);
        assert_eq!(result.position, 130.0);
    }

    #[test]
    fn test_default_channel_scale() {
        // 150..600 over 180 degrees: 2.5 units per degree
        let channel = ServoChannel::new(1);
        assert_eq!(calculate_position(0.0, &channel, 0).unwrap().position, 375.0);
        assert_eq!(calculate_position(90.0, &channel, 0).unwrap().position, 150.0);
        assert_eq!(calculate_position(-90.0, &channel, 0).unwrap().position, 600.0);
    }

    #[test]
    fn test_precision() {
        let channel = ServoChannel::new(1);
        let result = calculate_position(0.3, &channel, 2).unwrap();
        assert_eq!(result.position, 374.25);
        let result = calculate_position(0.3, &channel, 0).unwrap();
        assert_eq!(result.position, 374.0);

        // Integer rounding is half to even
        let channel = degree_channel();
        assert_eq!(calculate_position(0.5, &channel, 0).unwrap().position, 90.0);
        assert_eq!(calculate_position(1.5, &channel, 0).unwrap().position, 88.0);
    }

    #[test]
    fn test_out_of_range() {
        let result = calculate_position(-100.0, &degree_channel(), 0).unwrap();
        assert_eq!(result.position, 190.0);
        assert!(!result.in_range);
    }

    #[test]
    fn test_position_limits_narrow_range() {
        let channel = ServoChannel {
            position_limits: Some(PositionLimits { start: 60, end: 120 }),
            ..degree_channel()
        };
        assert!(calculate_position(0.0, &channel, 0).unwrap().in_range);
        assert!(!calculate_position(45.0, &channel, 0).unwrap().in_range);
    }

    #[test]
    fn test_zero_rotation_range_fails() {
        let channel = ServoChannel {
            rotation_range: 0,
            ..ServoChannel::new(7)
        };
        assert_eq!(
            calculate_position(0.0, &channel, 0),
            Err(ConfigError::DivisionByZero { servo_id: 7 })
        );
    }

    #[test]
    fn test_monotonic_in_rotation() {
        let forward = ServoChannel::new(0);
        let reversed = ServoChannel {
            reverse_direction: true,
            ..ServoChannel::new(0)
        };

        let mut last_forward = f64::INFINITY;
        let mut last_reversed = f64::NEG_INFINITY;
        for step in -90..=90 {
            let rotation = f64::from(step) * 0.7;
            let f = calculate_position(rotation, &forward, 2).unwrap().position;
            let r = calculate_position(rotation, &reversed, 2).unwrap().position;
            assert!(f <= last_forward);
            assert!(r >= last_reversed);
            last_forward = f;
            last_reversed = r;
        }
    }

    #[test]
    fn test_wire_position() {
        let result = calculate_position(0.0, &ServoChannel::new(2), 0).unwrap();
        assert_eq!(result.wire_position(2), Ok(375));

        let negative = PositionResult {
            position: -1.0,
            angle: 0.0,
            in_range: false,
        };
        assert!(matches!(
            negative.wire_position(2),
            Err(ConfigError::PositionOverflow { servo_id: 2, .. })
        ));
    }
}
