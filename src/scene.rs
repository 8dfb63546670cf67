//! Keyframed stand-in scene
//!
//! Outside an animation host, bone rotations come from per-servo keyframe
//! tracks in the config file. Each keyframe holds a rotation (degrees) about
//! the channel's axis and the easing used toward the next keyframe.
//!
//! # Example TOML
//!
//! ```toml
//! [[servos]]
//! bone = "Neck"
//! servo_id = 0
//! keyframes = [
//!     { frame = 1,  degrees = 0.0,  easing = "EaseInOut" },
//!     { frame = 48, degrees = 45.0, easing = "Linear" },
//!     { frame = 96, degrees = 0.0 },
//! ]
//! ```

use keyframe::functions as ease;
use keyframe::EasingFunction;
use serde::{Deserialize, Serialize};
use servo_live::{ActiveBone, RotationAxis, SceneGraph};

use crate::config::AppConfig;

/// One rotation key on a bone track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationKey {
    pub frame: i32,
    pub degrees: f64,
    /// Easing function to the *next* keyframe
    #[serde(default = "default_easing")]
    pub easing: String,
}

fn default_easing() -> String {
    "Linear".to_string()
}

impl RotationKey {
    pub fn new(frame: i32, degrees: f64) -> Self {
        Self {
            frame,
            degrees,
            easing: default_easing(),
        }
    }

    pub fn with_easing(mut self, easing: &str) -> Self {
        self.easing = easing.to_string();
        self
    }
}

/// Keyframes of one bone, sorted by frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RotationTrack {
    keys: Vec<RotationKey>,
}

impl RotationTrack {
    pub fn new(mut keys: Vec<RotationKey>) -> Self {
        keys.sort_by_key(|key| key.frame);
        Self { keys }
    }

    /// Rotation at `frame`, holding the first/last key outside the track
    pub fn rotation_at(&self, frame: f64) -> f64 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };
        if frame <= f64::from(first.frame) {
            return first.degrees;
        }
        if frame >= f64::from(last.frame) {
            return last.degrees;
        }

        // Find the surrounding keyframes
        let i = self
            .keys
            .windows(2)
            .position(|pair| frame < f64::from(pair[1].frame))
            .unwrap_or(0);
        let key_a = &self.keys[i];
        let key_b = &self.keys[i + 1];

        let span = f64::from(key_b.frame - key_a.frame);
        if span <= 0.0 {
            return key_a.degrees;
        }

        let local_t = ((frame - f64::from(key_a.frame)) / span).clamp(0.0, 1.0);
        let eased_t = apply_easing(&key_a.easing, local_t);
        key_a.degrees + (key_b.degrees - key_a.degrees) * eased_t
    }
}

/// Apply an easing function by name.
fn apply_easing(name: &str, t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);

    match name {
        "Linear" => t,
        "Hold" | "Constant" => 0.0,
        "EaseIn" | "EaseInQuad" => ease::EaseIn.y(t),
        "EaseOut" | "EaseOutQuad" => ease::EaseOut.y(t),
        "EaseInOut" => ease::EaseInOut.y(t),
        "EaseInCubic" => ease::EaseInCubic.y(t),
        "EaseOutCubic" => ease::EaseOutCubic.y(t),
        "EaseInOutCubic" => ease::EaseInOutCubic.y(t),
        "EaseInQuart" => ease::EaseInQuart.y(t),
        "EaseOutQuart" => ease::EaseOutQuart.y(t),
        "EaseInOutQuart" => ease::EaseInOutQuart.y(t),
        "EaseInQuint" => ease::EaseInQuint.y(t),
        "EaseOutQuint" => ease::EaseOutQuint.y(t),
        "EaseInOutQuint" => ease::EaseInOutQuint.y(t),
        _ => t,
    }
}

/// Scene built from the config file
pub struct KeyframeScene {
    name: String,
    fps: u32,
    frame_range: (i32, i32),
    frame: i32,
    bones: Vec<(ActiveBone, RotationTrack)>,
}

impl KeyframeScene {
    /// Scene with the active servos of `config`, positioned at the first frame
    pub fn from_config(config: &AppConfig) -> Self {
        let bones = config
            .servos
            .iter()
            .filter(|servo| servo.active)
            .map(|servo| {
                (
                    ActiveBone::new(&servo.armature, &servo.bone, servo.channel.clone()),
                    RotationTrack::new(servo.keyframes.clone()),
                )
            })
            .collect();

        Self {
            name: config.scene.name.clone(),
            fps: config.scene.fps,
            frame_range: (config.scene.frame_start, config.scene.frame_end),
            frame: config.scene.frame_start,
            bones,
        }
    }

    fn track(&self, bone: &ActiveBone) -> Option<&RotationTrack> {
        self.bones
            .iter()
            .find(|(b, _)| b.armature == bone.armature && b.name == bone.name)
            .map(|(_, track)| track)
    }
}

impl SceneGraph for KeyframeScene {
    fn name(&self) -> &str {
        &self.name
    }

    fn fps(&self) -> u32 {
        self.fps
    }

    fn frame_range(&self) -> (i32, i32) {
        self.frame_range
    }

    fn current_frame(&self) -> i32 {
        self.frame
    }

    fn set_frame(&mut self, frame: i32) {
        self.frame = frame;
    }

    fn active_bones(&self) -> Vec<ActiveBone> {
        self.bones.iter().map(|(bone, _)| bone.clone()).collect()
    }

    /// Tracks animate the channel's own axis; other axes stay at rest
    fn bone_rotation(&self, bone: &ActiveBone, axis: RotationAxis) -> f64 {
        match self.track(bone) {
            Some(track) if axis == bone.channel.rotation_axis => {
                track.rotation_at(f64::from(self.frame))
            }
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServoEntry;
    use servo_live::ServoChannel;

    fn track() -> RotationTrack {
        RotationTrack::new(vec![
            RotationKey::new(10, 40.0),
            RotationKey::new(0, 0.0),
            RotationKey::new(20, 40.0).with_easing("Hold"),
            RotationKey::new(30, 0.0),
        ])
    }

    #[test]
    fn test_linear_interpolation() {
        let track = track();
        assert_eq!(track.rotation_at(0.0), 0.0);
        assert_eq!(track.rotation_at(5.0), 20.0);
        assert_eq!(track.rotation_at(10.0), 40.0);
    }

    #[test]
    fn test_hold_keeps_value_until_next_key() {
        let track = track();
        assert_eq!(track.rotation_at(25.0), 40.0);
        assert_eq!(track.rotation_at(30.0), 0.0);
    }

    #[test]
    fn test_outside_track_holds_ends() {
        let track = track();
        assert_eq!(track.rotation_at(-5.0), 0.0);
        assert_eq!(track.rotation_at(100.0), 0.0);
        assert_eq!(RotationTrack::default().rotation_at(3.0), 0.0);
    }

    #[test]
    fn test_ease_in_out_is_symmetric() {
        let track = RotationTrack::new(vec![
            RotationKey::new(0, 0.0).with_easing("EaseInOut"),
            RotationKey::new(10, 10.0),
        ]);
        assert!((track.rotation_at(5.0) - 5.0).abs() < 1e-3);
        assert!(track.rotation_at(2.0) < 2.0);
    }

    #[test]
    fn test_scene_from_config() {
        let mut config = AppConfig::default();
        config.scene.frame_start = 1;
        config.scene.frame_end = 10;
        config.servos = vec![
            ServoEntry {
                keyframes: vec![RotationKey::new(1, 0.0), RotationKey::new(11, 20.0)],
                ..ServoEntry::new("Neck", ServoChannel::new(0))
            },
            ServoEntry {
                active: false,
                ..ServoEntry::new("Tail", ServoChannel::new(1))
            },
        ];

        let mut scene = KeyframeScene::from_config(&config);
        let bones = scene.active_bones();
        assert_eq!(bones.len(), 1);
        assert_eq!(scene.current_frame(), 1);

        scene.set_frame(6);
        assert_eq!(scene.bone_rotation(&bones[0], RotationAxis::X), 10.0);
        assert_eq!(scene.bone_rotation(&bones[0], RotationAxis::Y), 0.0);
    }
}
