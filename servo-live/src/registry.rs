//! Servo registry: which bones drive which servos
//!
//! The scene itself belongs to the host application. It is consumed through
//! [`SceneGraph`], which only has to enumerate active bones and report their
//! rotation on one axis.

use std::collections::BTreeMap;

use crate::channel::{RotationAxis, ServoChannel};
use crate::error::ConfigError;

/// A bone marked active for servo output
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveBone {
    /// Armature object owning the bone
    pub armature: String,
    /// Bone name, unique within its armature
    pub name: String,
    pub channel: ServoChannel,
}

impl ActiveBone {
    pub fn new(armature: impl Into<String>, name: impl Into<String>, channel: ServoChannel) -> Self {
        Self {
            armature: armature.into(),
            name: name.into(),
            channel,
        }
    }

    /// `armature/bone`, used in messages
    pub fn label(&self) -> String {
        format!("{}/{}", self.armature, self.name)
    }
}

/// Scene graph service provided by the host
pub trait SceneGraph {
    /// Scene name
    fn name(&self) -> &str;

    /// Playback rate in frames per second
    fn fps(&self) -> u32;

    /// First and last frame, both inclusive
    fn frame_range(&self) -> (i32, i32);

    fn current_frame(&self) -> i32;

    /// Jump to `frame`, re-evaluating the pose
    fn set_frame(&mut self, frame: i32);

    /// Active bones in traversal order: armatures first, then their bones
    fn active_bones(&self) -> Vec<ActiveBone>;

    /// Local rotation of `bone` around `axis`, in degrees
    fn bone_rotation(&self, bone: &ActiveBone, axis: RotationAxis) -> f64;
}

/// Active channels of `scene` in traversal order
pub fn active_channels<S: SceneGraph + ?Sized>(scene: &S) -> Vec<ActiveBone> {
    scene.active_bones()
}

/// First active bone driving servo `servo_id`
pub fn find_by_servo_id<S: SceneGraph + ?Sized>(scene: &S, servo_id: u8) -> Option<ActiveBone> {
    scene
        .active_bones()
        .into_iter()
        .find(|bone| bone.channel.servo_id == servo_id)
}

/// Whether no other active bone uses the servo ID of `bone`
pub fn has_unique_servo_id<S: SceneGraph + ?Sized>(scene: &S, bone: &ActiveBone) -> bool {
    !scene.active_bones().iter().any(|other| {
        !(other.armature == bone.armature && other.name == bone.name)
            && other.channel.servo_id == bone.channel.servo_id
    })
}

/// Servo IDs shared by more than one active bone, with the bones using them
pub fn duplicate_servo_ids<S: SceneGraph + ?Sized>(scene: &S) -> Vec<ConfigError> {
    let mut by_id: BTreeMap<u8, Vec<String>> = BTreeMap::new();
    for bone in scene.active_bones() {
        by_id.entry(bone.channel.servo_id).or_default().push(bone.label());
    }

    by_id
        .into_iter()
        .filter(|(_, bones)| bones.len() > 1)
        .map(|(servo_id, bones)| ConfigError::DuplicateServoId { servo_id, bones })
        .collect()
}

/// Fail on the first duplicated servo ID
pub fn check_unique_servo_ids<S: SceneGraph + ?Sized>(scene: &S) -> Result<(), ConfigError> {
    match duplicate_servo_ids(scene).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bones(Vec<ActiveBone>);

    impl SceneGraph for Bones {
        fn name(&self) -> &str {
            "Scene"
        }
        fn fps(&self) -> u32 {
            24
        }
        fn frame_range(&self) -> (i32, i32) {
            (1, 1)
        }
        fn current_frame(&self) -> i32 {
            1
        }
        fn set_frame(&mut self, _frame: i32) {}
        fn active_bones(&self) -> Vec<ActiveBone> {
            self.0.clone()
        }
        fn bone_rotation(&self, _bone: &ActiveBone, _axis: RotationAxis) -> f64 {
            0.0
        }
    }

    fn scene() -> Bones {
        Bones(vec![
            ActiveBone::new("Rig", "Neck", ServoChannel::new(0)),
            ActiveBone::new("Rig", "Jaw", ServoChannel::new(1)),
            ActiveBone::new("Rig.001", "Neck", ServoChannel::new(1)),
        ])
    }

    #[test]
    fn test_find_by_servo_id_returns_first() {
        let scene = scene();
        let bone = find_by_servo_id(&scene, 1).unwrap();
        assert_eq!(bone.label(), "Rig/Jaw");
        assert!(find_by_servo_id(&scene, 9).is_none());
    }

    #[test]
    fn test_has_unique_servo_id() {
        let scene = scene();
        let bones = active_channels(&scene);
        assert!(has_unique_servo_id(&scene, &bones[0]));
        assert!(!has_unique_servo_id(&scene, &bones[1]));
    }

    #[test]
    fn test_duplicate_servo_ids() {
        let scene = scene();
        let duplicates = duplicate_servo_ids(&scene);
        assert_eq!(
            duplicates,
            vec![ConfigError::DuplicateServoId {
                servo_id: 1,
                bones: vec!["Rig/Jaw".into(), "Rig.001/Neck".into()],
            }]
        );
        assert!(check_unique_servo_ids(&scene).is_err());
        assert!(check_unique_servo_ids(&Bones(vec![])).is_ok());
    }
}
