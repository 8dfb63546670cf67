// Servo animation tool - shared library
// Config file, keyframed stand-in scene and headless host for the CLI

pub mod config;
pub mod host;
pub mod scene;

pub use config::{AppConfig, LiveConfig, LiveMethod, SceneConfig, ServoEntry};
pub use host::HeadlessHost;
pub use scene::{KeyframeScene, RotationKey, RotationTrack};
