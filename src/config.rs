//! Configuration for the servo animation tool
//!
//! Connection settings, scene timing and the servo channels of every bone are
//! stored in one TOML file.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use servo_live::{
    BaudRate, ConnectionParams, LiveSettings, RotationAxis, ServoChannel, SocketKind,
    MAX_JUMP_THRESHOLD, MIN_JUMP_THRESHOLD,
};

use crate::scene::RotationKey;

/// Live mode transport selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LiveMethod {
    #[default]
    Serial,
    Socket,
}

/// Live mode settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveConfig {
    #[serde(default)]
    pub method: LiveMethod,
    /// Serial device (e.g. `/dev/ttyUSB0`); empty until one is picked
    #[serde(default)]
    pub serial_port: String,
    #[serde(default)]
    pub baud_rate: BaudRate,
    #[serde(default = "default_socket_host")]
    pub socket_host: String,
    #[serde(default = "default_socket_port")]
    pub socket_port: u16,
    #[serde(default = "default_socket_path")]
    pub socket_path: String,
    #[serde(default)]
    pub socket_kind: SocketKind,
    #[serde(default = "default_true")]
    pub position_jump_handling: bool,
    #[serde(default = "default_jump_threshold")]
    pub position_jump_threshold: u16,
    /// Pause between ramp steps in milliseconds
    #[serde(default = "default_step_delay")]
    pub step_delay_ms: u64,
    /// Skip the serial port listing check on every write
    #[serde(default)]
    pub headless: bool,
}

fn default_socket_host() -> String {
    "127.0.0.1".to_string()
}

fn default_socket_port() -> u16 {
    80
}

fn default_socket_path() -> String {
    "/".to_string()
}

fn default_true() -> bool {
    true
}

fn default_jump_threshold() -> u16 {
    20
}

fn default_step_delay() -> u64 {
    10
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            method: LiveMethod::Serial,
            serial_port: String::new(),
            baud_rate: BaudRate::default(),
            socket_host: default_socket_host(),
            socket_port: default_socket_port(),
            socket_path: default_socket_path(),
            socket_kind: SocketKind::default(),
            position_jump_handling: true,
            position_jump_threshold: default_jump_threshold(),
            step_delay_ms: default_step_delay(),
            headless: false,
        }
    }
}

/// Scene timing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneConfig {
    #[serde(default = "default_scene_name")]
    pub name: String,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_frame_start")]
    pub frame_start: i32,
    #[serde(default = "default_frame_end")]
    pub frame_end: i32,
}

fn default_scene_name() -> String {
    "Scene".to_string()
}

fn default_fps() -> u32 {
    24
}

fn default_frame_start() -> i32 {
    1
}

fn default_frame_end() -> i32 {
    250
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            name: default_scene_name(),
            fps: default_fps(),
            frame_start: default_frame_start(),
            frame_end: default_frame_end(),
        }
    }
}

/// One bone driving one servo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServoEntry {
    pub bone: String,
    #[serde(default = "default_armature")]
    pub armature: String,
    /// Inactive bones are never streamed or exported
    #[serde(default = "default_true")]
    pub active: bool,
    pub channel: ServoChannel,
    #[serde(default)]
    pub keyframes: Vec<RotationKey>,
}

fn default_armature() -> String {
    "Armature".to_string()
}

impl ServoEntry {
    pub fn new(bone: &str, channel: ServoChannel) -> Self {
        Self {
            bone: bone.to_string(),
            armature: default_armature(),
            active: true,
            channel,
            keyframes: Vec::new(),
        }
    }
}

/// Complete tool configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub live: LiveConfig,
    #[serde(default)]
    pub scene: SceneConfig,
    #[serde(default)]
    pub servos: Vec<ServoEntry>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            live: LiveConfig::default(),
            scene: SceneConfig::default(),
            servos: vec![ServoEntry {
                keyframes: vec![
                    RotationKey::new(1, 0.0).with_easing("EaseInOut"),
                    RotationKey::new(125, 45.0).with_easing("EaseInOut"),
                    RotationKey::new(250, 0.0),
                ],
                ..ServoEntry::new(
                    "Neck",
                    ServoChannel {
                        rotation_axis: RotationAxis::Z,
                        ..ServoChannel::new(0)
                    },
                )
            }],
        }
    }
}

impl AppConfig {
    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("servo-animation")
            .join("config.toml")
    }

    /// Load config from a file, or return default if not found
    pub fn load(path: &PathBuf) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let config: AppConfig = toml::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to a file
    pub fn save(&self, path: &PathBuf) -> anyhow::Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Transport parameters for live mode
    pub fn connection_params(&self) -> anyhow::Result<ConnectionParams> {
        let live = &self.live;
        let params = match live.method {
            LiveMethod::Serial => {
                if live.serial_port.is_empty() {
                    bail!("No serial port configured (set live.serial_port or pass --port)");
                }
                ConnectionParams::serial(&live.serial_port, live.baud_rate)
            }
            LiveMethod::Socket => match live.socket_kind {
                SocketKind::WebSocket => ConnectionParams::web_socket(
                    &live.socket_host,
                    live.socket_port,
                    &live.socket_path,
                ),
                SocketKind::Tcp => ConnectionParams::tcp(&live.socket_host, live.socket_port),
            },
        };
        params.validate()?;
        Ok(params)
    }

    /// Controller tuning, with the jump threshold clamped
    pub fn live_settings(&self) -> LiveSettings {
        LiveSettings {
            position_jump_handling: self.live.position_jump_handling,
            step_delay: Duration::from_millis(self.live.step_delay_ms),
            ..LiveSettings::default()
        }
        .with_threshold(self.live.position_jump_threshold)
    }

    /// Get the servo entry driving `servo_id`
    pub fn servo(&self, servo_id: u8) -> Option<&ServoEntry> {
        self.servos.iter().find(|s| s.channel.servo_id == servo_id)
    }

    /// Get mutable servo entry driving `servo_id`
    pub fn servo_mut(&mut self, servo_id: u8) -> Option<&mut ServoEntry> {
        self.servos
            .iter_mut()
            .find(|s| s.channel.servo_id == servo_id)
    }

    /// Problems that keep the config from being used as-is
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.scene.fps == 0 {
            problems.push("scene.fps must be greater than 0".to_string());
        }
        if self.scene.frame_end < self.scene.frame_start {
            problems.push(format!(
                "scene.frame_end ({}) is before scene.frame_start ({})",
                self.scene.frame_end, self.scene.frame_start
            ));
        }
        let threshold = self.live.position_jump_threshold;
        if !(MIN_JUMP_THRESHOLD..=MAX_JUMP_THRESHOLD).contains(&threshold) {
            problems.push(format!(
                "live.position_jump_threshold {} is outside {}..={} and will be clamped",
                threshold, MIN_JUMP_THRESHOLD, MAX_JUMP_THRESHOLD
            ));
        }
        for servo in &self.servos {
            if let Err(e) = servo.channel.validate() {
                problems.push(format!("{}: {}", servo.bone, e));
            }
        }
        problems
    }
}
