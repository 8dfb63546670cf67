//! Live servo streaming for bone-driven animation
//!
//! This crate turns bone rotations into servo positions and streams them to
//! hardware through any `servo-transport` backend:
//!
//! - [`converter`]: rotation to position mapping
//! - [`registry`]: active bones and their servo channels
//! - [`controller`]: live mode state machine and drive cycle
//! - [`calibration`]: min/max calibration while streaming
//! - [`export`]: frame-by-frame export to binary or JSON files
//!
//! The host application (scene graph, UI reports, playback) is consumed
//! through the [`SceneGraph`] and [`Host`] traits.

pub mod calibration;
pub mod channel;
pub mod controller;
pub mod converter;
pub mod error;
pub mod export;
pub mod host;
pub mod registry;

pub use calibration::{CalibrationSession, CalibrationTarget};
pub use channel::{range_limit_value, PositionLimits, RotationAxis, ServoChannel, POSITION_LIMIT};
pub use controller::{
    DriveOutcome, LiveController, LiveSettings, MAX_JUMP_THRESHOLD, MIN_JUMP_THRESHOLD,
};
pub use converter::{calculate_position, linear_map, round_to, PositionResult};
pub use error::{ConfigError, LiveError};
pub use export::{
    binary_content, calculate_positions, json_content, time_meta, ExportFormat, ExportOptions,
    ExportSummary, Exporter, FramePositions, MAX_PRECISION,
};
pub use host::{Host, ReportLevel};
pub use registry::{
    active_channels, check_unique_servo_ids, duplicate_servo_ids, find_by_servo_id,
    has_unique_servo_id, ActiveBone, SceneGraph,
};

// Re-export transport types needed to drive a controller
pub use servo_transport::{
    BaudRate, ConnectionParams, Connector, SocketKind, SystemConnector, TransportType,
};
