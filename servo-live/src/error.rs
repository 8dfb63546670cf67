//! Live mode error types

use servo_transport::TransportError;
use thiserror::Error;

/// Invalid servo channel configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// `rotation_range` of 0 makes the angle to position mapping undefined
    #[error("Servo {servo_id}: rotation range must not be 0")]
    DivisionByZero { servo_id: u8 },

    /// Two active channels share a servo ID
    #[error("Servo ID {servo_id} is used by more than one bone: {}", bones.join(", "))]
    DuplicateServoId { servo_id: u8, bones: Vec<String> },

    /// Inconsistent limits on one channel
    #[error("Servo {servo_id}: {reason}")]
    InvalidRange { servo_id: u8, reason: String },

    /// Position does not fit the 2-byte wire format
    #[error("Servo {servo_id}: position {position} cannot be sent")]
    PositionOverflow { servo_id: u8, position: f64 },
}

/// Errors from live mode and export operations
#[derive(Error, Debug)]
pub enum LiveError {
    /// Opening the transport failed
    #[error("Failed to open {target}: {source}")]
    Connection {
        target: String,
        #[source]
        source: TransportError,
    },

    /// Transport failed while streaming
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel configuration error
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Position outside the calibrated bounds during export
    #[error("Position {position} for servo {servo_id} at frame {frame} is out of range")]
    OutOfRange {
        servo_id: u8,
        position: f64,
        frame: i32,
    },

    /// `start` called while connected
    #[error("Live mode is already connected")]
    AlreadyConnected,

    /// Operation needs an open connection
    #[error("Live mode is not connected")]
    NotConnected,

    /// No position was sent to this servo yet
    #[error("Could not find last position for servo with ID {0}")]
    NoLastPosition(u8),

    /// Export format cannot carry the requested data
    #[error("Export failed: {0}")]
    Export(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
