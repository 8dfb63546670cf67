//! Servo command framing
//!
//! Every position update travels as a fixed 5-byte frame, regardless of the
//! transport carrying it:
//!
//! ```text
//! +------+----------+---------------+--------------+------+
//! | 0x3C | servo id | position high | position low | 0x3E |
//! +------+----------+---------------+--------------+------+
//! ```
//!
//! Only the hardware endpoint needs to decode frames; `ServoCommand::parse`
//! exists for the monitoring middleware and for tests.

use std::fmt;

/// Start marker (`<`)
pub const COMMAND_START: u8 = 0x3C;
/// End marker (`>`)
pub const COMMAND_END: u8 = 0x3E;
/// Length of one encoded command
pub const COMMAND_LEN: usize = 5;

/// One encoded frame
pub type CommandBytes = [u8; COMMAND_LEN];

/// A (servo ID, position) pair ready to be framed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServoCommand {
    pub servo_id: u8,
    pub position: u16,
}

impl ServoCommand {
    pub fn new(servo_id: u8, position: u16) -> Self {
        Self { servo_id, position }
    }

    /// Frame the command; position is big-endian
    pub fn encode(&self) -> CommandBytes {
        let [high, low] = self.position.to_be_bytes();
        [COMMAND_START, self.servo_id, high, low, COMMAND_END]
    }

    /// Parse exactly one frame from the start of `data`
    pub fn parse(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() < COMMAND_LEN {
            return Err(ParseError::TooShort {
                expected: COMMAND_LEN,
                got: data.len(),
            });
        }
        if data[0] != COMMAND_START {
            return Err(ParseError::InvalidMarker {
                offset: 0,
                expected: COMMAND_START,
                got: data[0],
            });
        }
        if data[4] != COMMAND_END {
            return Err(ParseError::InvalidMarker {
                offset: 4,
                expected: COMMAND_END,
                got: data[4],
            });
        }

        Ok(Self {
            servo_id: data[1],
            position: u16::from_be_bytes([data[2], data[3]]),
        })
    }
}

impl fmt::Display for ServoCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "servo {} -> {}", self.servo_id, self.position)
    }
}

/// Convenience wrapper around [`ServoCommand::encode`]
pub fn encode(servo_id: u8, position: u16) -> CommandBytes {
    ServoCommand::new(servo_id, position).encode()
}

/// Split a byte stream into frames, stopping at the first malformed one
pub fn parse_stream(data: &[u8]) -> Result<Vec<ServoCommand>, ParseError> {
    data.chunks(COMMAND_LEN).map(ServoCommand::parse).collect()
}

/// Parse error for frames
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    TooShort { expected: usize, got: usize },
    InvalidMarker { offset: usize, expected: u8, got: u8 },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { expected, got } => {
                write!(f, "Frame too short: expected {} bytes, got {}", expected, got)
            }
            Self::InvalidMarker {
                offset,
                expected,
                got,
            } => write!(
                f,
                "Invalid marker at byte {}: expected 0x{:02X}, got 0x{:02X}",
                offset, expected, got
            ),
        }
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        assert_eq!(encode(3, 0x01F4), [0x3C, 0x03, 0x01, 0xF4, 0x3E]);
    }

    #[test]
    fn test_encode_small_position_has_zero_high_byte() {
        assert_eq!(encode(0, 90), [0x3C, 0x00, 0x00, 0x5A, 0x3E]);
    }

    #[test]
    fn test_encode_extremes() {
        assert_eq!(encode(255, 0), [0x3C, 0xFF, 0x00, 0x00, 0x3E]);
        assert_eq!(encode(255, u16::MAX), [0x3C, 0xFF, 0xFF, 0xFF, 0x3E]);
        assert_eq!(encode(1, 10_000), [0x3C, 0x01, 0x27, 0x10, 0x3E]);
    }

    #[test]
    fn test_parse_recovers_command() {
        for (id, pos) in [(0u8, 0u16), (7, 375), (200, 10_000), (255, u16::MAX)] {
            let cmd = ServoCommand::parse(&encode(id, pos)).unwrap();
            assert_eq!(cmd, ServoCommand::new(id, pos));
        }
    }

    #[test]
    fn test_parse_rejects_bad_markers() {
        let mut frame = encode(1, 2);
        frame[0] = 0x00;
        assert!(matches!(
            ServoCommand::parse(&frame),
            Err(ParseError::InvalidMarker { offset: 0, .. })
        ));

        let mut frame = encode(1, 2);
        frame[4] = 0x00;
        assert!(matches!(
            ServoCommand::parse(&frame),
            Err(ParseError::InvalidMarker { offset: 4, .. })
        ));
    }

    #[test]
    fn test_parse_too_short() {
        assert_eq!(
            ServoCommand::parse(&[0x3C, 1, 2]),
            Err(ParseError::TooShort {
                expected: 5,
                got: 3
            })
        );
    }

    #[test]
    fn test_parse_stream() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&encode(0, 90));
        bytes.extend_from_slice(&encode(1, 450));
        let cmds = parse_stream(&bytes).unwrap();
        assert_eq!(cmds, vec![ServoCommand::new(0, 90), ServoCommand::new(1, 450)]);
    }
}
