//! Transport error types

use thiserror::Error;

use crate::types::TransportType;

/// Errors that can occur during transport operations
#[derive(Error, Debug)]
pub enum TransportError {
    // Connection setup
    #[error("Port not found: {0}")]
    PortNotFound(String),

    #[error("Invalid host address: {0}")]
    InvalidHost(String),

    #[error("Invalid port: {0}")]
    InvalidPort(i64),

    #[error("Unsupported baud rate: {0}")]
    InvalidBaudRate(u32),

    #[error("{0} transport is not available in this build")]
    Unavailable(TransportType),

    // Backend-specific errors
    #[error("Serial error: {0}")]
    Serial(String),

    #[error("Socket error: {0}")]
    Socket(String),

    #[error("Web socket handshake failed: {0}")]
    Handshake(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Connection state
    #[error("Connection closed")]
    Disconnected,

    #[error("Connection timeout")]
    Timeout,

    // Generic
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(feature = "serial")]
impl From<serialport::Error> for TransportError {
    fn from(e: serialport::Error) -> Self {
        match e.kind() {
            serialport::ErrorKind::NoDevice => TransportError::PortNotFound(e.description),
            serialport::ErrorKind::Io(kind) => {
                TransportError::Io(std::io::Error::new(kind, e.description))
            }
            _ => TransportError::Serial(e.description),
        }
    }
}

#[cfg(feature = "socket")]
impl From<tungstenite::Error> for TransportError {
    fn from(e: tungstenite::Error) -> Self {
        match e {
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                TransportError::Disconnected
            }
            tungstenite::Error::Io(io) => TransportError::Io(io),
            other => TransportError::Socket(other.to_string()),
        }
    }
}

impl TransportError {
    /// Whether the error means the remote end went away (unplugged device,
    /// broken pipe, closed socket)
    pub fn is_disconnect(&self) -> bool {
        match self {
            TransportError::Disconnected | TransportError::PortNotFound(_) => true,
            TransportError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::NotConnected
                    | std::io::ErrorKind::UnexpectedEof
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broken_pipe_is_disconnect() {
        let err = TransportError::from(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "pipe",
        ));
        assert!(err.is_disconnect());
    }

    #[test]
    fn test_timeout_is_not_disconnect() {
        assert!(!TransportError::Timeout.is_disconnect());
    }

    #[test]
    fn test_unavailable_message() {
        let err = TransportError::Unavailable(TransportType::Serial);
        assert_eq!(err.to_string(), "Serial transport is not available in this build");
    }
}
