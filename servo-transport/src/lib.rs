//! Transport abstraction layer for servo controller communication
//!
//! This crate provides a unified interface for streaming servo position
//! commands across different transport backends:
//!
//! - Serial (USB/UART adapters, feature `serial`)
//! - Socket (web socket or raw TCP, feature `socket`)
//!
//! Every backend carries the same 5-byte frame from [`command`].

pub mod command;
pub mod connector;
pub mod error;
pub mod printer;
pub mod types;

mod discovery;

#[cfg(feature = "serial")]
pub mod serial;

#[cfg(feature = "socket")]
pub mod socket;

pub use command::{encode, parse_stream, CommandBytes, ParseError, ServoCommand};
pub use connector::{Connector, SystemConnector};
pub use discovery::{discover_serial_ports, list_serial_ports, serial_port_present, DiscoveredPort};
pub use error::TransportError;
pub use printer::{OutputFormat, PacketFilter, PrinterConfig, PrinterTransport};
pub use types::{
    is_ip, web_socket_url, BaudRate, ConnectionParams, SocketKind, TransportDeviceInfo,
    TransportType,
};

#[cfg(feature = "serial")]
pub use serial::SerialTransport;

#[cfg(feature = "socket")]
pub use socket::SocketTransport;

/// The core transport trait - all backends implement this
///
/// Transports are write-only byte sinks: the servo controller never answers.
/// Calls are blocking and made from a single thread at a time.
pub trait Transport: Send {
    /// Write raw bytes
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Frame and send one servo command
    fn send_command(&mut self, cmd: &ServoCommand) -> Result<(), TransportError> {
        self.write(&cmd.encode())
    }

    /// Check if transport is still connected
    fn is_open(&self) -> bool;

    /// Close the transport; closing twice is a no-op
    fn close(&mut self) -> Result<(), TransportError>;

    /// Get device information
    fn device_info(&self) -> &TransportDeviceInfo;
}

/// Type alias for a boxed transport
pub type BoxedTransport = Box<dyn Transport>;

/// Whether a transport type was compiled into this build
pub fn transport_available(transport_type: TransportType) -> bool {
    match transport_type {
        TransportType::Serial => cfg!(feature = "serial"),
        TransportType::Socket => cfg!(feature = "socket"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_features_available() {
        assert_eq!(transport_available(TransportType::Serial), cfg!(feature = "serial"));
        assert_eq!(transport_available(TransportType::Socket), cfg!(feature = "socket"));
    }
}
