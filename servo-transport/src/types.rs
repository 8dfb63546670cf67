//! Common types for transport layer

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// Strict dotted-quad pattern accepted for socket hosts
const IP_ADDRESS_PATTERN: &str = r"^\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}$";

/// Transport type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransportType {
    /// USB/UART serial port
    Serial,
    /// Network socket (web socket or raw TCP)
    Socket,
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportType::Serial => f.write_str("Serial"),
            TransportType::Socket => f.write_str("Socket"),
        }
    }
}

/// Supported serial baud rates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum BaudRate {
    B19200,
    #[default]
    B115200,
    B192500,
}

impl BaudRate {
    /// All selectable baud rates
    pub const ALL: &'static [BaudRate] = &[BaudRate::B19200, BaudRate::B115200, BaudRate::B192500];

    /// Baud rate in bits per second
    pub fn as_u32(self) -> u32 {
        match self {
            BaudRate::B19200 => 19_200,
            BaudRate::B115200 => 115_200,
            BaudRate::B192500 => 192_500,
        }
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = TransportError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        BaudRate::ALL
            .iter()
            .copied()
            .find(|b| b.as_u32() == value)
            .ok_or(TransportError::InvalidBaudRate(value))
    }
}

impl From<BaudRate> for u32 {
    fn from(value: BaudRate) -> Self {
        value.as_u32()
    }
}

impl FromStr for BaudRate {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u32 = s
            .trim()
            .parse()
            .map_err(|_| TransportError::InvalidBaudRate(0))?;
        BaudRate::try_from(value)
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u32())
    }
}

/// Framing used on top of a network socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocketKind {
    /// Web socket handshake, one binary message per command
    #[default]
    WebSocket,
    /// Raw TCP byte stream
    Tcp,
}

/// Parameters needed to open a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionParams {
    Serial {
        /// Platform-specific device path or name (e.g. `/dev/ttyUSB0`, `COM3`)
        port: String,
        baud_rate: BaudRate,
    },
    Socket {
        /// IPv4 dotted-quad
        host: String,
        port: u16,
        /// Web socket request path (ignored for raw TCP)
        path: String,
        kind: SocketKind,
    },
}

impl ConnectionParams {
    /// Serial connection parameters
    pub fn serial(port: impl Into<String>, baud_rate: BaudRate) -> Self {
        ConnectionParams::Serial {
            port: port.into(),
            baud_rate,
        }
    }

    /// Web socket connection parameters
    pub fn web_socket(host: impl Into<String>, port: u16, path: impl Into<String>) -> Self {
        ConnectionParams::Socket {
            host: host.into(),
            port,
            path: path.into(),
            kind: SocketKind::WebSocket,
        }
    }

    /// Raw TCP connection parameters
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        ConnectionParams::Socket {
            host: host.into(),
            port,
            path: String::new(),
            kind: SocketKind::Tcp,
        }
    }

    /// Which transport these parameters select
    pub fn transport_type(&self) -> TransportType {
        match self {
            ConnectionParams::Serial { .. } => TransportType::Serial,
            ConnectionParams::Socket { .. } => TransportType::Socket,
        }
    }

    /// Check parameters before attempting to open anything
    pub fn validate(&self) -> Result<(), TransportError> {
        match self {
            ConnectionParams::Serial { port, .. } => {
                if port.trim().is_empty() || port == "NONE" {
                    return Err(TransportError::PortNotFound(port.clone()));
                }
                Ok(())
            }
            ConnectionParams::Socket { host, .. } => {
                if !is_ip(host) {
                    return Err(TransportError::InvalidHost(host.clone()));
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionParams::Serial { port, baud_rate } => {
                write!(f, "serial port {port} with baud rate {baud_rate}")
            }
            ConnectionParams::Socket {
                host,
                port,
                path,
                kind: SocketKind::WebSocket,
            } => write!(f, "web socket {}", web_socket_url(host, *port, path)),
            ConnectionParams::Socket {
                host,
                port,
                kind: SocketKind::Tcp,
                ..
            } => write!(f, "socket {host}:{port}"),
        }
    }
}

/// Build the `ws://` URL for a host, port and request path
pub fn web_socket_url(host: &str, port: u16, path: &str) -> String {
    if path.starts_with('/') {
        format!("ws://{host}:{port}{path}")
    } else {
        format!("ws://{host}:{port}/{path}")
    }
}

/// Check a host string against the strict dotted-quad pattern
pub fn is_ip(value: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(IP_ADDRESS_PATTERN).expect("valid IP address pattern"))
        .is_match(value)
}

/// Device identification information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportDeviceInfo {
    /// Transport type
    pub transport_type: TransportType,
    /// Port name or URL (transport-specific)
    pub address: String,
    /// Human readable target, used in user-facing messages
    pub description: String,
}

impl TransportDeviceInfo {
    /// Describe the transport opened with `params`
    pub fn from_params(params: &ConnectionParams) -> Self {
        let address = match params {
            ConnectionParams::Serial { port, .. } => port.clone(),
            ConnectionParams::Socket {
                host,
                port,
                path,
                kind: SocketKind::WebSocket,
            } => web_socket_url(host, *port, path),
            ConnectionParams::Socket { host, port, .. } => format!("{host}:{port}"),
        };

        Self {
            transport_type: params.transport_type(),
            address,
            description: params.to_string(),
        }
    }
}

impl fmt::Display for TransportDeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_ip_accepts_dotted_quad() {
        assert!(is_ip("127.0.0.1"));
        assert!(is_ip("192.168.178.20"));
    }

    #[test]
    fn test_is_ip_rejects_other_hosts() {
        assert!(!is_ip("localhost"));
        assert!(!is_ip("10.0.0"));
        assert!(!is_ip("10.0.0.1.5"));
        assert!(!is_ip(" 10.0.0.1"));
        assert!(!is_ip("1234.0.0.1"));
        assert!(!is_ip(""));
    }

    #[test]
    fn test_baud_rate_parse() {
        assert_eq!("115200".parse::<BaudRate>().unwrap(), BaudRate::B115200);
        assert_eq!(BaudRate::try_from(19_200).unwrap(), BaudRate::B19200);
        assert!(matches!(
            BaudRate::try_from(9600),
            Err(TransportError::InvalidBaudRate(9600))
        ));
    }

    #[test]
    fn test_web_socket_url_path() {
        assert_eq!(web_socket_url("10.0.0.2", 80, ""), "ws://10.0.0.2:80/");
        assert_eq!(web_socket_url("10.0.0.2", 81, "/servo"), "ws://10.0.0.2:81/servo");
        assert_eq!(web_socket_url("10.0.0.2", 81, "servo"), "ws://10.0.0.2:81/servo");
    }

    #[test]
    fn test_params_description() {
        let serial = ConnectionParams::serial("/dev/ttyUSB0", BaudRate::B115200);
        assert_eq!(
            serial.to_string(),
            "serial port /dev/ttyUSB0 with baud rate 115200"
        );

        let ws = ConnectionParams::web_socket("127.0.0.1", 80, "/");
        assert_eq!(ws.to_string(), "web socket ws://127.0.0.1:80/");

        let tcp = ConnectionParams::tcp("127.0.0.1", 9000);
        assert_eq!(tcp.to_string(), "socket 127.0.0.1:9000");
        assert_eq!(TransportDeviceInfo::from_params(&tcp).address, "127.0.0.1:9000");
    }

    #[test]
    fn test_validate() {
        assert!(ConnectionParams::serial("NONE", BaudRate::default())
            .validate()
            .is_err());
        assert!(ConnectionParams::web_socket("my-robot", 80, "")
            .validate()
            .is_err());
        assert!(ConnectionParams::tcp("10.1.1.1", 80).validate().is_ok());
    }
}
