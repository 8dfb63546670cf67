//! Opening transports from connection parameters
//!
//! The live controller never constructs transports itself; it asks a
//! [`Connector`]. [`SystemConnector`] opens real serial ports and sockets,
//! tests supply their own implementation.

use tracing::debug;

use crate::error::TransportError;
use crate::printer::{PrinterConfig, PrinterTransport};
use crate::types::{ConnectionParams, TransportType};
use crate::{transport_available, BoxedTransport};

/// Factory for transports
pub trait Connector: Send + Sync {
    /// Whether this connector can open the given transport type at all
    fn available(&self, transport_type: TransportType) -> bool;

    /// Open a transport for `params`
    fn open(&self, params: &ConnectionParams) -> Result<BoxedTransport, TransportError>;
}

/// Connector backed by the compiled-in serial and socket transports
#[derive(Debug, Clone)]
pub struct SystemConnector {
    check_port_listing: bool,
    printer_config: Option<PrinterConfig>,
}

impl Default for SystemConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemConnector {
    pub fn new() -> Self {
        Self {
            check_port_listing: true,
            printer_config: None,
        }
    }

    /// Wrap every opened transport in a [`PrinterTransport`]
    pub fn with_printer_config(mut self, config: PrinterConfig) -> Self {
        self.printer_config = Some(config);
        self
    }

    /// Disable the serial port listing liveness check
    pub fn with_port_listing_check(mut self, enabled: bool) -> Self {
        self.check_port_listing = enabled;
        self
    }

    fn open_raw(&self, params: &ConnectionParams) -> Result<BoxedTransport, TransportError> {
        params.validate()?;

        match params {
            #[cfg(feature = "serial")]
            ConnectionParams::Serial { port, baud_rate } => {
                let transport = crate::serial::SerialTransport::open(port, *baud_rate)?
                    .with_port_listing_check(self.check_port_listing);
                Ok(Box::new(transport))
            }
            #[cfg(not(feature = "serial"))]
            ConnectionParams::Serial { .. } => Err(TransportError::Unavailable(TransportType::Serial)),

            #[cfg(feature = "socket")]
            ConnectionParams::Socket {
                host,
                port,
                path,
                kind,
            } => {
                let transport = crate::socket::SocketTransport::open(host, *port, path, *kind)?;
                Ok(Box::new(transport))
            }
            #[cfg(not(feature = "socket"))]
            ConnectionParams::Socket { .. } => Err(TransportError::Unavailable(TransportType::Socket)),
        }
    }
}

impl Connector for SystemConnector {
    fn available(&self, transport_type: TransportType) -> bool {
        transport_available(transport_type)
    }

    fn open(&self, params: &ConnectionParams) -> Result<BoxedTransport, TransportError> {
        let transport = self.open_raw(params)?;

        match &self.printer_config {
            Some(config) => {
                debug!("Monitoring frames sent to {}", params);
                Ok(PrinterTransport::wrap(transport, config.clone()))
            }
            None => Ok(transport),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BaudRate;

    #[test]
    fn test_open_rejects_invalid_params() {
        let connector = SystemConnector::new();
        let result = connector.open(&ConnectionParams::serial("NONE", BaudRate::B115200));
        assert!(matches!(result, Err(TransportError::PortNotFound(_))));

        let result = connector.open(&ConnectionParams::web_socket("localhost", 80, "/"));
        assert!(matches!(result, Err(TransportError::InvalidHost(_))));
    }

    #[cfg(feature = "socket")]
    #[test]
    fn test_open_tcp_socket() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let connector = SystemConnector::new().with_printer_config(PrinterConfig::default());
        let mut transport = connector
            .open(&ConnectionParams::tcp("127.0.0.1", port))
            .unwrap();
        let _conn = listener.accept().unwrap();

        assert!(transport.is_open());
        assert_eq!(transport.device_info().transport_type, TransportType::Socket);
        transport.close().unwrap();
    }
}
