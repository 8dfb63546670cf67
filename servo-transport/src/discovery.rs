//! Serial port discovery

use serde::Serialize;
use tracing::debug;

use crate::error::TransportError;

/// A serial port found on this machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredPort {
    /// Device name to pass to the serial transport
    pub name: String,
    /// Short description of the port (USB product, Bluetooth, PCI, ...)
    pub kind: String,
}

/// List the serial ports currently present
#[cfg(feature = "serial")]
pub fn discover_serial_ports() -> Result<Vec<DiscoveredPort>, TransportError> {
    use serialport::SerialPortType;

    let ports = serialport::available_ports()?;
    debug!("Found {} serial ports", ports.len());

    Ok(ports
        .into_iter()
        .map(|info| {
            let kind = match info.port_type {
                SerialPortType::UsbPort(usb) => match usb.product {
                    Some(product) => format!("USB {:04x}:{:04x} {}", usb.vid, usb.pid, product),
                    None => format!("USB {:04x}:{:04x}", usb.vid, usb.pid),
                },
                SerialPortType::BluetoothPort => "Bluetooth".to_string(),
                SerialPortType::PciPort => "PCI".to_string(),
                SerialPortType::Unknown => "Unknown".to_string(),
            };
            DiscoveredPort {
                name: info.port_name,
                kind,
            }
        })
        .collect())
}

/// List the serial ports currently present
#[cfg(not(feature = "serial"))]
pub fn discover_serial_ports() -> Result<Vec<DiscoveredPort>, TransportError> {
    debug!("Serial support not compiled in, no ports to list");
    Ok(Vec::new())
}

/// Names of the serial ports currently present
///
/// Used both for port selection and for detecting a physically unplugged
/// device while a connection is open.
pub fn list_serial_ports() -> Result<Vec<String>, TransportError> {
    Ok(discover_serial_ports()?
        .into_iter()
        .map(|port| port.name)
        .collect())
}

/// Whether `port` is currently enumerated
pub fn serial_port_present(port: &str) -> bool {
    match list_serial_ports() {
        Ok(ports) => ports.iter().any(|p| p == port),
        Err(e) => {
            debug!("Failed to enumerate serial ports: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_port_not_present() {
        assert!(!serial_port_present("/dev/servo-animation-missing-port"));
    }
}
