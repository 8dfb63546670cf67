//! Socket transport: web socket (binary messages) or raw TCP

use std::io::Write;
use std::net::{Ipv4Addr, Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use tracing::{debug, info};
use tungstenite::{Message, WebSocket};

use crate::error::TransportError;
use crate::types::{web_socket_url, ConnectionParams, SocketKind, TransportDeviceInfo};
use crate::Transport;

/// Connect timeout, also used as write timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

enum SocketStream {
    WebSocket(WebSocket<TcpStream>),
    Tcp(TcpStream),
}

/// Socket transport
///
/// Web socket mode performs the HTTP upgrade handshake and sends each frame
/// as one binary message. TCP mode writes frames straight to the stream.
pub struct SocketTransport {
    stream: Option<SocketStream>,
    info: TransportDeviceInfo,
}

impl SocketTransport {
    /// Connect to `host:port`
    ///
    /// `host` must be an IPv4 dotted-quad; `path` is only used for the web
    /// socket request.
    pub fn open(
        host: &str,
        port: u16,
        path: &str,
        kind: SocketKind,
    ) -> Result<Self, TransportError> {
        let params = ConnectionParams::Socket {
            host: host.to_string(),
            port,
            path: path.to_string(),
            kind,
        };
        params.validate()?;

        let ip: Ipv4Addr = host
            .parse()
            .map_err(|_| TransportError::InvalidHost(host.to_string()))?;
        let addr = SocketAddr::from((ip, port));

        debug!("Connecting to {} ({:?})", addr, kind);
        let tcp = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT).map_err(|e| {
            if e.kind() == std::io::ErrorKind::TimedOut {
                TransportError::Timeout
            } else {
                TransportError::Io(e)
            }
        })?;
        tcp.set_write_timeout(Some(CONNECT_TIMEOUT))?;
        tcp.set_read_timeout(Some(CONNECT_TIMEOUT))?;
        tcp.set_nodelay(true)?;

        let stream = match kind {
            SocketKind::WebSocket => {
                let url = web_socket_url(host, port, path);
                let (socket, response) = tungstenite::client(url.as_str(), tcp)
                    .map_err(|e| TransportError::Handshake(e.to_string()))?;
                debug!("Web socket handshake status {}", response.status());
                SocketStream::WebSocket(socket)
            }
            SocketKind::Tcp => SocketStream::Tcp(tcp),
        };

        let info = TransportDeviceInfo::from_params(&params);
        info!("Opened {}", info);

        Ok(Self {
            stream: Some(stream),
            info,
        })
    }
}

impl Transport for SocketTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        match self.stream.as_mut() {
            Some(SocketStream::WebSocket(socket)) => {
                socket.send(Message::Binary(bytes.to_vec()))?;
                Ok(())
            }
            Some(SocketStream::Tcp(stream)) => {
                stream.write_all(bytes)?;
                stream.flush()?;
                Ok(())
            }
            None => Err(TransportError::Disconnected),
        }
    }

    fn is_open(&self) -> bool {
        match &self.stream {
            Some(SocketStream::WebSocket(socket)) => socket.can_write(),
            Some(SocketStream::Tcp(stream)) => stream.peer_addr().is_ok(),
            None => false,
        }
    }

    fn close(&mut self) -> Result<(), TransportError> {
        match self.stream.take() {
            Some(SocketStream::WebSocket(mut socket)) => {
                // Best effort: the peer may already be gone
                if let Err(e) = socket.close(None).and_then(|_| socket.flush()) {
                    debug!("Web socket close failed: {}", e);
                }
            }
            Some(SocketStream::Tcp(stream)) => {
                if let Err(e) = stream.shutdown(Shutdown::Both) {
                    debug!("TCP shutdown failed: {}", e);
                }
            }
            None => {}
        }
        Ok(())
    }

    fn device_info(&self) -> &TransportDeviceInfo {
        &self.info
    }
}
