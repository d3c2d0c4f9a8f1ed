//! Message transport to the Open API gateway.
//!
//! The session only needs three blocking operations, captured by the
//! [`Transport`] trait. [`WsTransport`] implements them over a TLS WebSocket
//! using `tungstenite`; tests drive the session with an in-memory script.
use std::net::TcpStream;

use ctrader_common::{Result, SessionError};
use log::{debug, info};
use tungstenite::error::ProtocolError;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

/// A bidirectional, message-oriented connection.
pub trait Transport {
    /// Sends one text message.
    fn send(&mut self, text: &str) -> Result<()>;

    /// Blocks until the next text message arrives.
    ///
    /// Returns `Ok(None)` once the counterpart has closed the connection;
    /// `Err` is reserved for failures.
    fn receive(&mut self) -> Result<Option<String>>;

    /// Closes the connection. Closing an already closed connection succeeds.
    fn close(&mut self) -> Result<()>;
}

/// WebSocket connection to the JSON gateway.
pub struct WsTransport {
    socket: WebSocket<MaybeTlsStream<TcpStream>>,
}

impl WsTransport {
    /// Opens a WebSocket connection to `url`, e.g. `wss://demo.ctraderapi.com:5036`.
    pub fn connect(url: &str) -> Result<Self> {
        let (socket, response) = tungstenite::connect(url)
            .map_err(|e| SessionError::Transport(format!("Failed to connect to {}: {}", url, e)))?;
        info!("Connected to {}", url);
        debug!("WebSocket handshake status: {}", response.status());
        Ok(Self { socket })
    }
}

impl Transport for WsTransport {
    fn send(&mut self, text: &str) -> Result<()> {
        self.socket
            .send(Message::text(text.to_owned()))
            .map_err(|e| SessionError::Transport(format!("Send failed: {}", e)))
    }

    fn receive(&mut self) -> Result<Option<String>> {
        loop {
            match self.socket.read() {
                Ok(Message::Text(text)) => return Ok(Some(text.as_str().to_owned())),
                Ok(Message::Binary(bytes)) => {
                    return String::from_utf8(bytes.to_vec())
                        .map(Some)
                        .map_err(|e| SessionError::MalformedMessage(format!("Binary frame is not UTF-8: {}", e)));
                }
                Ok(Message::Close(frame)) => {
                    debug!("Close frame received: {:?}", frame);
                    return Ok(None);
                }
                // Pongs are queued by tungstenite and flushed on the next read or write.
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => continue,
                Err(tungstenite::Error::ConnectionClosed) | Err(tungstenite::Error::AlreadyClosed) => {
                    return Ok(None);
                }
                Err(tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake)) => {
                    debug!("Connection reset without closing handshake");
                    return Ok(None);
                }
                Err(e) => return Err(SessionError::Transport(format!("Receive failed: {}", e))),
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        match self.socket.close(None).and_then(|_| self.socket.flush()) {
            Ok(()) => Ok(()),
            Err(tungstenite::Error::ConnectionClosed) | Err(tungstenite::Error::AlreadyClosed) => Ok(()),
            Err(e) => Err(SessionError::Transport(format!("Close failed: {}", e))),
        }
    }
}
