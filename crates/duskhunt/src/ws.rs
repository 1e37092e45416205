//! WebSocket listener built on `tokio-tungstenite`.
//!
//! Deliberately thin: accept TCP, upgrade to WebSocket, hand the stream
//! to the per-connection handler. Framing and JSON live elsewhere.

use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::WebSocketStream;

use crate::ServerError;

pub type WsStream = WebSocketStream<TcpStream>;

/// Listens for incoming WebSocket connections.
pub struct WsListener {
    listener: TcpListener,
}

impl WsListener {
    /// Binds to the given address.
    pub async fn bind(addr: &str) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr).await.map_err(ServerError::Bind)?;
        tracing::info!(addr, "WebSocket listener bound");
        Ok(Self { listener })
    }

    /// The bound local address (useful with port 0 in tests).
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts and upgrades the next connection.
    pub async fn accept(&self) -> Result<WsStream, ServerError> {
        let (stream, peer) = self
            .listener
            .accept()
            .await
            .map_err(ServerError::Accept)?;
        let ws = tokio_tungstenite::accept_async(stream)
            .await
            .map_err(ServerError::Handshake)?;
        tracing::debug!(%peer, "accepted WebSocket connection");
        Ok(ws)
    }
}
