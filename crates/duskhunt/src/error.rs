//! Unified error type for the server crate.

use duskhunt_protocol::ProtocolError;
use duskhunt_room::RegistryError;

/// Top-level error wrapping the layer-specific ones.
///
/// `#[from]` lets `?` convert sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Binding the listen socket failed.
    #[error("bind failed: {0}")]
    Bind(std::io::Error),

    /// Accepting a TCP connection failed.
    #[error("accept failed: {0}")]
    Accept(std::io::Error),

    /// The WebSocket upgrade handshake failed.
    #[error("websocket handshake failed: {0}")]
    Handshake(tokio_tungstenite::tungstenite::Error),

    /// An encode/decode error.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A registry or room error.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_registry_error() {
        let err = RegistryError::NotFound(duskhunt_protocol::RoomId::new("XX"));
        let server_err: ServerError = err.into();
        assert!(matches!(server_err, ServerError::Registry(_)));
        assert_eq!(server_err.to_string(), "Room not found");
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let server_err: ServerError = err.into();
        assert!(server_err.to_string().contains("bad"));
    }
}
