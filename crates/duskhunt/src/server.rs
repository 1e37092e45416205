//! `DuskhuntServer` builder and accept loop.
//!
//! Ties the layers together: WebSocket listener -> per-connection
//! handler -> room registry -> room actors.

use std::sync::Arc;

use tokio::sync::Mutex;

use duskhunt_persist::Persistence;
use duskhunt_protocol::JsonCodec;
use duskhunt_room::RoomRegistry;

use crate::ServerError;
use crate::handler::handle_connection;
use crate::ws::WsListener;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<P: Persistence> {
    pub(crate) registry: Mutex<RoomRegistry<P>>,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a Duskhunt server.
///
/// # Example
///
/// ```rust,ignore
/// let server = DuskhuntServer::builder()
///     .bind("0.0.0.0:8080")
///     .build(NoopPersistence)
///     .await?;
/// server.run().await
/// ```
pub struct DuskhuntServerBuilder {
    bind_addr: String,
}

impl DuskhuntServerBuilder {
    pub fn new() -> Self {
        Self { bind_addr: "127.0.0.1:8080".to_string() }
    }

    /// Sets the address to listen on.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Binds the listener and assembles the server around the given
    /// Persistence Service backend.
    pub async fn build<P: Persistence>(
        self,
        persist: P,
    ) -> Result<DuskhuntServer<P>, ServerError> {
        let listener = WsListener::bind(&self.bind_addr).await?;
        let state = Arc::new(ServerState {
            registry: Mutex::new(RoomRegistry::new(Arc::new(persist))),
            codec: JsonCodec,
        });
        Ok(DuskhuntServer { listener, state })
    }
}

impl Default for DuskhuntServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Duskhunt game server.
pub struct DuskhuntServer<P: Persistence> {
    listener: WsListener,
    state: Arc<ServerState<P>>,
}

impl<P: Persistence> DuskhuntServer<P> {
    pub fn builder() -> DuskhuntServerBuilder {
        DuskhuntServerBuilder::new()
    }

    /// The bound local address.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop until the process terminates.
    ///
    /// Each connection gets its own handler task; a failing connection
    /// or room never takes the accept loop down with it.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("duskhunt server running");

        loop {
            match self.listener.accept().await {
                Ok(stream) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(handle_connection(stream, state));
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
