//! # Duskhunt
//!
//! Server for short-lived multiplayer social-deduction matches: a hidden
//! monster stalks a location graph at night while villagers hide,
//! investigate, and vote.
//!
//! This crate is the outermost layer — the WebSocket front end and the
//! process wiring. The interesting parts live below it:
//!
//! - `duskhunt-engine` — the match session state machine and mode strategies
//! - `duskhunt-room` — room actors and the registry
//! - `duskhunt-scene` / `duskhunt-catalog` — the static game data
//! - `duskhunt-protocol` — the wire language
//! - `duskhunt-persist` — the external Persistence Service boundary
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use duskhunt::DuskhuntServerBuilder;
//! use duskhunt_persist::NoopPersistence;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), duskhunt::ServerError> {
//!     let server = DuskhuntServerBuilder::new()
//!         .bind("0.0.0.0:8080")
//!         .build(NoopPersistence)
//!         .await?;
//!     server.run().await
//! }
//! ```

mod error;
mod handler;
mod server;
mod ws;

pub use error::ServerError;
pub use server::{DuskhuntServer, DuskhuntServerBuilder};
pub use ws::WsListener;
