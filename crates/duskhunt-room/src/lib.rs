//! Room lifecycle management for Duskhunt.
//!
//! Each room runs as an isolated Tokio task (actor model) owning one
//! [`MatchSession`](duskhunt_engine::MatchSession); the [`RoomRegistry`]
//! creates and finds rooms, validates passwords, routes connections, and
//! destroys rooms the moment they empty.
//!
//! # Key types
//!
//! - [`RoomRegistry`] — matchmaking, routing, and cleanup
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`PlayerSender`] — per-player outbound event channel
//! - [`RegistryError`] — user-facing and internal failures

mod error;
mod registry;
mod room;

pub use error::RegistryError;
pub use registry::{CreateRequest, RoomRegistry};
pub use room::{PlayerSender, RoomHandle, RoomStatus};
