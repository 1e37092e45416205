//! Error types for the room layer.
//!
//! The `Display` strings of the user-facing variants double as the
//! `RoomError` reasons sent to clients, so they are written for players,
//! not logs.

use duskhunt_protocol::{PlayerId, RoomId};

/// Errors that can occur during registry and room operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No room with this code.
    #[error("Room not found")]
    NotFound(RoomId),

    /// No free player slot.
    #[error("Room is full")]
    RoomFull(RoomId),

    /// A private room's password did not match.
    #[error("Incorrect password")]
    WrongPassword(RoomId),

    /// The match already left the lobby.
    #[error("Game has already started")]
    AlreadyStarted(RoomId),

    /// The connection is already in a room.
    #[error("Already in a room")]
    AlreadyInRoom(PlayerId, RoomId),

    /// The connection is not in any room.
    #[error("Not in a room")]
    NotInRoom(PlayerId),

    /// The room's command channel is full or its actor is gone.
    #[error("Room is unavailable")]
    Unavailable(RoomId),
}
