//! Wire protocol for Duskhunt.
//!
//! This crate defines the language the server and the client presentation
//! layer speak:
//!
//! - **Types** ([`ClientAction`], [`ServerEvent`], [`MatchSnapshot`],
//!   identity newtypes, game vocabulary enums) — the structures that
//!   travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how they become bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! The protocol layer knows nothing about rooms, timers, or sockets —
//! it only describes messages.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientAction, CombatKind, CombatResult, GameMode, GameNotice, LocationId,
    LocationKind, LocationView, MatchSnapshot, MonsterAction, MonsterActionKind,
    MonsterType, NoticeKind, Phase, PlayerId, PlayerView, Recipient, Role,
    RoomId, SceneKind, SceneView, ServerEvent, Side,
};
