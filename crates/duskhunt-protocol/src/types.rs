//! Core protocol types for Duskhunt's wire format.
//!
//! Everything here travels between the server and the client presentation
//! layer as JSON. Enums are internally tagged (`#[serde(tag = "type")]`)
//! so a JavaScript client can dispatch on a single `type` field; identity
//! newtypes are `#[serde(transparent)]` so they serialize as plain values.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A connection-scoped player identifier.
///
/// Assigned by the server when a connection is accepted. Distinct from the
/// durable user id (a username string) that the Persistence Service uses
/// for stats attribution — a player who reconnects gets a fresh `PlayerId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

// Hand-written so the id also deserializes from its string form. Serde's
// internally tagged enums (`ServerEvent`) buffer content through an
// intermediate representation in which integer map keys arrive as strings;
// accepting both keeps `BTreeMap<PlayerId, _>` fields round-tripping while
// leaving the wire output (a plain number) unchanged.
impl<'de> Deserialize<'de> for PlayerId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PlayerIdVisitor;
        impl serde::de::Visitor<'_> for PlayerIdVisitor {
            type Value = PlayerId;
            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a player id (integer or its string form)")
            }
            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<PlayerId, E> {
                Ok(PlayerId(v))
            }
            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<PlayerId, E> {
                u64::try_from(v).map(PlayerId).map_err(serde::de::Error::custom)
            }
            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<PlayerId, E> {
                v.parse().map(PlayerId).map_err(serde::de::Error::custom)
            }
        }
        deserializer.deserialize_any(PlayerIdVisitor)
    }
}

/// A room identifier: a 6-character uppercase join code.
///
/// Codes double as the "address" players share to join private rooms,
/// so they are short and human-typeable rather than numeric.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A location in a scene graph (small integer, scene-scoped).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LocationId(pub u16);

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// See `PlayerId`'s Deserialize: accept the string form so `BTreeMap` keys
// survive the internally tagged enum's buffered re-deserialization.
impl<'de> Deserialize<'de> for LocationId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LocationIdVisitor;
        impl serde::de::Visitor<'_> for LocationIdVisitor {
            type Value = LocationId;
            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a location id (integer or its string form)")
            }
            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<LocationId, E> {
                u16::try_from(v).map(LocationId).map_err(serde::de::Error::custom)
            }
            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<LocationId, E> {
                u16::try_from(v).map(LocationId).map_err(serde::de::Error::custom)
            }
            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<LocationId, E> {
                v.parse().map(LocationId).map_err(serde::de::Error::custom)
            }
        }
        deserializer.deserialize_any(LocationIdVisitor)
    }
}

// ---------------------------------------------------------------------------
// Game vocabulary
// ---------------------------------------------------------------------------

/// A player's role for the current match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Monster,
    Sheriff,
    Doctor,
    Villager,
}

impl Role {
    /// Everyone except the monster is on the villager side.
    pub fn side(self) -> Side {
        match self {
            Role::Monster => Side::Monster,
            _ => Side::Villagers,
        }
    }
}

/// The winning side of a finished match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Villagers,
    Monster,
}

/// A named period of the match with its own ruleset and timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Lobby,
    Night,
    Day,
    Ended,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Lobby => write!(f, "lobby"),
            Phase::Night => write!(f, "night"),
            Phase::Day => write!(f, "day"),
            Phase::Ended => write!(f, "ended"),
        }
    }
}

/// The session variant a room runs.
///
/// `Discuss` alternates hunt nights with discussion-and-vote days;
/// `Fury` is a continuous hunt with no voting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    Discuss,
    Fury,
}

/// The concrete monster the monster-role player controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonsterType {
    Werewolf,
    Vampire,
}

/// Which static scene graph the room plays on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneKind {
    Village,
    Castle,
}

/// What a location is for.
///
/// `Hiding` locations conceal occupants — and get them ambushed if the
/// monster walks in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    Spawn,
    Safe,
    Hiding,
}

// ---------------------------------------------------------------------------
// Structured records
// ---------------------------------------------------------------------------

/// One entry in the monster's per-night action log, replayed to the other
/// players at dawn so they have material for suspicion and voting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterAction {
    /// Milliseconds since the room started.
    pub at_ms: u64,
    pub kind: MonsterActionKind,
    pub location: LocationId,
    /// The victim, for kill entries.
    pub target: Option<PlayerId>,
    /// Human-readable description ("Werewolf moved to House 3").
    pub note: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonsterActionKind {
    Move,
    Kill,
}

/// The outcome of one resolved attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatResult {
    pub attacker: PlayerId,
    pub target: PlayerId,
    pub damage: i32,
    pub killed: bool,
    pub kind: CombatKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatKind {
    MonsterAttack,
    SheriffShoot,
}

/// A structured in-game notification ("the monster is near", "X was killed").
///
/// Delivered to the players named in `affected` when the event is private
/// (proximity warnings), or to the whole room otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameNotice {
    pub at_ms: u64,
    pub kind: NoticeKind,
    pub message: String,
    pub affected: Vec<PlayerId>,
    pub location: Option<LocationId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    GameStart,
    MonsterNear,
    PlayerKilled,
    PlayerSaved,
    PlayerJoined,
    PlayerLeft,
    VoteFailed,
}

// ---------------------------------------------------------------------------
// State snapshots
// ---------------------------------------------------------------------------

/// A player as seen in a state snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub role: Role,
    pub alive: bool,
    pub health: i32,
    pub location: LocationId,
    pub hiding: bool,
}

/// One location of the scene view embedded in snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationView {
    pub id: LocationId,
    pub name: String,
    pub kind: LocationKind,
}

/// A client-facing rendering of a scene graph.
///
/// Sent once inside the join snapshot so clients never need their own
/// copy of the scene tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneView {
    pub kind: SceneKind,
    pub name: String,
    pub locations: Vec<LocationView>,
    pub adjacency: std::collections::BTreeMap<LocationId, Vec<LocationId>>,
    pub monster_spawn: LocationId,
    pub villager_spawn: LocationId,
}

/// The full observable state of one room, sent on join and on the coarse
/// resynchronization points (phase entry, roster change, movement unlock).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub room: RoomId,
    pub mode: GameMode,
    pub phase: Phase,
    pub monster_type: MonsterType,
    pub scene: SceneView,
    /// Players in join order; the first joiner is the host.
    pub players: Vec<PlayerView>,
    pub host: Option<PlayerId>,
    pub has_started: bool,
    /// Milliseconds since the room started.
    pub phase_started_ms: u64,
    pub phase_duration_ms: u64,
    pub votes: std::collections::BTreeMap<PlayerId, PlayerId>,
    pub winner: Option<Side>,
    pub monster_movement_enabled: bool,
    /// Background hint for the presentation layer ("village_night").
    pub background: String,
}

// ---------------------------------------------------------------------------
// Client → server actions
// ---------------------------------------------------------------------------

/// Everything a client can ask the server to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientAction {
    /// Find a public room of this mode to join, or create a new one.
    /// Private rooms are always created fresh, never matched into.
    CreateRoom {
        name: String,
        mode: GameMode,
        /// Durable user id for stats attribution, if the player is known
        /// to the Persistence Service.
        user: Option<String>,
        #[serde(default, rename = "private")]
        is_private: bool,
        password: Option<String>,
        scene: Option<SceneKind>,
    },

    /// Join a specific room by its code.
    JoinRoom {
        room: RoomId,
        name: String,
        user: Option<String>,
        password: Option<String>,
    },

    /// Leave the current room.
    LeaveRoom,

    /// Start the match (host only, 3-5 players).
    StartGame,

    /// Move to an adjacent location.
    MoveTo { location: LocationId },

    /// Monster: attack a player in the same location.
    MonsterAttack { target: PlayerId },

    /// Sheriff: shoot the monster.
    SheriffShoot { target: PlayerId },

    /// Doctor: revive a dead player in the same location.
    DoctorRevive { target: PlayerId },

    /// Vote to eliminate a player (discuss mode, day phase).
    CastVote { target: PlayerId },

    /// Day-phase chat.
    SendChat { text: String },
}

// ---------------------------------------------------------------------------
// Server → client events
// ---------------------------------------------------------------------------

/// Everything the server can tell a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    RoomCreated { room: RoomId },

    /// Sent to the joiner with the full room state.
    RoomJoined { state: MatchSnapshot },

    /// One of the few user-facing rejections (room full, wrong password,
    /// not host, not enough players). Most invalid input is dropped
    /// without a reply.
    RoomError { reason: String },

    GameStarted,

    PhaseUpdate {
        phase: Phase,
        remaining_secs: u64,
        background: String,
        /// Milliseconds since the room started; lets clients run their
        /// own countdown without trusting local latency.
        started_at_ms: u64,
    },

    PlayerMoved { player: PlayerId, location: LocationId },

    Combat { result: CombatResult },

    PlayerRevived { player: PlayerId },

    VoteUpdate {
        votes: std::collections::BTreeMap<PlayerId, PlayerId>,
    },

    /// `eliminated` is `None` when no candidate reached a majority.
    VoteResult { eliminated: Option<PlayerId> },

    GameEnded { winner: Side },

    ChatMessage { player: PlayerId, text: String },

    /// The night's monster actions, replayed to non-monster players at dawn.
    MonsterReplay { actions: Vec<MonsterAction> },

    Notice { notice: GameNotice },

    /// Full-state resynchronization broadcast.
    StateSync { state: MatchSnapshot },
}

// ---------------------------------------------------------------------------
// Recipient — who should receive an event?
// ---------------------------------------------------------------------------

/// Delivery scope for a server event.
///
/// The engine produces `(Recipient, ServerEvent)` pairs; the room actor
/// fans them out over the per-player channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every player in the room.
    All,
    /// One specific player.
    Player(PlayerId),
    /// Everyone except the specified player.
    AllExcept(PlayerId),
}

// =========================================================================
// Tests
// =========================================================================
