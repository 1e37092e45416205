//! Match session engine for Duskhunt.
//!
//! One [`MatchSession`] per active room: the phase state machine, role
//! assignment, movement validation over the scene graph, combat and
//! ability resolution, voting, and win-condition evaluation. The two
//! session variants (hunt-and-discuss, hunt-fury) share this state shape
//! and differ only through the [`ModeRules`] strategy selected at
//! creation time.
//!
//! The engine is deliberately synchronous and I/O-free: handlers take a
//! millisecond clock value and return [`Effect`]s for the room actor to
//! carry out. See the `duskhunt-room` crate for the actor that drives it.
//!
//! # Key types
//!
//! - [`MatchSession`] — the per-room state machine
//! - [`ModeRules`] — the variant strategy trait ([`DiscussRules`], [`FuryRules`])
//! - [`Effect`] / [`TimerKind`] — what handlers ask the actor to do
//! - [`Player`] — the server-side player record

mod effect;
mod mode;
mod player;
mod session;
mod vote;

pub use effect::{Effect, EndSummary, PlayerOutcome, TimerKind};
pub use mode::{DiscussRules, FuryRules, ModeRules, rules_for};
pub use player::Player;
pub use session::{
    GRACE_WINDOW_MS, JoinReject, MatchSession, NEXT_NIGHT_DELAY_MS, StartOutcome,
};
pub use vote::{majority, tally};
