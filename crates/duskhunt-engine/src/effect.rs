//! Effects: what a session handler wants the outside world to do.
//!
//! The engine never touches sockets or timers itself. Every handler
//! returns a list of [`Effect`]s; the room actor interprets them —
//! fanning events out over player channels, arming or clearing timer
//! deadlines, and pushing the terminal report toward persistence. Timer
//! firings come back in through
//! [`MatchSession::timer_fired`](crate::MatchSession::timer_fired) on
//! the same actor loop as player actions, so they can never race.

use duskhunt_protocol::{PlayerId, Recipient, Role, ServerEvent, Side};

/// The one-shot timers a session can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// End of the current phase.
    Phase,
    /// The monster's movement-delay grace at night start.
    MonsterMove,
    /// The short pause between a resolved vote and the next night.
    NextNight,
}

/// One instruction from the engine to the room actor.
#[derive(Debug, Clone)]
pub enum Effect {
    /// Deliver an event to the given recipients.
    Send(Recipient, ServerEvent),

    /// Arm a one-shot timer `delay_ms` from now. Re-arming a pending
    /// timer replaces its deadline.
    Arm(TimerKind, u64),

    /// Clear every pending timer. Emitted once, when the match ends.
    CancelTimers,

    /// The match reached its terminal state. Emitted exactly once.
    Ended(EndSummary),
}

/// The terminal outcome handed to the actor for stats attribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndSummary {
    pub winner: Side,
    pub players: Vec<PlayerOutcome>,
}

/// One player's final standing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerOutcome {
    pub id: PlayerId,
    pub name: String,
    pub role: Role,
    pub alive: bool,
}
