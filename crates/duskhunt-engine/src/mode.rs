//! Mode strategies: the behavioral split between the two session variants.
//!
//! Both modes share the same state shape and handler plumbing; everything
//! that differs — phase timings, movement cooldowns, repositioning, win
//! conditions — goes through this trait. A strategy object is picked once
//! at session creation and never swapped.

use std::collections::HashMap;

use duskhunt_catalog::MonsterSpec;
use duskhunt_protocol::{GameMode, LocationId, Phase, PlayerId, Role, Side};
use duskhunt_scene::Scene;

use crate::Player;

mod discuss;
mod fury;

pub use discuss::DiscussRules;
pub use fury::FuryRules;

/// Flat movement cooldown outside a role's hunting phase.
pub const DAY_COOLDOWN_MS: u64 = 2_000;

/// The per-mode rule set.
pub trait ModeRules: Send + Sync {
    fn mode(&self) -> GameMode;

    fn night_duration_ms(&self) -> u64 {
        60_000
    }

    fn day_duration_ms(&self) -> u64;

    /// How long after night start the monster stays rooted.
    /// `None` means monster movement is never gated in this mode.
    fn monster_move_delay_ms(&self, spec: &MonsterSpec) -> Option<u64>;

    /// Whether the monster-movement flag is set while the day phase runs.
    fn day_monster_movement(&self) -> bool;

    /// Base movement cooldown before the damage-grace rule is applied.
    fn move_cooldown_ms(&self, role: Role, phase: Phase, spec: &MonsterSpec) -> u64;

    /// Day phases collect votes and end early once everyone voted.
    fn voting_enabled(&self) -> bool;

    /// Whether dawn delivers the night's monster action replay.
    fn sends_night_replay(&self) -> bool;

    /// Where a living player is placed when the day phase begins.
    fn day_spawn(&self, role: Role, scene: &Scene) -> LocationId;

    fn sheriff_can_shoot(&self, phase: Phase) -> bool;

    fn sheriff_damage(&self, phase: Phase) -> i32;

    /// The fury-mode inverse proximity rule: villager moves warn the
    /// monster during the day hunt.
    fn notify_monster_of_villagers(&self, phase: Phase) -> bool;

    /// Evaluates the mode's win condition over the current roster.
    fn check_win(&self, players: &HashMap<PlayerId, Player>) -> Option<Side>;

    /// Whether the lobby shows the night background (the mode's opening
    /// phase) before the first phase update.
    fn lobby_background_is_night(&self) -> bool;
}

/// Selects the strategy object for a mode.
pub fn rules_for(mode: GameMode) -> Box<dyn ModeRules> {
    match mode {
        GameMode::Discuss => Box::new(DiscussRules),
        GameMode::Fury => Box::new(FuryRules),
    }
}

pub(crate) fn alive<'a>(
    players: &'a HashMap<PlayerId, Player>,
) -> impl Iterator<Item = &'a Player> {
    players.values().filter(|p| p.alive)
}
