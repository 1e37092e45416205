//! Hunt-fury: a continuous hunt with no voting. Days are short chase
//! phases where the cooldown roles invert and the sheriff hits harder.

use std::collections::HashMap;

use duskhunt_catalog::MonsterSpec;
use duskhunt_protocol::{GameMode, LocationId, Phase, PlayerId, Role, Side};
use duskhunt_scene::Scene;

use super::{DAY_COOLDOWN_MS, ModeRules, alive};
use crate::Player;

pub struct FuryRules;

impl ModeRules for FuryRules {
    fn mode(&self) -> GameMode {
        GameMode::Fury
    }

    fn day_duration_ms(&self) -> u64 {
        30_000
    }

    fn monster_move_delay_ms(&self, _spec: &MonsterSpec) -> Option<u64> {
        // The monster hunts from the first second of every night.
        None
    }

    fn day_monster_movement(&self) -> bool {
        true
    }

    fn move_cooldown_ms(&self, role: Role, phase: Phase, spec: &MonsterSpec) -> u64 {
        match (phase, role) {
            (Phase::Night, Role::Monster) => spec.cooldown_ms,
            (Phase::Night, _) => 0,
            // Day hunt: the roles invert.
            (_, Role::Monster) => 0,
            (_, _) => DAY_COOLDOWN_MS,
        }
    }

    fn voting_enabled(&self) -> bool {
        false
    }

    fn sends_night_replay(&self) -> bool {
        false
    }

    fn day_spawn(&self, role: Role, scene: &Scene) -> LocationId {
        scene.spawn_for(role)
    }

    fn sheriff_can_shoot(&self, _phase: Phase) -> bool {
        true
    }

    fn sheriff_damage(&self, phase: Phase) -> i32 {
        if phase == Phase::Day { 2 } else { 1 }
    }

    fn notify_monster_of_villagers(&self, phase: Phase) -> bool {
        phase == Phase::Day
    }

    fn check_win(&self, players: &HashMap<PlayerId, Player>) -> Option<Side> {
        let alive_count = alive(players).count();
        let monster_alive = alive(players).any(|p| p.role == Role::Monster);
        let others_alive = alive(players).filter(|p| p.role != Role::Monster).count();

        // Last player standing takes it for their side, whatever the role.
        if alive_count == 1 {
            return Some(if monster_alive {
                Side::Monster
            } else {
                Side::Villagers
            });
        }
        if !monster_alive {
            return Some(Side::Villagers);
        }
        if others_alive == 0 {
            return Some(Side::Monster);
        }
        None
    }

    fn lobby_background_is_night(&self) -> bool {
        false
    }
}
