//! Hunt-and-discuss: night hunts alternate with discussion-and-vote days.

use std::collections::HashMap;

use duskhunt_catalog::MonsterSpec;
use duskhunt_protocol::{GameMode, LocationId, Phase, PlayerId, Role, Side};
use duskhunt_scene::Scene;

use super::{DAY_COOLDOWN_MS, ModeRules, alive};
use crate::Player;

pub struct DiscussRules;

impl ModeRules for DiscussRules {
    fn mode(&self) -> GameMode {
        GameMode::Discuss
    }

    fn day_duration_ms(&self) -> u64 {
        60_000
    }

    fn monster_move_delay_ms(&self, spec: &MonsterSpec) -> Option<u64> {
        Some(spec.movement_delay_ms)
    }

    fn day_monster_movement(&self) -> bool {
        false
    }

    fn move_cooldown_ms(&self, role: Role, phase: Phase, spec: &MonsterSpec) -> u64 {
        if phase == Phase::Night {
            match role {
                Role::Monster => spec.cooldown_ms,
                _ => 0,
            }
        } else {
            DAY_COOLDOWN_MS
        }
    }

    fn voting_enabled(&self) -> bool {
        true
    }

    fn sends_night_replay(&self) -> bool {
        true
    }

    fn day_spawn(&self, _role: Role, scene: &Scene) -> LocationId {
        // Everyone, monster included, gathers at the village spawn for
        // the discussion.
        scene.villager_spawn()
    }

    fn sheriff_can_shoot(&self, phase: Phase) -> bool {
        phase == Phase::Night
    }

    fn sheriff_damage(&self, _phase: Phase) -> i32 {
        1
    }

    fn notify_monster_of_villagers(&self, _phase: Phase) -> bool {
        false
    }

    fn check_win(&self, players: &HashMap<PlayerId, Player>) -> Option<Side> {
        let alive_count = alive(players).count();
        let monster_alive = alive(players).any(|p| p.role == Role::Monster);
        let others_alive = alive(players).filter(|p| p.role != Role::Monster).count();

        if !monster_alive {
            return Some(Side::Villagers);
        }
        if others_alive == 0 {
            return Some(Side::Monster);
        }
        // Forced endgame: a 1v1 against the monster is unwinnable for the
        // villager, so the monster takes it immediately instead of the
        // match stalling out. Applies only at exactly two survivors.
        if alive_count == 2 && others_alive == 1 {
            return Some(Side::Monster);
        }
        None
    }

    fn lobby_background_is_night(&self) -> bool {
        true
    }
}
