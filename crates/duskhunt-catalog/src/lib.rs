//! Static role and monster catalogs.
//!
//! Pure data: the role multiset for each supported player count, and the
//! stat block for each monster type. No state, safe for concurrent reads
//! from every room.

use duskhunt_protocol::{MonsterType, Role};

/// Minimum players required to start a match.
pub const MIN_PLAYERS: usize = 3;
/// Maximum players a room holds.
pub const MAX_PLAYERS: usize = 5;

/// Sheriff starting health; everyone else non-monster starts at 1.
pub const SHERIFF_HEALTH: i32 = 2;

/// The monster type used when the unlock lookup fails or the player has
/// no unlocks.
pub const DEFAULT_MONSTER: MonsterType = MonsterType::Werewolf;

/// Every monster type that can be unlocked.
pub const ALL_MONSTERS: [MonsterType; 2] =
    [MonsterType::Werewolf, MonsterType::Vampire];

/// Stat block for one monster type.
#[derive(Debug, Clone, Copy)]
pub struct MonsterSpec {
    pub name: &'static str,
    pub health: i32,
    /// Base movement/attack cooldown at night.
    pub cooldown_ms: u64,
    /// Grace period after night begins during which the monster cannot
    /// move, giving villagers time to disperse.
    pub movement_delay_ms: u64,
}

static WEREWOLF: MonsterSpec = MonsterSpec {
    name: "Werewolf",
    health: 2,
    cooldown_ms: 2_000,
    movement_delay_ms: 10_000,
};

static VAMPIRE: MonsterSpec = MonsterSpec {
    name: "Vampire",
    health: 2,
    cooldown_ms: 2_000,
    movement_delay_ms: 10_000,
};

/// Looks up the stat block for a monster type.
pub fn monster_spec(kind: MonsterType) -> &'static MonsterSpec {
    match kind {
        MonsterType::Werewolf => &WEREWOLF,
        MonsterType::Vampire => &VAMPIRE,
    }
}

/// The fixed role multiset for a player count, or `None` when the count
/// is outside the supported 3-5 range.
///
/// Exactly one monster in every set; the sheriff appears from 4 players
/// and the doctor from 5.
pub fn roles_for(player_count: usize) -> Option<&'static [Role]> {
    use Role::{Doctor, Monster, Sheriff, Villager};
    match player_count {
        3 => Some(&[Monster, Villager, Villager]),
        4 => Some(&[Monster, Sheriff, Villager, Villager]),
        5 => Some(&[Monster, Sheriff, Doctor, Villager, Villager]),
        _ => None,
    }
}
