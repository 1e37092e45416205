//! The server-side player record, owned exclusively by one session.

use duskhunt_protocol::{LocationId, PlayerId, PlayerView, Role};

/// A player inside a match session.
///
/// Mutated only by session-internal handlers in response to validated
/// actions; nothing outside the owning room actor ever holds one.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub role: Role,
    pub alive: bool,
    pub health: i32,
    pub location: LocationId,
    /// Derived: the current location is a hiding spot.
    pub hiding: bool,
    /// Timestamp of the last accepted move or attack, for cooldowns.
    pub last_action_ms: u64,
}

impl Player {
    /// A fresh lobby player. Roles and health are provisional until
    /// role assignment at game start.
    pub fn new(id: PlayerId, name: String, spawn: LocationId) -> Self {
        Self {
            id,
            name,
            role: Role::Villager,
            alive: true,
            health: 1,
            location: spawn,
            hiding: false,
            last_action_ms: 0,
        }
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            id: self.id,
            name: self.name.clone(),
            role: self.role,
            alive: self.alive,
            health: self.health,
            location: self.location,
            hiding: self.hiding,
        }
    }
}
