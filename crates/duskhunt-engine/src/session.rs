//! The match session: one room's live game state and its state machine.
//!
//! A session is a deterministic core: every handler takes the current
//! time in milliseconds (supplied by the owning room actor), mutates
//! state, and returns [`Effect`]s. It performs no I/O and owns no timers,
//! which is what makes the phase machine testable with plain integers.
//!
//! Phases run `lobby -> night -> day -> night -> ... -> ended`. The
//! `lobby -> night` edge fires only on an explicit host start and is a
//! one-way gate; `ended` is terminal.
//!
//! Invalid input is dropped silently (no state change, no broadcast)
//! except for the handful of user-facing cases that answer with a
//! `RoomError` event: room full, game already started, not host, not
//! enough players, and the sheriff targeting a non-monster.

use std::collections::{BTreeMap, HashMap, HashSet};

use rand::seq::SliceRandom;

use duskhunt_catalog::{
    DEFAULT_MONSTER, MAX_PLAYERS, MonsterSpec, SHERIFF_HEALTH, monster_spec,
    roles_for,
};
use duskhunt_protocol::{
    CombatKind, CombatResult, GameMode, GameNotice, LocationId, LocationKind,
    MatchSnapshot, MonsterAction, MonsterActionKind, MonsterType, NoticeKind,
    Phase, PlayerId, Recipient, Role, RoomId, ServerEvent, Side,
};
use duskhunt_scene::Scene;

use crate::mode::{ModeRules, rules_for};
use crate::{Effect, EndSummary, Player, PlayerOutcome, TimerKind, vote};

/// How long the monster's movement cooldown stays waived after it takes
/// damage — staggered, but free to reposition.
pub const GRACE_WINDOW_MS: u64 = 5_000;

/// Pause between a resolved vote and the next night.
pub const NEXT_NIGHT_DELAY_MS: u64 = 3_000;

/// Sheriff ability cooldown.
const SHERIFF_COOLDOWN_MS: u64 = 2_000;

/// Why a join was refused. These are the user-facing rejections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinReject {
    Full,
    AlreadyStarted,
}

impl JoinReject {
    pub fn reason(self) -> &'static str {
        match self {
            JoinReject::Full => "Room is full",
            JoinReject::AlreadyStarted => "Game has already started",
        }
    }
}

/// Result of a start request.
///
/// A successful start is two-step: the session assigns roles and hands
/// back the monster player's name, the actor resolves that player's
/// unlocked monster types against the Persistence Service (with a
/// timeout and a default fallback), then calls
/// [`MatchSession::finish_start`].
#[derive(Debug)]
pub enum StartOutcome {
    /// Start refused; the effects carry any `RoomError` reply.
    /// A repeat start on a running match rejects with no effects at all.
    Rejected(Vec<Effect>),

    /// Roles are assigned; the monster's concrete type still needs
    /// resolving against `lookup_name`'s unlocks.
    Pending { monster_player: PlayerId, lookup_name: String },
}

/// One room's live match state.
pub struct MatchSession {
    room: RoomId,
    rules: Box<dyn ModeRules>,
    scene: &'static Scene,
    monster_type: MonsterType,
    spec: &'static MonsterSpec,

    phase: Phase,
    background: String,
    has_started: bool,
    winner: Option<Side>,

    players: HashMap<PlayerId, Player>,
    join_order: Vec<PlayerId>,
    host: Option<PlayerId>,

    phase_started_ms: u64,
    phase_duration_ms: u64,

    /// The monster's recorded actions this night, replayed at dawn.
    monster_actions: Vec<MonsterAction>,
    votes: BTreeMap<PlayerId, PlayerId>,
    monster_movement_enabled: bool,
    last_monster_damage_ms: Option<u64>,
    /// Players already given a proximity warning this phase.
    notified: HashSet<PlayerId>,
    /// Shuffled roles staged between `start_game` and `finish_start`.
    pending_roles: Option<Vec<(PlayerId, Role)>>,
}

impl MatchSession {
    pub fn new(room: RoomId, mode: GameMode, scene: &'static Scene) -> Self {
        let rules = rules_for(mode);
        let background = scene.background(rules.lobby_background_is_night());
        Self {
            room,
            rules,
            scene,
            monster_type: DEFAULT_MONSTER,
            spec: monster_spec(DEFAULT_MONSTER),
            phase: Phase::Lobby,
            background: background.to_string(),
            has_started: false,
            winner: None,
            players: HashMap::new(),
            join_order: Vec::new(),
            host: None,
            phase_started_ms: 0,
            phase_duration_ms: 0,
            monster_actions: Vec::new(),
            votes: BTreeMap::new(),
            monster_movement_enabled: false,
            last_monster_damage_ms: None,
            notified: HashSet::new(),
            pending_roles: None,
        }
    }

    // -- Accessors --------------------------------------------------------

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    pub fn mode(&self) -> GameMode {
        self.rules.mode()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn has_started(&self) -> bool {
        self.has_started
    }

    pub fn winner(&self) -> Option<Side> {
        self.winner
    }

    pub fn host(&self) -> Option<PlayerId> {
        self.host
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Players in join order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.join_order.iter().filter_map(|id| self.players.get(id))
    }

    pub fn monster_type(&self) -> MonsterType {
        self.monster_type
    }

    /// The monster's recorded actions for the current night.
    pub fn monster_actions(&self) -> &[MonsterAction] {
        &self.monster_actions
    }

    // -- Roster -----------------------------------------------------------

    /// Adds a player to the lobby. The first joiner becomes host.
    pub fn add_player(
        &mut self,
        id: PlayerId,
        name: String,
        _now_ms: u64,
    ) -> Result<Vec<Effect>, JoinReject> {
        if self.players.len() >= MAX_PLAYERS {
            return Err(JoinReject::Full);
        }
        if self.has_started {
            return Err(JoinReject::AlreadyStarted);
        }

        let player = Player::new(id, name, self.scene.villager_spawn());
        self.players.insert(id, player);
        self.join_order.push(id);
        if self.host.is_none() {
            self.host = Some(id);
        }

        tracing::info!(
            room = %self.room,
            player_id = %id,
            players = self.players.len(),
            "player joined"
        );

        Ok(vec![
            Effect::Send(
                Recipient::Player(id),
                ServerEvent::RoomJoined { state: self.snapshot() },
            ),
            self.state_sync(),
        ])
    }

    /// Removes a player (leave or disconnect).
    ///
    /// Mid-match, a living leaver is marked dead and the win condition
    /// re-checked; before the start the record is removed outright.
    pub fn remove_player(&mut self, id: PlayerId, now_ms: u64) -> Vec<Effect> {
        let mut effects = Vec::new();

        let mid_match =
            self.has_started && self.players.get(&id).is_some_and(|p| p.alive);
        if mid_match {
            let name = {
                let player = self.players.get_mut(&id).expect("checked above");
                player.alive = false;
                player.health = 0;
                player.name.clone()
            };
            effects.push(self.notice(
                NoticeKind::PlayerLeft,
                format!("{name} left the game and died"),
                vec![id],
                None,
                now_ms,
            ));
            self.check_win(&mut effects);
        } else {
            self.players.remove(&id);
            self.join_order.retain(|pid| *pid != id);
        }

        tracing::info!(
            room = %self.room,
            player_id = %id,
            players = self.players.len(),
            mid_match,
            "player removed"
        );

        effects.push(self.state_sync());
        effects
    }

    // -- Start & role assignment ------------------------------------------

    /// Handles a host start request. See [`StartOutcome`].
    pub fn start_game(&mut self, requester: PlayerId, _now_ms: u64) -> StartOutcome {
        if self.has_started {
            return StartOutcome::Rejected(Vec::new());
        }
        if self.host != Some(requester) {
            return StartOutcome::Rejected(vec![Effect::Send(
                Recipient::Player(requester),
                ServerEvent::RoomError {
                    reason: "Only the host can start the game".into(),
                },
            )]);
        }
        let Some(table) = roles_for(self.players.len()) else {
            return StartOutcome::Rejected(vec![Effect::Send(
                Recipient::Player(requester),
                ServerEvent::RoomError {
                    reason: "Need at least 3 players to start".into(),
                },
            )]);
        };

        let mut roles: Vec<Role> = table.to_vec();
        roles.shuffle(&mut rand::rng());

        let assignment: Vec<(PlayerId, Role)> =
            self.join_order.iter().copied().zip(roles).collect();
        let (monster_player, _) = assignment
            .iter()
            .copied()
            .find(|(_, role)| *role == Role::Monster)
            .expect("every role table contains a monster");
        let lookup_name = self.players[&monster_player].name.clone();

        // One-way gate: from here the room can never return to a
        // joinable lobby.
        self.has_started = true;
        self.pending_roles = Some(assignment);

        StartOutcome::Pending { monster_player, lookup_name }
    }

    /// Completes role assignment with the resolved monster type and
    /// enters the first night.
    pub fn finish_start(
        &mut self,
        monster_type: MonsterType,
        now_ms: u64,
    ) -> Vec<Effect> {
        let assignment = self
            .pending_roles
            .take()
            .expect("finish_start without a pending start");
        self.monster_type = monster_type;
        self.spec = monster_spec(monster_type);

        for (id, role) in assignment {
            let Some(player) = self.players.get_mut(&id) else {
                continue;
            };
            player.role = role;
            player.location = self.scene.spawn_for(role);
            player.health = match role {
                Role::Monster => self.spec.health,
                Role::Sheriff => SHERIFF_HEALTH,
                _ => 1,
            };
        }

        tracing::info!(
            room = %self.room,
            mode = ?self.rules.mode(),
            monster = self.spec.name,
            players = self.players.len(),
            "match started"
        );

        let mut effects = vec![
            self.notice(
                NoticeKind::GameStart,
                format!("Game starting! The monster is a {}!", self.spec.name),
                Vec::new(),
                None,
                now_ms,
            ),
            Effect::Send(Recipient::All, ServerEvent::GameStarted),
        ];
        self.enter_night(now_ms, &mut effects);
        effects
    }

    // -- Phase transitions ------------------------------------------------

    fn enter_night(&mut self, now_ms: u64, effects: &mut Vec<Effect>) {
        self.phase = Phase::Night;
        self.phase_started_ms = now_ms;
        self.phase_duration_ms = self.rules.night_duration_ms();
        self.background = self.scene.background(true).to_string();
        self.monster_actions.clear();
        self.votes.clear();
        self.notified.clear();

        match self.rules.monster_move_delay_ms(self.spec) {
            Some(delay) => {
                self.monster_movement_enabled = false;
                effects.push(Effect::Arm(TimerKind::MonsterMove, delay));
            }
            None => self.monster_movement_enabled = true,
        }

        for player in self.players.values_mut() {
            if player.alive {
                player.location = self.scene.spawn_for(player.role);
                player.hiding = false;
            }
        }

        tracing::debug!(room = %self.room, "night begins");
        effects.push(self.state_sync());
        effects.push(self.phase_update());
        effects.push(Effect::Arm(TimerKind::Phase, self.phase_duration_ms));
    }

    fn enter_day(&mut self, now_ms: u64, effects: &mut Vec<Effect>) {
        // A night kill can decide the match before dawn breaks.
        if self.check_win(effects) {
            return;
        }

        self.phase = Phase::Day;
        self.phase_started_ms = now_ms;
        self.phase_duration_ms = self.rules.day_duration_ms();
        self.background = self.scene.background(false).to_string();
        self.votes.clear();
        self.notified.clear();
        self.monster_movement_enabled = self.rules.day_monster_movement();

        for player in self.players.values_mut() {
            player.hiding = false;
            if player.alive {
                player.location = self.rules.day_spawn(player.role, self.scene);
            }
        }

        if self.rules.sends_night_replay() {
            let actions = self.monster_actions.clone();
            for player in self.players() {
                if player.role != Role::Monster {
                    effects.push(Effect::Send(
                        Recipient::Player(player.id),
                        ServerEvent::MonsterReplay { actions: actions.clone() },
                    ));
                }
            }
        }

        tracing::debug!(room = %self.room, "day begins");
        effects.push(self.phase_update());
        effects.push(self.state_sync());
        effects.push(Effect::Arm(TimerKind::Phase, self.phase_duration_ms));
    }

    /// Re-enters the session when a timer the actor armed goes off.
    pub fn timer_fired(&mut self, kind: TimerKind, now_ms: u64) -> Vec<Effect> {
        let mut effects = Vec::new();
        match kind {
            TimerKind::Phase => match self.phase {
                Phase::Night => self.enter_day(now_ms, &mut effects),
                Phase::Day => {
                    if self.rules.voting_enabled() {
                        self.resolve_votes(now_ms, &mut effects);
                    } else {
                        self.enter_night(now_ms, &mut effects);
                    }
                }
                Phase::Lobby | Phase::Ended => {}
            },
            TimerKind::MonsterMove => {
                if self.phase == Phase::Night {
                    self.monster_movement_enabled = true;
                    effects.push(self.state_sync());
                }
            }
            TimerKind::NextNight => {
                if self.phase == Phase::Day {
                    self.enter_night(now_ms, &mut effects);
                }
            }
        }
        effects
    }

    // -- Movement ---------------------------------------------------------

    /// Handles a move request. Invalid moves change nothing and answer
    /// nothing: an attacker probing the rules learns nothing from them.
    pub fn move_to(
        &mut self,
        mover: PlayerId,
        target: LocationId,
        now_ms: u64,
    ) -> Vec<Effect> {
        if self.phase == Phase::Ended {
            return Vec::new();
        }
        let Some(player) = self.players.get(&mover) else {
            return Vec::new();
        };
        if !player.alive {
            return Vec::new();
        }
        let cooldown = self.cooldown_for(player, now_ms);
        if now_ms.saturating_sub(player.last_action_ms) < cooldown {
            return Vec::new();
        }
        if !self.scene.is_adjacent(player.location, target) {
            return Vec::new();
        }
        let is_monster = player.role == Role::Monster;
        if is_monster
            && self.phase == Phase::Night
            && !self.monster_movement_enabled
        {
            return Vec::new();
        }
        let Some(destination) = self.scene.location(target) else {
            return Vec::new();
        };
        let destination_kind = destination.kind;
        let destination_name = destination.name;

        let mover_name = {
            let player = self.players.get_mut(&mover).expect("checked above");
            player.location = target;
            player.hiding = destination_kind == LocationKind::Hiding;
            player.last_action_ms = now_ms;
            player.name.clone()
        };

        let mut effects = vec![Effect::Send(
            Recipient::All,
            ServerEvent::PlayerMoved { player: mover, location: target },
        )];

        if is_monster && self.phase == Phase::Night {
            self.monster_actions.push(MonsterAction {
                at_ms: now_ms,
                kind: MonsterActionKind::Move,
                location: target,
                target: None,
                note: format!("{} moved to {}", self.spec.name, destination_name),
            });
            self.warn_players_near_monster(target, now_ms, &mut effects);
            if destination_kind == LocationKind::Hiding {
                self.ambush(mover, target, destination_name, now_ms, &mut effects);
            }
        } else if self.rules.notify_monster_of_villagers(self.phase) {
            self.warn_monster_near(&mover_name, target, now_ms, &mut effects);
        }

        effects
    }

    /// One-time "monster is near" warning for living non-monster players
    /// adjacent to the monster's new position.
    fn warn_players_near_monster(
        &mut self,
        monster_location: LocationId,
        now_ms: u64,
        effects: &mut Vec<Effect>,
    ) {
        let adjacent = self.scene.adjacent(monster_location);
        let mut nearby: Vec<(PlayerId, LocationId)> = self
            .players
            .values()
            .filter(|p| {
                p.alive
                    && p.role != Role::Monster
                    && adjacent.contains(&p.location)
                    && !self.notified.contains(&p.id)
            })
            .map(|p| (p.id, p.location))
            .collect();
        nearby.sort_by_key(|(id, _)| *id);

        let message = format!("{} is near!", self.spec.name);
        for (id, location) in nearby {
            self.notified.insert(id);
            effects.push(Effect::Send(
                Recipient::Player(id),
                ServerEvent::Notice {
                    notice: GameNotice {
                        at_ms: now_ms,
                        kind: NoticeKind::MonsterNear,
                        message: message.clone(),
                        affected: vec![id],
                        location: Some(location),
                    },
                },
            ));
        }
    }

    /// The fury-mode inverse: a villager stepping next to the monster
    /// during the day hunt tips the monster off, once per phase.
    fn warn_monster_near(
        &mut self,
        mover_name: &str,
        mover_location: LocationId,
        now_ms: u64,
        effects: &mut Vec<Effect>,
    ) {
        let adjacent = self.scene.adjacent(mover_location);
        let Some(monster) = self
            .players
            .values()
            .find(|p| p.role == Role::Monster && p.alive)
        else {
            return;
        };
        if !adjacent.contains(&monster.location)
            || self.notified.contains(&monster.id)
        {
            return;
        }
        let (monster_id, monster_location) = (monster.id, monster.location);
        self.notified.insert(monster_id);
        effects.push(Effect::Send(
            Recipient::Player(monster_id),
            ServerEvent::Notice {
                notice: GameNotice {
                    at_ms: now_ms,
                    kind: NoticeKind::MonsterNear,
                    message: format!("{mover_name} is near!"),
                    affected: vec![monster_id],
                    location: Some(monster_location),
                },
            },
        ));
    }

    /// The ambush rule: the monster entering a hiding spot kills every
    /// other living occupant except the sheriff, as a side effect of the
    /// move itself. One kill log entry, one notice, and one combat result
    /// per victim; one win check after the lot.
    fn ambush(
        &mut self,
        monster: PlayerId,
        location: LocationId,
        location_name: &str,
        now_ms: u64,
        effects: &mut Vec<Effect>,
    ) {
        let mut victims: Vec<PlayerId> = self
            .players
            .values()
            .filter(|p| {
                p.id != monster
                    && p.alive
                    && p.location == location
                    && p.role != Role::Sheriff
            })
            .map(|p| p.id)
            .collect();
        victims.sort();

        if victims.is_empty() {
            return;
        }

        for victim in victims {
            let (name, prior_health) = {
                let player = self.players.get_mut(&victim).expect("collected above");
                let prior = player.health;
                player.health = 0;
                player.alive = false;
                (player.name.clone(), prior)
            };

            self.monster_actions.push(MonsterAction {
                at_ms: now_ms,
                kind: MonsterActionKind::Kill,
                location,
                target: Some(victim),
                note: format!(
                    "{} found and killed {name} at {location_name}",
                    self.spec.name
                ),
            });
            effects.push(self.notice(
                NoticeKind::PlayerKilled,
                format!(
                    "{name} was found and killed by the {}",
                    self.spec.name
                ),
                vec![victim],
                Some(location),
                now_ms,
            ));
            effects.push(Effect::Send(
                Recipient::All,
                ServerEvent::Combat {
                    result: CombatResult {
                        attacker: monster,
                        target: victim,
                        damage: prior_health,
                        killed: true,
                        kind: CombatKind::MonsterAttack,
                    },
                },
            ));
        }

        self.check_win(effects);
    }

    // -- Combat & abilities -----------------------------------------------

    /// Monster attack: night only, same location, cooldown elapsed.
    pub fn monster_attack(
        &mut self,
        attacker: PlayerId,
        target: PlayerId,
        now_ms: u64,
    ) -> Vec<Effect> {
        let (Some(monster), Some(victim)) =
            (self.players.get(&attacker), self.players.get(&target))
        else {
            return Vec::new();
        };
        if monster.role != Role::Monster || !monster.alive || !victim.alive {
            return Vec::new();
        }
        if self.phase != Phase::Night {
            return Vec::new();
        }
        let cooldown = self.cooldown_for(monster, now_ms);
        if now_ms.saturating_sub(monster.last_action_ms) < cooldown {
            return Vec::new();
        }
        if monster.location != victim.location {
            return Vec::new();
        }

        let location = monster.location;
        let location_name = self
            .scene
            .location(location)
            .map_or("unknown", |l| l.name);
        let victim_name = victim.name.clone();

        self.players
            .get_mut(&attacker)
            .expect("checked above")
            .last_action_ms = now_ms;

        // Logged as a kill attempt whether or not the blow lands.
        self.monster_actions.push(MonsterAction {
            at_ms: now_ms,
            kind: MonsterActionKind::Kill,
            location,
            target: Some(target),
            note: format!(
                "{} attacked {victim_name} at {location_name}",
                self.spec.name
            ),
        });

        let mut effects = Vec::new();
        let result =
            self.process_combat(attacker, target, 1, CombatKind::MonsterAttack);
        let killed = result.killed;
        effects.push(Effect::Send(
            Recipient::All,
            ServerEvent::Combat { result },
        ));
        if killed {
            effects.push(self.notice(
                NoticeKind::PlayerKilled,
                format!(
                    "{victim_name} was killed by the {}",
                    self.spec.name
                ),
                vec![target],
                Some(location),
                now_ms,
            ));
        }
        self.check_win(&mut effects);
        effects
    }

    /// Sheriff shot: monster targets only. A mis-aimed shot is the one
    /// rejection that answers with a `RoomError` rather than silence.
    pub fn sheriff_shoot(
        &mut self,
        shooter: PlayerId,
        target: PlayerId,
        now_ms: u64,
    ) -> Vec<Effect> {
        let (Some(sheriff), Some(victim)) =
            (self.players.get(&shooter), self.players.get(&target))
        else {
            return Vec::new();
        };
        if sheriff.role != Role::Sheriff || !sheriff.alive || !victim.alive {
            return Vec::new();
        }
        if !self.rules.sheriff_can_shoot(self.phase) {
            return Vec::new();
        }
        if victim.role != Role::Monster {
            return vec![Effect::Send(
                Recipient::Player(shooter),
                ServerEvent::RoomError {
                    reason: "Sheriff can only shoot monsters".into(),
                },
            )];
        }
        if now_ms.saturating_sub(sheriff.last_action_ms) < SHERIFF_COOLDOWN_MS {
            return Vec::new();
        }

        self.players
            .get_mut(&shooter)
            .expect("checked above")
            .last_action_ms = now_ms;

        let damage = self.rules.sheriff_damage(self.phase);
        let result =
            self.process_combat(shooter, target, damage, CombatKind::SheriffShoot);
        if result.damage > 0 {
            // Opens the grace window that waives the monster's movement
            // cooldown for the next few seconds.
            self.last_monster_damage_ms = Some(now_ms);
        }

        let mut effects = vec![Effect::Send(
            Recipient::All,
            ServerEvent::Combat { result },
        )];
        self.check_win(&mut effects);
        effects
    }

    /// Doctor revival: night only, dead target, shared location, not self.
    pub fn doctor_revive(
        &mut self,
        doctor: PlayerId,
        target: PlayerId,
        now_ms: u64,
    ) -> Vec<Effect> {
        let (Some(healer), Some(patient)) =
            (self.players.get(&doctor), self.players.get(&target))
        else {
            return Vec::new();
        };
        if healer.role != Role::Doctor || !healer.alive {
            return Vec::new();
        }
        if self.phase != Phase::Night {
            return Vec::new();
        }
        if patient.alive || target == doctor {
            return Vec::new();
        }
        if healer.location != patient.location {
            return Vec::new();
        }

        let name = {
            let patient = self.players.get_mut(&target).expect("checked above");
            patient.alive = true;
            patient.health = 1;
            patient.name.clone()
        };

        vec![
            self.notice(
                NoticeKind::PlayerSaved,
                format!("{name} was saved by the doctor"),
                vec![target],
                None,
                now_ms,
            ),
            Effect::Send(
                Recipient::All,
                ServerEvent::PlayerRevived { player: target },
            ),
        ]
    }

    fn process_combat(
        &mut self,
        attacker: PlayerId,
        target: PlayerId,
        damage: i32,
        kind: CombatKind,
    ) -> CombatResult {
        let victim = self.players.get_mut(&target).expect("validated by caller");
        victim.health -= damage;
        let killed = victim.health <= 0;
        if killed {
            victim.alive = false;
        }
        CombatResult { attacker, target, damage, killed, kind }
    }

    // -- Voting -----------------------------------------------------------

    /// Records a vote. Re-voting overwrites; once every living player has
    /// voted the tally runs immediately instead of waiting out the day.
    pub fn cast_vote(
        &mut self,
        voter: PlayerId,
        target: PlayerId,
        now_ms: u64,
    ) -> Vec<Effect> {
        if !self.rules.voting_enabled() {
            return Vec::new();
        }
        if self.phase != Phase::Day {
            return Vec::new();
        }
        if !self.players.get(&voter).is_some_and(|p| p.alive) {
            return Vec::new();
        }

        self.votes.insert(voter, target);
        let mut effects = vec![Effect::Send(
            Recipient::All,
            ServerEvent::VoteUpdate { votes: self.votes.clone() },
        )];

        let alive_count = self.players.values().filter(|p| p.alive).count();
        if self.votes.len() == alive_count {
            self.resolve_votes(now_ms, &mut effects);
        }
        effects
    }

    fn resolve_votes(&mut self, now_ms: u64, effects: &mut Vec<Effect>) {
        let alive_count = self.players.values().filter(|p| p.alive).count();
        // A majority behind an id that isn't a player (targets are never
        // validated at cast time) resolves like any failed vote.
        let eliminated = vote::tally(&self.votes, alive_count)
            .filter(|id| self.players.contains_key(id));

        match eliminated {
            Some(id) => {
                let name = {
                    let player =
                        self.players.get_mut(&id).expect("filtered above");
                    player.alive = false;
                    player.name.clone()
                };
                effects.push(Effect::Send(
                    Recipient::All,
                    ServerEvent::VoteResult { eliminated: Some(id) },
                ));
                effects.push(self.notice(
                    NoticeKind::PlayerKilled,
                    format!("{name} was eliminated by majority vote"),
                    vec![id],
                    None,
                    now_ms,
                ));
            }
            None => {
                effects.push(Effect::Send(
                    Recipient::All,
                    ServerEvent::VoteResult { eliminated: None },
                ));
                effects.push(self.notice(
                    NoticeKind::VoteFailed,
                    "No player received majority votes. No one was eliminated."
                        .into(),
                    Vec::new(),
                    None,
                    now_ms,
                ));
            }
        }

        if self.check_win(effects) {
            return;
        }
        effects.push(Effect::Arm(TimerKind::NextNight, NEXT_NIGHT_DELAY_MS));
    }

    // -- Chat -------------------------------------------------------------

    /// Day-phase chat from living players; everything else is dropped.
    pub fn chat(&mut self, sender: PlayerId, text: String, _now_ms: u64) -> Vec<Effect> {
        if self.phase != Phase::Day {
            return Vec::new();
        }
        if !self.players.get(&sender).is_some_and(|p| p.alive) {
            return Vec::new();
        }
        vec![Effect::Send(
            Recipient::All,
            ServerEvent::ChatMessage { player: sender, text },
        )]
    }

    // -- Win handling -----------------------------------------------------

    /// Evaluates the mode's win condition; transitions to `ended` when it
    /// holds. Returns whether the match is (now) over.
    fn check_win(&mut self, effects: &mut Vec<Effect>) -> bool {
        if !self.has_started {
            return false;
        }
        if self.phase == Phase::Ended {
            return true;
        }
        match self.rules.check_win(&self.players) {
            Some(side) => {
                self.end_match(side, effects);
                true
            }
            None => false,
        }
    }

    fn end_match(&mut self, winner: Side, effects: &mut Vec<Effect>) {
        debug_assert!(self.phase != Phase::Ended, "match ended twice");

        self.winner = Some(winner);
        self.phase = Phase::Ended;

        tracing::info!(room = %self.room, ?winner, "match ended");

        effects.push(Effect::CancelTimers);
        effects.push(Effect::Send(
            Recipient::All,
            ServerEvent::GameEnded { winner },
        ));
        effects.push(Effect::Ended(EndSummary {
            winner,
            players: self
                .players()
                .map(|p| PlayerOutcome {
                    id: p.id,
                    name: p.name.clone(),
                    role: p.role,
                    alive: p.alive,
                })
                .collect(),
        }));
    }

    // -- Helpers ----------------------------------------------------------

    /// Movement cooldown for a player right now, including the grace
    /// window after the monster has taken damage.
    fn cooldown_for(&self, player: &Player, now_ms: u64) -> u64 {
        if player.role == Role::Monster && self.phase == Phase::Night {
            if let Some(hit_at) = self.last_monster_damage_ms {
                if now_ms.saturating_sub(hit_at) < GRACE_WINDOW_MS {
                    return 0;
                }
            }
        }
        self.rules.move_cooldown_ms(player.role, self.phase, self.spec)
    }

    fn notice(
        &self,
        kind: NoticeKind,
        message: String,
        affected: Vec<PlayerId>,
        location: Option<LocationId>,
        now_ms: u64,
    ) -> Effect {
        Effect::Send(
            Recipient::All,
            ServerEvent::Notice {
                notice: GameNotice { at_ms: now_ms, kind, message, affected, location },
            },
        )
    }

    fn state_sync(&self) -> Effect {
        Effect::Send(
            Recipient::All,
            ServerEvent::StateSync { state: self.snapshot() },
        )
    }

    fn phase_update(&self) -> Effect {
        Effect::Send(
            Recipient::All,
            ServerEvent::PhaseUpdate {
                phase: self.phase,
                remaining_secs: self.phase_duration_ms / 1_000,
                background: self.background.clone(),
                started_at_ms: self.phase_started_ms,
            },
        )
    }

    /// The full observable room state.
    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            room: self.room.clone(),
            mode: self.rules.mode(),
            phase: self.phase,
            monster_type: self.monster_type,
            scene: self.scene.view(),
            players: self.players().map(Player::view).collect(),
            host: self.host,
            has_started: self.has_started,
            phase_started_ms: self.phase_started_ms,
            phase_duration_ms: self.phase_duration_ms,
            votes: self.votes.clone(),
            winner: self.winner,
            monster_movement_enabled: self.monster_movement_enabled,
            background: self.background.clone(),
        }
    }
}
