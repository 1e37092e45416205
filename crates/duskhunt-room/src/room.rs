//! Room actor: an isolated Tokio task that owns one match session.
//!
//! Each room runs in its own task and communicates with the outside
//! world through an mpsc channel — the actor model, no shared mutable
//! state. Client actions, disconnects, and timer firings all enter
//! through the same inbox and are processed one at a time in arrival
//! order, so a timer can never race a player action on the same room.
//!
//! Timers are plain deadline slots in the actor: the engine asks for
//! them through [`Effect::Arm`], the `select!` loop sleeps on whichever
//! are set, and a firing re-enters the engine like any other message.
//! A disarmed slot pends forever so `select!` ignores it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant as TokioInstant};

use duskhunt_engine::{Effect, EndSummary, MatchSession, StartOutcome, TimerKind};
use duskhunt_persist::{MatchReport, ParticipantReport, Persistence};
use duskhunt_protocol::{
    ClientAction, GameMode, PlayerId, Recipient, RoomId, SceneKind, ServerEvent,
};
use duskhunt_scene::Scene;
use rand::seq::IndexedRandom;

use crate::RegistryError;

/// How long role assignment waits for the unlocked-monster lookup before
/// falling back to the default monster.
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

/// Channel sender for delivering events to one player's connection.
pub type PlayerSender = mpsc::UnboundedSender<ServerEvent>;

/// Commands sent to a room actor through its inbox.
pub(crate) enum RoomCommand {
    /// Add a player to the room.
    Join {
        player_id: PlayerId,
        name: String,
        user: Option<String>,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<(), RegistryError>>,
    },

    /// Remove a player. Replies with the remaining player count so the
    /// registry can destroy the room the moment it empties.
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<usize>,
    },

    /// Deliver a client action from a player.
    Action {
        sender: PlayerId,
        action: ClientAction,
    },

    /// Request room metadata (for matchmaking).
    Status {
        reply: oneshot::Sender<RoomStatus>,
    },

    /// Shut the room down.
    Shutdown,
}

/// A snapshot of room metadata, enough for matchmaking decisions.
#[derive(Debug, Clone)]
pub struct RoomStatus {
    pub room_id: RoomId,
    pub mode: GameMode,
    pub player_count: usize,
    pub has_started: bool,
}

/// Handle to a running room actor. Cheap to clone.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Sends a join request and waits for the verdict.
    pub async fn join(
        &self,
        player_id: PlayerId,
        name: String,
        user: Option<String>,
        sender: PlayerSender,
    ) -> Result<(), RegistryError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join { player_id, name, user, sender, reply: reply_tx })
            .await
            .map_err(|_| RegistryError::Unavailable(self.room_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RegistryError::Unavailable(self.room_id.clone()))?
    }

    /// Removes a player; returns how many remain.
    pub async fn leave(&self, player_id: PlayerId) -> Result<usize, RegistryError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Leave { player_id, reply: reply_tx })
            .await
            .map_err(|_| RegistryError::Unavailable(self.room_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RegistryError::Unavailable(self.room_id.clone()))
    }

    /// Forwards a client action (fire-and-forget).
    pub async fn action(
        &self,
        sender: PlayerId,
        action: ClientAction,
    ) -> Result<(), RegistryError> {
        self.sender
            .send(RoomCommand::Action { sender, action })
            .await
            .map_err(|_| RegistryError::Unavailable(self.room_id.clone()))
    }

    /// Requests current room metadata.
    pub async fn status(&self) -> Result<RoomStatus, RegistryError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Status { reply: reply_tx })
            .await
            .map_err(|_| RegistryError::Unavailable(self.room_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RegistryError::Unavailable(self.room_id.clone()))
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RegistryError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RegistryError::Unavailable(self.room_id.clone()))
    }
}

/// The internal room actor. Runs inside a Tokio task.
struct RoomActor<P: Persistence> {
    room_id: RoomId,
    session: MatchSession,
    /// Per-player outbound channels.
    senders: HashMap<PlayerId, PlayerSender>,
    /// Durable user ids for stats attribution.
    users: HashMap<PlayerId, String>,
    receiver: mpsc::Receiver<RoomCommand>,
    persist: Arc<P>,
    /// Base of the room-relative millisecond clock.
    epoch: Instant,
    phase_deadline: Option<TokioInstant>,
    monster_move_deadline: Option<TokioInstant>,
    next_night_deadline: Option<TokioInstant>,
}

/// Sleeps until the deadline, or forever when it is unset — the pending
/// branch lets `select!` skip disarmed timers.
async fn deadline(at: Option<TokioInstant>) {
    match at {
        Some(at) => time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

impl<P: Persistence> RoomActor<P> {
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    async fn run(mut self) {
        tracing::info!(room_id = %self.room_id, "room actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    match cmd {
                        Some(RoomCommand::Join { player_id, name, user, sender, reply }) => {
                            let result = self.handle_join(player_id, name, user, sender);
                            let _ = reply.send(result);
                        }
                        Some(RoomCommand::Leave { player_id, reply }) => {
                            let remaining = self.handle_leave(player_id);
                            let _ = reply.send(remaining);
                        }
                        Some(RoomCommand::Action { sender, action }) => {
                            self.handle_action(sender, action).await;
                        }
                        Some(RoomCommand::Status { reply }) => {
                            let _ = reply.send(RoomStatus {
                                room_id: self.room_id.clone(),
                                mode: self.session.mode(),
                                player_count: self.session.player_count(),
                                has_started: self.session.has_started(),
                            });
                        }
                        Some(RoomCommand::Shutdown) | None => break,
                    }
                }
                () = deadline(self.phase_deadline) => {
                    self.phase_deadline = None;
                    self.fire_timer(TimerKind::Phase);
                }
                () = deadline(self.monster_move_deadline) => {
                    self.monster_move_deadline = None;
                    self.fire_timer(TimerKind::MonsterMove);
                }
                () = deadline(self.next_night_deadline) => {
                    self.next_night_deadline = None;
                    self.fire_timer(TimerKind::NextNight);
                }
            }
        }

        tracing::info!(room_id = %self.room_id, "room actor stopped");
    }

    fn handle_join(
        &mut self,
        player_id: PlayerId,
        name: String,
        user: Option<String>,
        sender: PlayerSender,
    ) -> Result<(), RegistryError> {
        let now = self.now_ms();
        // Register the channel first so the join snapshot reaches the
        // joiner; rolled back on rejection.
        self.senders.insert(player_id, sender);

        match self.session.add_player(player_id, name, now) {
            Ok(effects) => {
                if let Some(user) = user {
                    self.users.insert(player_id, user);
                }
                self.apply(effects);
                Ok(())
            }
            Err(reject) => {
                self.senders.remove(&player_id);
                Err(match reject {
                    duskhunt_engine::JoinReject::Full => {
                        RegistryError::RoomFull(self.room_id.clone())
                    }
                    duskhunt_engine::JoinReject::AlreadyStarted => {
                        RegistryError::AlreadyStarted(self.room_id.clone())
                    }
                })
            }
        }
    }

    fn handle_leave(&mut self, player_id: PlayerId) -> usize {
        let now = self.now_ms();
        let effects = self.session.remove_player(player_id, now);
        self.senders.remove(&player_id);
        self.users.remove(&player_id);
        self.apply(effects);
        self.session.player_count()
    }

    async fn handle_action(&mut self, sender: PlayerId, action: ClientAction) {
        if !self.senders.contains_key(&sender) {
            tracing::warn!(
                room_id = %self.room_id,
                player_id = %sender,
                "action from non-member, ignoring"
            );
            return;
        }

        let now = self.now_ms();
        let effects = match action {
            ClientAction::StartGame => {
                self.handle_start(sender).await;
                return;
            }
            ClientAction::MoveTo { location } => {
                self.session.move_to(sender, location, now)
            }
            ClientAction::MonsterAttack { target } => {
                self.session.monster_attack(sender, target, now)
            }
            ClientAction::SheriffShoot { target } => {
                self.session.sheriff_shoot(sender, target, now)
            }
            ClientAction::DoctorRevive { target } => {
                self.session.doctor_revive(sender, target, now)
            }
            ClientAction::CastVote { target } => {
                self.session.cast_vote(sender, target, now)
            }
            ClientAction::SendChat { text } => self.session.chat(sender, text, now),
            ClientAction::CreateRoom { .. }
            | ClientAction::JoinRoom { .. }
            | ClientAction::LeaveRoom => {
                // Routed at the registry layer; inside a room they are
                // meaningless.
                tracing::debug!(
                    room_id = %self.room_id,
                    player_id = %sender,
                    "registry-level action reached a room, ignoring"
                );
                return;
            }
        };
        self.apply(effects);
    }

    /// Runs the two-step start: role assignment, then the awaited
    /// unlocked-monster lookup with timeout and default fallback. The
    /// await happens inside this actor, so other rooms are unaffected
    /// however slow the backend is.
    async fn handle_start(&mut self, requester: PlayerId) {
        match self.session.start_game(requester, self.now_ms()) {
            StartOutcome::Rejected(effects) => self.apply(effects),
            StartOutcome::Pending { monster_player, lookup_name } => {
                let monster_type = self.resolve_monster(&lookup_name).await;
                tracing::info!(
                    room_id = %self.room_id,
                    player_id = %monster_player,
                    ?monster_type,
                    "monster type resolved"
                );

                let persist = Arc::clone(&self.persist);
                let room_id = self.room_id.clone();
                tokio::spawn(async move {
                    if let Err(e) = persist.match_started(&room_id).await {
                        tracing::warn!(%room_id, error = %e, "match_started hook failed");
                    }
                });

                let effects = self.session.finish_start(monster_type, self.now_ms());
                self.apply(effects);
            }
        }
    }

    async fn resolve_monster(&self, lookup_name: &str) -> duskhunt_protocol::MonsterType {
        let unlocked = match time::timeout(
            LOOKUP_TIMEOUT,
            self.persist.unlocked_monsters(lookup_name),
        )
        .await
        {
            Ok(Ok(list)) => list,
            Ok(Err(e)) => {
                tracing::debug!(
                    room_id = %self.room_id,
                    error = %e,
                    "unlock lookup failed, using default monster"
                );
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(
                    room_id = %self.room_id,
                    "unlock lookup timed out, using default monster"
                );
                Vec::new()
            }
        };
        unlocked
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(duskhunt_catalog::DEFAULT_MONSTER)
    }

    fn fire_timer(&mut self, kind: TimerKind) {
        let now = self.now_ms();
        let effects = self.session.timer_fired(kind, now);
        self.apply(effects);
    }

    /// Carries out the engine's instructions.
    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Send(recipient, event) => self.dispatch(recipient, event),
                Effect::Arm(kind, delay_ms) => {
                    let at = TokioInstant::now() + Duration::from_millis(delay_ms);
                    match kind {
                        TimerKind::Phase => self.phase_deadline = Some(at),
                        TimerKind::MonsterMove => {
                            self.monster_move_deadline = Some(at)
                        }
                        TimerKind::NextNight => {
                            self.next_night_deadline = Some(at)
                        }
                    }
                }
                Effect::CancelTimers => {
                    self.phase_deadline = None;
                    self.monster_move_deadline = None;
                    self.next_night_deadline = None;
                }
                Effect::Ended(summary) => self.report_end(summary),
            }
        }
    }

    fn dispatch(&self, recipient: Recipient, event: ServerEvent) {
        match recipient {
            Recipient::All => {
                for sender in self.senders.values() {
                    let _ = sender.send(event.clone());
                }
            }
            Recipient::Player(id) => {
                if let Some(sender) = self.senders.get(&id) {
                    let _ = sender.send(event);
                }
            }
            Recipient::AllExcept(excluded) => {
                for (id, sender) in &self.senders {
                    if *id != excluded {
                        let _ = sender.send(event.clone());
                    }
                }
            }
        }
    }

    /// Pushes the terminal report toward persistence, fire-and-forget.
    /// The session is already `ended`; a write failure only gets logged.
    fn report_end(&self, summary: EndSummary) {
        let report = MatchReport {
            room: self.room_id.clone(),
            winner: summary.winner,
            participants: summary
                .players
                .into_iter()
                .map(|p| ParticipantReport {
                    player: p.id,
                    user: self.users.get(&p.id).cloned(),
                    name: p.name,
                    role: p.role,
                    alive: p.alive,
                })
                .collect(),
        };

        let persist = Arc::clone(&self.persist);
        let room_id = self.room_id.clone();
        tokio::spawn(async move {
            if let Err(e) = persist.match_ended(report).await {
                tracing::warn!(%room_id, error = %e, "match_ended hook failed");
            }
        });
    }
}

/// Spawns a new room actor task and returns a handle to it.
pub(crate) fn spawn_room<P: Persistence>(
    room_id: RoomId,
    mode: GameMode,
    scene: SceneKind,
    persist: Arc<P>,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = RoomActor {
        room_id: room_id.clone(),
        session: MatchSession::new(room_id.clone(), mode, Scene::get(scene)),
        senders: HashMap::new(),
        users: HashMap::new(),
        receiver: rx,
        persist,
        epoch: Instant::now(),
        phase_deadline: None,
        monster_move_deadline: None,
        next_night_deadline: None,
    };

    tokio::spawn(actor.run());

    RoomHandle { room_id, sender: tx }
}
