//! The boundary toward the external Persistence Service.
//!
//! Duskhunt does not store accounts, stats, or match history itself —
//! that lives in a separate service. The core talks to it through the
//! [`Persistence`] trait: one best-effort read (which monster types a
//! player has unlocked, used once during role assignment) and three
//! fire-and-forget write hooks (match created / started / ended).
//!
//! The write hooks are invoked after the in-memory session state is
//! already committed; a failing backend is logged and never retried, and
//! must never affect a running room.

use std::collections::HashMap;
use std::sync::Mutex;

use duskhunt_protocol::{GameMode, MonsterType, PlayerId, Role, RoomId, Side};

/// Errors from the persistence backend.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// The backend could not be reached or timed out.
    #[error("persistence backend unavailable: {0}")]
    Unavailable(String),

    /// The durable user id is not known to the backend.
    #[error("unknown user: {0}")]
    UnknownUser(String),
}

/// One participant in a finished match, as reported for stats attribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantReport {
    pub player: PlayerId,
    pub name: String,
    /// Durable user id, when the player logged in with one. Anonymous
    /// players appear in the report but earn nothing.
    pub user: Option<String>,
    pub role: Role,
    pub alive: bool,
}

/// The terminal report pushed once per match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchReport {
    pub room: RoomId,
    pub winner: Side,
    pub participants: Vec<ParticipantReport>,
}

/// The Persistence Service interface.
///
/// Implementations must be cheap to share across rooms; every method may
/// be called concurrently from different room actors.
pub trait Persistence: Send + Sync + 'static {
    /// Which monster types this user has unlocked.
    ///
    /// Called once per match, while the monster role is being resolved.
    /// Callers bound this with a timeout and fall back to the default
    /// monster on any error or empty set — role assignment never fails
    /// because of this lookup.
    fn unlocked_monsters(
        &self,
        user: &str,
    ) -> impl Future<Output = Result<Vec<MonsterType>, PersistError>> + Send;

    /// A room was created.
    fn match_created(
        &self,
        room: &RoomId,
        mode: GameMode,
    ) -> impl Future<Output = Result<(), PersistError>> + Send;

    /// A match left the lobby.
    fn match_started(
        &self,
        room: &RoomId,
    ) -> impl Future<Output = Result<(), PersistError>> + Send;

    /// A match reached its terminal state.
    fn match_ended(
        &self,
        report: MatchReport,
    ) -> impl Future<Output = Result<(), PersistError>> + Send;
}

// ---------------------------------------------------------------------------
// NoopPersistence
// ---------------------------------------------------------------------------

/// A backend that stores nothing.
///
/// Every lookup reports no unlocks (so the default monster is used) and
/// every write succeeds silently. Useful for local servers without a
/// persistence deployment.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPersistence;

impl Persistence for NoopPersistence {
    async fn unlocked_monsters(
        &self,
        _user: &str,
    ) -> Result<Vec<MonsterType>, PersistError> {
        Ok(Vec::new())
    }

    async fn match_created(
        &self,
        room: &RoomId,
        mode: GameMode,
    ) -> Result<(), PersistError> {
        tracing::debug!(%room, ?mode, "match created (noop persistence)");
        Ok(())
    }

    async fn match_started(&self, room: &RoomId) -> Result<(), PersistError> {
        tracing::debug!(%room, "match started (noop persistence)");
        Ok(())
    }

    async fn match_ended(&self, report: MatchReport) -> Result<(), PersistError> {
        tracing::debug!(
            room = %report.room,
            winner = ?report.winner,
            "match ended (noop persistence)"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryPersistence
// ---------------------------------------------------------------------------

/// An in-memory backend for development and tests.
///
/// Unlocks are seeded up front; every hook invocation is recorded so
/// tests can assert on what the core reported.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    unlocks: Mutex<HashMap<String, Vec<MonsterType>>>,
    created: Mutex<Vec<RoomId>>,
    started: Mutex<Vec<RoomId>>,
    ended: Mutex<Vec<MatchReport>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the unlocked monster set for a user.
    pub fn grant(&self, user: &str, monsters: Vec<MonsterType>) {
        self.unlocks
            .lock()
            .expect("unlocks lock")
            .insert(user.to_string(), monsters);
    }

    pub fn created_rooms(&self) -> Vec<RoomId> {
        self.created.lock().expect("created lock").clone()
    }

    pub fn started_rooms(&self) -> Vec<RoomId> {
        self.started.lock().expect("started lock").clone()
    }

    pub fn ended_matches(&self) -> Vec<MatchReport> {
        self.ended.lock().expect("ended lock").clone()
    }
}

impl Persistence for MemoryPersistence {
    async fn unlocked_monsters(
        &self,
        user: &str,
    ) -> Result<Vec<MonsterType>, PersistError> {
        let unlocks = self.unlocks.lock().expect("unlocks lock");
        unlocks
            .get(user)
            .cloned()
            .ok_or_else(|| PersistError::UnknownUser(user.to_string()))
    }

    async fn match_created(
        &self,
        room: &RoomId,
        _mode: GameMode,
    ) -> Result<(), PersistError> {
        self.created.lock().expect("created lock").push(room.clone());
        Ok(())
    }

    async fn match_started(&self, room: &RoomId) -> Result<(), PersistError> {
        self.started.lock().expect("started lock").push(room.clone());
        Ok(())
    }

    async fn match_ended(&self, report: MatchReport) -> Result<(), PersistError> {
        self.ended.lock().expect("ended lock").push(report);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_lookup_reports_no_unlocks() {
        let backend = NoopPersistence;
        let unlocked = backend.unlocked_monsters("anyone").await.unwrap();
        assert!(unlocked.is_empty());
    }

    #[tokio::test]
    async fn test_memory_lookup_unknown_user_returns_error() {
        let backend = MemoryPersistence::new();
        let result = backend.unlocked_monsters("ghost").await;
        assert!(matches!(result, Err(PersistError::UnknownUser(_))));
    }

    #[tokio::test]
    async fn test_memory_lookup_returns_granted_set() {
        let backend = MemoryPersistence::new();
        backend.grant("ada", vec![MonsterType::Vampire]);

        let unlocked = backend.unlocked_monsters("ada").await.unwrap();
        assert_eq!(unlocked, vec![MonsterType::Vampire]);
    }

    #[tokio::test]
    async fn test_memory_records_lifecycle_hooks() {
        let backend = MemoryPersistence::new();
        let room = RoomId::new("AAAA11");

        backend.match_created(&room, GameMode::Discuss).await.unwrap();
        backend.match_started(&room).await.unwrap();
        backend
            .match_ended(MatchReport {
                room: room.clone(),
                winner: Side::Monster,
                participants: vec![],
            })
            .await
            .unwrap();

        assert_eq!(backend.created_rooms(), vec![room.clone()]);
        assert_eq!(backend.started_rooms(), vec![room.clone()]);
        assert_eq!(backend.ended_matches().len(), 1);
    }
}
