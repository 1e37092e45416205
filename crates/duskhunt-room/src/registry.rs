//! The room registry: creates and finds rooms, routes connections.
//!
//! One registry per process, owned by the server and shared behind a
//! lock. It tracks which connection sits in which room, room passwords,
//! and durable participant ids, and it invokes the Persistence Service
//! hooks at room creation. Entries are added and removed together with
//! the room they belong to: the moment a room's player count reaches
//! zero it is destroyed along with all of its routing state.

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use rand::seq::IndexedRandom;

use duskhunt_catalog::MAX_PLAYERS;
use duskhunt_persist::Persistence;
use duskhunt_protocol::{ClientAction, GameMode, PlayerId, RoomId, SceneKind};
use duskhunt_scene::Scene;

use crate::room::{PlayerSender, RoomHandle, spawn_room};
use crate::{RegistryError, RoomStatus};

/// Command channel size for room actors.
const ROOM_CHANNEL_SIZE: usize = 64;

/// Length of generated room codes.
const ROOM_CODE_LEN: usize = 6;

/// Everything a `CreateRoom` request carries.
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub name: String,
    pub mode: GameMode,
    pub user: Option<String>,
    pub is_private: bool,
    pub password: Option<String>,
    pub scene: Option<SceneKind>,
}

/// Manages all active rooms and per-connection routing state.
pub struct RoomRegistry<P: Persistence> {
    rooms: HashMap<RoomId, RoomHandle>,
    /// One room per connection (key invariant).
    conn_rooms: HashMap<PlayerId, RoomId>,
    /// Private room passwords.
    passwords: HashMap<RoomId, String>,
    /// Durable user ids seen per room, for stats attribution.
    participants: HashMap<RoomId, Vec<String>>,
    /// Durable user id per connection.
    conn_users: HashMap<PlayerId, String>,
    persist: Arc<P>,
}

impl<P: Persistence> RoomRegistry<P> {
    pub fn new(persist: Arc<P>) -> Self {
        Self {
            rooms: HashMap::new(),
            conn_rooms: HashMap::new(),
            passwords: HashMap::new(),
            participants: HashMap::new(),
            conn_users: HashMap::new(),
            persist,
        }
    }

    /// Handles a create-room request.
    ///
    /// Public requests matchmake first: any same-mode room that is not
    /// full, not started, and not password-protected will do. Private
    /// rooms are always created fresh and never matched into.
    pub async fn find_or_create(
        &mut self,
        conn: PlayerId,
        request: CreateRequest,
        sender: PlayerSender,
    ) -> Result<RoomId, RegistryError> {
        if let Some(existing) = self.conn_rooms.get(&conn) {
            return Err(RegistryError::AlreadyInRoom(conn, existing.clone()));
        }

        if !request.is_private {
            // A room can fill up between the status query and the join;
            // just keep scanning when that happens.
            let handles: Vec<RoomHandle> = self.rooms.values().cloned().collect();
            for handle in handles {
                let Ok(status) = handle.status().await else {
                    continue;
                };
                if status.mode != request.mode
                    || status.has_started
                    || status.player_count >= MAX_PLAYERS
                    || self.passwords.contains_key(&status.room_id)
                {
                    continue;
                }
                if handle
                    .join(
                        conn,
                        request.name.clone(),
                        request.user.clone(),
                        sender.clone(),
                    )
                    .await
                    .is_ok()
                {
                    let room_id = status.room_id;
                    self.track_member(conn, &room_id, request.user.as_deref());
                    tracing::info!(%room_id, conn = %conn, "matched into existing room");
                    return Ok(room_id);
                }
            }
        }

        self.create_room(conn, request, sender).await
    }

    async fn create_room(
        &mut self,
        conn: PlayerId,
        request: CreateRequest,
        sender: PlayerSender,
    ) -> Result<RoomId, RegistryError> {
        let room_id = self.fresh_room_code();
        let scene = request
            .scene
            .unwrap_or_else(|| {
                *Scene::ALL_KINDS
                    .choose(&mut rand::rng())
                    .expect("scene list is non-empty")
            });

        let handle = spawn_room(
            room_id.clone(),
            request.mode,
            scene,
            Arc::clone(&self.persist),
            ROOM_CHANNEL_SIZE,
        );
        self.rooms.insert(room_id.clone(), handle.clone());

        if request.is_private {
            if let Some(password) = request.password.clone() {
                self.passwords.insert(room_id.clone(), password);
            }
        }

        tracing::info!(
            %room_id,
            mode = ?request.mode,
            ?scene,
            private = request.is_private,
            "room created"
        );

        // Fire-and-forget: the room does not wait for the history write.
        let persist = Arc::clone(&self.persist);
        let created_room = room_id.clone();
        let mode = request.mode;
        tokio::spawn(async move {
            if let Err(e) = persist.match_created(&created_room, mode).await {
                tracing::warn!(room_id = %created_room, error = %e, "match_created hook failed");
            }
        });

        handle.join(conn, request.name, request.user.clone(), sender).await?;
        self.track_member(conn, &room_id, request.user.as_deref());
        Ok(room_id)
    }

    /// Joins a specific room by code, validating the password first.
    pub async fn join(
        &mut self,
        conn: PlayerId,
        room_id: &RoomId,
        name: String,
        user: Option<String>,
        password: Option<String>,
        sender: PlayerSender,
    ) -> Result<(), RegistryError> {
        if let Some(existing) = self.conn_rooms.get(&conn) {
            return Err(RegistryError::AlreadyInRoom(conn, existing.clone()));
        }
        let handle = self
            .rooms
            .get(room_id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(room_id.clone()))?;

        if let Some(expected) = self.passwords.get(room_id) {
            if password.as_deref() != Some(expected.as_str()) {
                return Err(RegistryError::WrongPassword(room_id.clone()));
            }
        }

        handle.join(conn, name, user.clone(), sender).await?;
        self.track_member(conn, room_id, user.as_deref());
        Ok(())
    }

    /// Routes an in-room client action to the owning session.
    pub async fn route(
        &self,
        conn: PlayerId,
        action: ClientAction,
    ) -> Result<(), RegistryError> {
        let room_id = self
            .conn_rooms
            .get(&conn)
            .ok_or(RegistryError::NotInRoom(conn))?;
        let handle = self
            .rooms
            .get(room_id)
            .ok_or_else(|| RegistryError::NotFound(room_id.clone()))?;
        handle.action(conn, action).await
    }

    /// Handles a leave or disconnect. Ordinary inbound work, not an
    /// interrupt: the owning room processes it through its inbox like
    /// any action, marking mid-match leavers dead. Destroys the room
    /// once it empties.
    pub async fn remove_connection(&mut self, conn: PlayerId) {
        self.conn_users.remove(&conn);
        let Some(room_id) = self.conn_rooms.remove(&conn) else {
            return;
        };
        let Some(handle) = self.rooms.get(&room_id).cloned() else {
            return;
        };

        match handle.leave(conn).await {
            Ok(0) => self.destroy_room(&room_id).await,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(%room_id, error = %e, "leave failed, destroying room");
                self.destroy_room(&room_id).await;
            }
        }
    }

    async fn destroy_room(&mut self, room_id: &RoomId) {
        if let Some(handle) = self.rooms.remove(room_id) {
            let _ = handle.shutdown().await;
        }
        self.passwords.remove(room_id);
        self.participants.remove(room_id);
        self.conn_rooms.retain(|_, rid| rid != room_id);
        tracing::info!(%room_id, "room destroyed");
    }

    /// Metadata for one room.
    pub async fn status(&self, room_id: &RoomId) -> Result<RoomStatus, RegistryError> {
        let handle = self
            .rooms
            .get(room_id)
            .ok_or_else(|| RegistryError::NotFound(room_id.clone()))?;
        handle.status().await
    }

    /// The room a connection currently sits in.
    pub fn room_of(&self, conn: PlayerId) -> Option<&RoomId> {
        self.conn_rooms.get(&conn)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Durable user ids seen in a room, in first-seen order.
    pub fn participants(&self, room_id: &RoomId) -> &[String] {
        self.participants.get(room_id).map_or(&[], Vec::as_slice)
    }

    fn track_member(&mut self, conn: PlayerId, room_id: &RoomId, user: Option<&str>) {
        self.conn_rooms.insert(conn, room_id.clone());
        if let Some(user) = user {
            self.conn_users.insert(conn, user.to_string());
            let seen = self.participants.entry(room_id.clone()).or_default();
            if !seen.iter().any(|u| u == user) {
                seen.push(user.to_string());
            }
        }
    }

    /// Generates an unused 6-character uppercase room code.
    fn fresh_room_code(&self) -> RoomId {
        const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ0123456789";
        let mut rng = rand::rng();
        loop {
            let code: String = (0..ROOM_CODE_LEN)
                .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
                .collect();
            let id = RoomId::new(code);
            if !self.rooms.contains_key(&id) {
                return id;
            }
        }
    }
}
