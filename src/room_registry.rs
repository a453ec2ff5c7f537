//! Keyed container of rooms with a capacity limit (§4.4).

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::error::AgError;
use crate::id::Id;
use crate::logger::{Level, Logger};
use crate::room::Room;
use crate::user::RoomUser;

struct Inner {
    limit: usize,
    rooms: BTreeMap<Id, Arc<Room>>,
}

pub struct RoomRegistry {
    lobby_lifetime: Duration,
    game_lifetime: Duration,
    log: Logger,
    inner: RwLock<Inner>,
}

impl RoomRegistry {
    pub fn new(limit: usize, lobby_lifetime: Duration, game_lifetime: Duration, log: Logger) -> Self {
        Self {
            lobby_lifetime,
            game_lifetime,
            log,
            inner: RwLock::new(Inner {
                limit,
                rooms: BTreeMap::new(),
            }),
        }
    }

    pub fn create(&self, version: &str, owner: RoomUser, size: usize) -> Result<Arc<Room>, AgError> {
        let mut inner = self.inner.write();
        if inner.rooms.len() >= inner.limit {
            return Err(AgError::forbidden(format!(
                "Room limit reached. Max room count is {}.",
                inner.limit
            )));
        }
        let owner_id = owner.id;
        let room = Arc::new(Room::new(
            version.to_owned(),
            owner,
            size,
            self.lobby_lifetime,
            self.game_lifetime,
            self.log.clone(),
        )?);
        inner.rooms.insert(room.id, room.clone());
        (self.log)(
            Level::Info,
            &format!(
                "Room created: {} (version={version}, owner_id={owner_id}, size={size})",
                room.id
            ),
        );
        Ok(room)
    }

    pub fn get(&self, id: Id) -> Result<Arc<Room>, AgError> {
        self.inner
            .read()
            .rooms
            .get(&id)
            .cloned()
            .ok_or_else(|| AgError::not_found("Room not found."))
    }

    pub fn exists(&self, id: Id) -> bool {
        self.inner.read().rooms.contains_key(&id)
    }

    pub fn remove(&self, id: Id) -> bool {
        let removed = self.inner.write().rooms.remove(&id).is_some();
        if removed {
            (self.log)(Level::Info, &format!("Room removed: {id}"));
        }
        removed
    }

    pub fn count(&self) -> usize {
        self.inner.read().rooms.len()
    }

    pub fn get_all(&self) -> Vec<Arc<Room>> {
        self.inner.read().rooms.values().cloned().collect()
    }

    pub fn get_limit(&self) -> usize {
        self.inner.read().limit
    }

    pub fn set_limit(&self, new_limit: usize) {
        self.inner.write().limit = new_limit;
    }

    /// Snapshots the room list under the registry lock, then does
    /// per-room work without holding it (§4.4) — a long-running sweep of
    /// many rooms never blocks `create`/`get` on other requests.
    pub fn clean(&self, user_timeout: Duration) {
        for room in self.get_all() {
            if !room.is_available() {
                self.remove(room.id);
            } else {
                room.kick_expired(user_timeout);
                room.clean_sync_records();
            }
        }
    }
}
