//! A room: membership, the lobby/in-game lifecycle, and the sync barrier
//! (§4.3) — the core of the system.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::condvar::RoomCondvar;
use crate::error::AgError;
use crate::event::Event;
use crate::id::Id;
use crate::logger::{Level, Logger};
use crate::phase::Phase;
use crate::sync_record::SyncRecord;
use crate::user::RoomUser;

/// Owner-writable room-level blob (§4.3 `update_info`). Unbounded in the
/// original design; capped here per §9's Open Question.
pub const MAX_INFO_BYTES: usize = 16 * 1024;

struct Inner {
    expire_time: Instant,
    users: BTreeMap<Id, RoomUser>,
    in_lobby: bool,
    info: serde_json::Value,
    sync_records: BTreeMap<Id, Arc<SyncRecord>>,
}

pub struct Room {
    pub id: Id,
    pub version: String,
    pub size: usize,
    lobby_lifetime: Duration,
    game_lifetime: Duration,
    log: Logger,
    inner: RwLock<Inner>,
    sync_cv: RoomCondvar,
}

impl Room {
    pub const VERSION_MAX_LENGTH: usize = 32;
    pub const SIZE_MIN: usize = 2;
    pub const SIZE_MAX: usize = 4;

    pub fn new(
        version: String,
        owner: RoomUser,
        size: usize,
        lobby_lifetime: Duration,
        game_lifetime: Duration,
        log: Logger,
    ) -> Result<Self, AgError> {
        if version.is_empty() || version.len() > Self::VERSION_MAX_LENGTH {
            return Err(AgError::bad_request(format!(
                "Invalid room version length: {}. Must be between 1 and {}.",
                version.len(),
                Self::VERSION_MAX_LENGTH
            )));
        }
        if !(Self::SIZE_MIN..=Self::SIZE_MAX).contains(&size) {
            return Err(AgError::bad_request(format!(
                "Invalid room size: {}. Must be between {} and {}.",
                size,
                Self::SIZE_MIN,
                Self::SIZE_MAX
            )));
        }
        let mut users = BTreeMap::new();
        users.insert(owner.id, owner);
        let initial_record = Arc::new(SyncRecord::new());
        let mut sync_records = BTreeMap::new();
        sync_records.insert(initial_record.id, initial_record);
        Ok(Self {
            id: Id::new(),
            version,
            size,
            lobby_lifetime,
            game_lifetime,
            log,
            inner: RwLock::new(Inner {
                expire_time: Instant::now() + lobby_lifetime,
                users,
                in_lobby: true,
                info: serde_json::Value::Null,
                sync_records,
            }),
            sync_cv: RoomCondvar::new(),
        })
    }

    pub fn get_expire_time(&self) -> Instant {
        self.inner.read().expire_time
    }

    /// Adds `user` to the room. Cursor is set to the id of the previous
    /// (second-to-last) sync record when the room already has one beyond
    /// its current tail — see §9's joiner-bootstrap Open Question — not to
    /// the tail itself, which the joiner did not exist to contribute to.
    pub fn join(&self, version: &str, mut user: RoomUser) -> Result<(), AgError> {
        if version != self.version {
            return Err(AgError::bad_request(format!(
                "Invalid room version: {}. This roon version is {}.",
                version, self.version
            )));
        }
        let mut inner = self.inner.write();
        if !inner.in_lobby {
            return Err(AgError::forbidden("Game already started."));
        }
        if inner.users.len() >= self.size {
            return Err(AgError::forbidden(format!(
                "Room is full. Max user count is {}.",
                self.size
            )));
        }
        if inner.users.contains_key(&user.id) {
            return Err(AgError::forbidden("User already in the room."));
        }
        let prev_id = inner
            .sync_records
            .keys()
            .rev()
            .nth(1)
            .copied()
            .unwrap_or_else(Id::nil);
        user.update_last(prev_id);
        inner.users.insert(user.id, user);
        Ok(())
    }

    pub fn get_user(&self, id: Id) -> Result<RoomUser, AgError> {
        self.inner
            .read()
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| AgError::not_found("User not found."))
    }

    pub fn has_user(&self, id: Id) -> bool {
        self.inner.read().users.contains_key(&id)
    }

    pub fn get_users(&self) -> Vec<RoomUser> {
        self.inner.read().users.values().cloned().collect()
    }

    pub fn get_user_ids(&self) -> Vec<Id> {
        self.inner.read().users.keys().copied().collect()
    }

    pub fn get_owner(&self) -> Result<RoomUser, AgError> {
        self.inner
            .read()
            .users
            .values()
            .next()
            .cloned()
            .ok_or_else(|| AgError::not_found("Room is empty."))
    }

    pub fn count_users(&self) -> usize {
        self.inner.read().users.len()
    }

    pub fn kick(&self, id: Id) -> bool {
        self.inner.write().users.remove(&id).is_some()
    }

    pub fn kick_expired(&self, timeout: Duration) -> usize {
        let mut inner = self.inner.write();
        let now = Instant::now();
        let before = inner.users.len();
        inner.users.retain(|_, user| now.duration_since(user.last_time()) <= timeout);
        before - inner.users.len()
    }

    pub fn is_in_lobby(&self) -> bool {
        self.inner.read().in_lobby
    }

    pub fn start_game(&self) -> Result<(), AgError> {
        let mut inner = self.inner.write();
        if !inner.in_lobby {
            return Err(AgError::forbidden("Game already started."));
        }
        if inner.users.len() < 2 {
            return Err(AgError::forbidden("Not enough players to start the game."));
        }
        inner.in_lobby = false;
        inner.expire_time = Instant::now() + self.game_lifetime;
        (self.log)(
            Level::Info,
            &format!(
                "Game started: {} (users={})",
                self.id,
                inner.users.len()
            ),
        );
        Ok(())
    }

    pub fn is_available(&self) -> bool {
        let inner = self.inner.read();
        if Instant::now() > inner.expire_time {
            return false;
        }
        if inner.in_lobby {
            !inner.users.is_empty()
        } else {
            inner.users.len() >= 2
        }
    }

    pub fn get_info(&self) -> serde_json::Value {
        self.inner.read().info.clone()
    }

    pub fn update_info(&self, new_info: serde_json::Value) -> Result<(), AgError> {
        let encoded_len = serde_json::to_vec(&new_info).map(|v| v.len()).unwrap_or(usize::MAX);
        if encoded_len > MAX_INFO_BYTES {
            return Err(AgError::bad_request(format!(
                "room_info is too large: {encoded_len} bytes. Must be at most {MAX_INFO_BYTES}."
            )));
        }
        self.inner.write().info = new_info;
        Ok(())
    }

    /// The sync barrier (§4.3). Submits `caller`'s events, waits (bounded)
    /// for stragglers and then for fan-out, then returns every sync
    /// record newer than `caller`'s cursor, up to and including the tail
    /// that was current when this call started.
    pub fn sync(
        &self,
        caller: Id,
        reports: &[Arc<Event>],
        actions: &[Arc<Event>],
        wait_timeout: Duration,
        sync_timeout: Duration,
    ) -> Result<Vec<Arc<SyncRecord>>, AgError> {
        let mut inner = self.inner.write();

        if !inner.users.contains_key(&caller) {
            return Err(AgError::forbidden("User not in the room."));
        }

        let tail = inner
            .sync_records
            .values()
            .next_back()
            .expect("a room always has at least one sync record")
            .clone();
        let prev = inner
            .sync_records
            .values()
            .rev()
            .nth(1)
            .cloned();

        if tail.get_phase(caller) > Phase::Created {
            return Err(AgError::forbidden("User already synced this tick."));
        }
        if tail.get_max_phase() >= Phase::Synced {
            return Err(AgError::forbidden("Room already synced this tick."));
        }

        // Step 1: submit.
        tail.add_events(caller, reports, actions)?;

        // Step 2: let stragglers from the previous tick catch up.
        let should_wait_for_stragglers = tail.get_max_phase() <= Phase::Waiting
            && prev.as_ref().is_some_and(|p| p.get_phase(caller) < Phase::Synced);
        if should_wait_for_stragglers {
            self.sync_cv.wait_while_for(&mut inner, wait_timeout, || {
                !(tail.get_max_phase() > Phase::Waiting)
            });
        }
        tail.advance_phase(caller, Phase::Syncing);
        self.sync_cv.notify_all();

        // Step 4: wait for this tick's remaining participants to submit.
        let user_ids: Vec<Id> = inner.users.keys().copied().collect();
        let anyone_not_submitted = user_ids.iter().any(|id| tail.get_phase(*id) <= Phase::Created);
        if anyone_not_submitted {
            self.sync_cv.wait_while_for(&mut inner, sync_timeout, || {
                !(tail.get_max_phase() > Phase::Syncing)
            });
        }
        tail.advance_phase(caller, Phase::Synced);
        self.sync_cv.notify_all();

        // Step 6: collect every record newer than caller's cursor, up to
        // and including the tail this call started with.
        let from_id = inner
            .users
            .get(&caller)
            .expect("caller was checked present above")
            .last_sync_id();
        let records: Vec<Arc<SyncRecord>> = inner
            .sync_records
            .range((Bound::Excluded(from_id), Bound::Included(tail.id)))
            .map(|(_, record)| record.clone())
            .collect();
        for record in &records {
            record.advance_phase(caller, Phase::Synced);
        }

        // Step 7: spawn the next tail once nobody is still mid-barrier on
        // this one.
        let everyone_settled = user_ids
            .iter()
            .all(|id| tail.get_phase(*id) <= Phase::Created || tail.get_phase(*id) >= Phase::Synced);
        if everyone_settled {
            let next = Arc::new(SyncRecord::new());
            inner.sync_records.insert(next.id, next);
        }

        // Step 8: advance caller's cursor to the tail this call closed.
        inner
            .users
            .get_mut(&caller)
            .expect("caller was checked present above")
            .update_last(tail.id);

        Ok(records)
    }

    /// Removes every sync record that every current user has fully
    /// consumed (phase ≥ SYNCED for all of them). The tail is never
    /// removed — a room's sync record map is never empty while it exists.
    pub fn clean_sync_records(&self) -> usize {
        let mut inner = self.inner.write();
        if inner.users.is_empty() {
            return 0;
        }
        let user_ids: Vec<Id> = inner.users.keys().copied().collect();
        let tail_id = *inner
            .sync_records
            .keys()
            .next_back()
            .expect("a room always has at least one sync record");
        let before = inner.sync_records.len();
        inner.sync_records.retain(|&id, record| {
            id == tail_id || !user_ids.iter().all(|uid| record.get_phase(*uid) >= Phase::Synced)
        });
        before - inner.sync_records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(size: usize) -> (Room, Id) {
        let owner = RoomUser::new("owner").unwrap();
        let owner_id = owner.id;
        let room = Room::new(
            "v1".to_owned(),
            owner,
            size,
            Duration::from_secs(600),
            Duration::from_secs(1200),
            crate::logger::noop(),
        )
        .unwrap();
        (room, owner_id)
    }

    #[test]
    fn rejects_oversize_room() {
        let owner = RoomUser::new("owner").unwrap();
        let err = Room::new(
            "v1".to_owned(),
            owner,
            5,
            Duration::from_secs(1),
            Duration::from_secs(1),
            crate::logger::noop(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), crate::error::Kind::BadRequest);
    }

    #[test]
    fn join_rejects_version_mismatch() {
        let (room, _) = room(2);
        let err = room.join("v2", RoomUser::new("bob").unwrap()).unwrap_err();
        assert_eq!(err.kind(), crate::error::Kind::BadRequest);
    }

    #[test]
    fn join_rejects_full_room() {
        let (room, _) = room(2);
        room.join("v1", RoomUser::new("bob").unwrap()).unwrap();
        let err = room.join("v1", RoomUser::new("carol").unwrap()).unwrap_err();
        assert_eq!(err.kind(), crate::error::Kind::Forbidden);
    }

    #[test]
    fn join_rejects_started_game() {
        let (room, _) = room(2);
        room.join("v1", RoomUser::new("bob").unwrap()).unwrap();
        room.start_game().unwrap();
        let err = room.join("v1", RoomUser::new("carol").unwrap()).unwrap_err();
        assert_eq!(err.kind(), crate::error::Kind::Forbidden);
    }

    #[test]
    fn first_joiner_cursor_is_nil_with_one_tail_record() {
        // A room freshly created only has its single tail record; a
        // joiner who hasn't missed anything gets a nil cursor.
        let (room, _) = room(2);
        let bob = RoomUser::new("bob").unwrap();
        let bob_id = bob.id;
        room.join("v1", bob).unwrap();
        assert!(room.get_user(bob_id).unwrap().last_sync_id().is_nil());
    }

    #[test]
    fn owner_is_first_inserted_user() {
        let (room, owner_id) = room(3);
        room.join("v1", RoomUser::new("bob").unwrap()).unwrap();
        assert_eq!(room.get_owner().unwrap().id, owner_id);
    }

    #[test]
    fn start_game_requires_two_users() {
        let (room, _) = room(2);
        let err = room.start_game().unwrap_err();
        assert_eq!(err.kind(), crate::error::Kind::Forbidden);
    }

    #[test]
    fn start_game_flips_lobby_flag() {
        let (room, _) = room(2);
        room.join("v1", RoomUser::new("bob").unwrap()).unwrap();
        assert!(room.is_in_lobby());
        room.start_game().unwrap();
        assert!(!room.is_in_lobby());
    }

    #[test]
    fn is_available_reflects_lobby_and_game_minimums() {
        let (room, owner_id) = room(2);
        assert!(room.is_available(), "a lobby with just the owner is available");
        room.kick(owner_id);
        assert!(!room.is_available(), "an empty lobby is not available");
    }

    #[test]
    fn is_available_false_once_past_expiry() {
        let owner = RoomUser::new("owner").unwrap();
        let room = Room::new(
            "v1".to_owned(),
            owner,
            2,
            Duration::from_millis(1),
            Duration::from_secs(600),
            crate::logger::noop(),
        )
        .unwrap();
        std::thread::sleep(Duration::from_millis(10));
        assert!(!room.is_available());
    }

    #[test]
    fn update_info_rejects_oversize_blob() {
        let (room, _) = room(2);
        let huge = serde_json::json!("x".repeat(MAX_INFO_BYTES + 1));
        let err = room.update_info(huge).unwrap_err();
        assert_eq!(err.kind(), crate::error::Kind::BadRequest);
    }

    #[test]
    fn sync_rejects_non_member() {
        let (room, _) = room(2);
        let err = room
            .sync(Id::new(), &[], &[], Duration::from_millis(10), Duration::from_millis(10))
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::Kind::Forbidden);
    }

    // The barrier's "same tick" guarantees (matching top id, at-most-one
    // in-flight call per user) only show up under genuine concurrency: a
    // solo, uncontested call always finds every other user vacuously
    // settled (still CREATED) and rolls the tail behind it before
    // returning, so two sequential solo calls never land on the same
    // record. These spawn real threads to exercise the overlap.

    #[test]
    fn concurrent_two_user_sync_shares_top_id_and_exchanges_events() {
        let (room, owner_id) = room(2);
        let bob = RoomUser::new("bob").unwrap();
        let bob_id = bob.id;
        room.join("v1", bob).unwrap();
        room.start_game().unwrap();
        let room = Arc::new(room);

        let report = Arc::new(Event::new(Id::new(), owner_id, "x".to_owned(), serde_json::json!({})));
        let action = Arc::new(Event::new(Id::new(), bob_id, "y".to_owned(), serde_json::json!({})));
        let barrier = Arc::new(std::sync::Barrier::new(2));

        let owner_thread = {
            let (room, barrier, report) = (room.clone(), barrier.clone(), report.clone());
            std::thread::spawn(move || {
                barrier.wait();
                room.sync(owner_id, std::slice::from_ref(&report), &[], Duration::from_millis(100), Duration::from_millis(100))
            })
        };
        let bob_thread = {
            let (room, barrier, action) = (room.clone(), barrier.clone(), action.clone());
            std::thread::spawn(move || {
                barrier.wait();
                room.sync(bob_id, &[], std::slice::from_ref(&action), Duration::from_millis(100), Duration::from_millis(100))
            })
        };

        let owner_records = owner_thread.join().unwrap().unwrap();
        let bob_records = bob_thread.join().unwrap().unwrap();

        assert_eq!(owner_records.last().unwrap().id, bob_records.last().unwrap().id);

        let owner_reports: Vec<_> = owner_records.iter().flat_map(|r| r.get_reports()).collect();
        let owner_actions: Vec<_> = owner_records.iter().flat_map(|r| r.get_actions()).collect();
        assert!(owner_reports.is_empty(), "the owner never sees their own report");
        assert_eq!(owner_actions.len(), 1, "actions are echoed to everyone, including after the fact");

        let bob_reports: Vec<_> = bob_records.iter().flat_map(|r| r.get_reports()).collect();
        assert_eq!(bob_reports.len(), 1, "bob sees the owner's report");
        assert_eq!(bob_reports[0].id, report.id);
    }

    #[test]
    fn sync_rejects_second_call_while_first_still_in_flight() {
        // Owner's first call parks in the fan-out wait because bob never
        // submits; while it's parked (and the room lock released), a
        // second call by the same user must see its own phase already
        // past CREATED and bounce immediately.
        let (room, owner_id) = room(2);
        room.join("v1", RoomUser::new("bob").unwrap()).unwrap();
        let room = Arc::new(room);

        let first = {
            let room = room.clone();
            std::thread::spawn(move || {
                room.sync(owner_id, &[], &[], Duration::from_millis(10), Duration::from_millis(300))
            })
        };
        std::thread::sleep(Duration::from_millis(50));

        let err = room
            .sync(owner_id, &[], &[], Duration::from_millis(10), Duration::from_millis(10))
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::Kind::Forbidden);

        first.join().unwrap().unwrap();
    }

    #[test]
    fn solo_sync_closes_tail_and_rolls_a_fresh_one_behind_it() {
        let (room, owner_id) = room(2);
        room.join("v1", RoomUser::new("bob").unwrap()).unwrap();

        let closed_id = room
            .sync(owner_id, &[], &[], Duration::from_millis(5), Duration::from_millis(5))
            .unwrap()
            .last()
            .unwrap()
            .id;
        assert_eq!(room.get_user(owner_id).unwrap().last_sync_id(), closed_id);

        // Bob never touched the closed record, so nobody was left
        // mid-barrier on it; the tail already rolled over, which is why
        // the owner can sync again immediately without hitting the
        // "already synced this tick" guard.
        room.sync(owner_id, &[], &[], Duration::from_millis(5), Duration::from_millis(5))
            .unwrap();
    }

    #[test]
    fn clean_sync_records_keeps_tail_and_unsettled_records() {
        let (room, owner_id) = room(2);
        let bob = RoomUser::new("bob").unwrap();
        let bob_id = bob.id;
        room.join("v1", bob).unwrap();

        room.sync(owner_id, &[], &[], Duration::from_millis(5), Duration::from_millis(5))
            .unwrap();
        room.sync(bob_id, &[], &[], Duration::from_millis(5), Duration::from_millis(5))
            .unwrap();

        let removed = room.clean_sync_records();
        assert_eq!(removed, 1, "the first tick's record is fully settled and should be trimmed");
    }

    #[test]
    fn kick_expired_removes_only_silent_users() {
        let (room, owner_id) = room(3);
        let bob = RoomUser::new("bob").unwrap();
        let bob_id = bob.id;
        room.join("v1", bob).unwrap();
        std::thread::sleep(Duration::from_millis(10));
        room.sync(owner_id, &[], &[], Duration::from_millis(5), Duration::from_millis(5))
            .unwrap();

        let kicked = room.kick_expired(Duration::from_millis(5));
        assert_eq!(kicked, 1);
        assert!(room.has_user(owner_id));
        assert!(!room.has_user(bob_id));
    }
}
