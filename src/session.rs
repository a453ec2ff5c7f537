//! Opaque session tokens — the only cross-request identity (§4.5).

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::error::AgError;
use crate::id::Id;
use crate::logger::{Level, Logger};

#[derive(Debug, Clone, Copy)]
pub struct Session {
    pub id: Id,
    pub room_id: Id,
    pub user_id: Id,
}

impl Session {
    fn new(room_id: Id, user_id: Id) -> Self {
        Self {
            id: Id::new(),
            room_id,
            user_id,
        }
    }
}

pub struct SessionRegistry {
    log: Logger,
    sessions: RwLock<BTreeMap<Id, Session>>,
}

impl SessionRegistry {
    pub fn new(log: Logger) -> Self {
        Self {
            log,
            sessions: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn create(&self, room_id: Id, user_id: Id) -> Session {
        let session = Session::new(room_id, user_id);
        self.sessions.write().insert(session.id, session);
        (self.log)(
            Level::Info,
            &format!("Session created: {} (room_id={room_id}, user_id={user_id})", session.id),
        );
        session
    }

    pub fn get(&self, id: Id) -> Result<Session, AgError> {
        self.sessions
            .read()
            .get(&id)
            .copied()
            .ok_or_else(|| AgError::unauthorized("Session not found."))
    }

    pub fn exists(&self, id: Id) -> bool {
        self.sessions.read().contains_key(&id)
    }

    pub fn remove(&self, id: Id) -> bool {
        let removed = self.sessions.write().remove(&id).is_some();
        if removed {
            (self.log)(Level::Info, &format!("Session removed: {id}"));
        }
        removed
    }

    /// Removes every session for which `is_expired` returns true.
    pub fn clean(&self, is_expired: impl Fn(&Session) -> bool) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        let log = &self.log;
        sessions.retain(|id, session| {
            if is_expired(session) {
                (log)(Level::Info, &format!("Session expired: {id}"));
                false
            } else {
                true
            }
        });
        before - sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_get_round_trips() {
        let reg = SessionRegistry::new(crate::logger::noop());
        let room_id = Id::new();
        let user_id = Id::new();
        let session = reg.create(room_id, user_id);
        let fetched = reg.get(session.id).unwrap();
        assert_eq!(fetched.room_id, room_id);
        assert_eq!(fetched.user_id, user_id);
    }

    #[test]
    fn missing_session_is_unauthorized() {
        let reg = SessionRegistry::new(crate::logger::noop());
        let err = reg.get(Id::new()).unwrap_err();
        assert_eq!(err.kind(), crate::error::Kind::Unauthorized);
    }

    #[test]
    fn clean_removes_matching_sessions_only() {
        let reg = SessionRegistry::new(crate::logger::noop());
        let keep = reg.create(Id::new(), Id::new());
        let drop_me = reg.create(Id::new(), Id::new());
        let removed = reg.clean(|s| s.id == drop_me.id);
        assert_eq!(removed, 1);
        assert!(reg.exists(keep.id));
        assert!(!reg.exists(drop_me.id));
    }
}
