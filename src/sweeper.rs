//! The background lifecycle cleaner (§5 "Background sweeper", §9).
//!
//! A single long-lived task: evict expired/unavailable rooms, kick silent
//! users, trim fully-consumed sync records, then purge sessions whose
//! room or user no longer exists. Faults are caught and logged; the loop
//! never exits until told to shut down.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::logger::{Level, Logger};
use crate::room_registry::RoomRegistry;
use crate::session::SessionRegistry;

pub struct Sweeper {
    shutdown: Arc<AtomicBool>,
    handle: tokio::task::JoinHandle<()>,
}

impl Sweeper {
    pub fn spawn(
        rooms: Arc<RoomRegistry>,
        sessions: Arc<SessionRegistry>,
        user_timeout: Duration,
        cleaner_interval: Duration,
        log: Logger,
    ) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let task_shutdown = shutdown.clone();
        let handle = tokio::spawn(async move {
            while !task_shutdown.load(Ordering::SeqCst) {
                run_once(&rooms, &sessions, user_timeout, &log);
                tokio::time::sleep(cleaner_interval).await;
            }
        });
        Self { shutdown, handle }
    }

    pub async fn shutdown(self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let _ = self.handle.await;
    }
}

fn run_once(rooms: &RoomRegistry, sessions: &SessionRegistry, user_timeout: Duration, log: &Logger) {
    if let Err(panic) = std::panic::catch_unwind(AssertUnwindSafe(|| rooms.clean(user_timeout))) {
        (log)(Level::Error, &format!("Sweeper: room cleanup failed: {}", panic_message(&panic)));
    }
    if let Err(panic) = std::panic::catch_unwind(AssertUnwindSafe(|| {
        sessions.clean(|session| {
            !rooms.exists(session.room_id)
                || rooms
                    .get(session.room_id)
                    .map(|room| !room.has_user(session.user_id))
                    .unwrap_or(true)
        })
    })) {
        (log)(Level::Error, &format!("Sweeper: session cleanup failed: {}", panic_message(&panic)));
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::RoomUser;

    #[tokio::test]
    async fn sweeper_evicts_expired_sessions() {
        let rooms = Arc::new(RoomRegistry::new(
            10,
            Duration::from_millis(20),
            Duration::from_secs(60),
            crate::logger::noop(),
        ));
        let sessions = Arc::new(SessionRegistry::new(crate::logger::noop()));
        let owner = RoomUser::new("owner").unwrap();
        let owner_id = owner.id;
        let room = rooms.create("v1", owner, 2).unwrap();
        let session = sessions.create(room.id, owner_id);

        tokio::time::sleep(Duration::from_millis(40)).await;
        run_once(&rooms, &sessions, Duration::from_secs(60), &crate::logger::noop());

        assert_eq!(rooms.count(), 0, "lobby room past expiry should be swept");
        assert!(!sessions.exists(session.id), "orphaned session should be swept");
    }
}
