//! A condition variable bound to a [`parking_lot::RwLock`] write guard
//! (§9 "Condition variable with a per-room lock"). `parking_lot::Condvar`
//! only pairs with `parking_lot::Mutex`, so this wraps one to give the
//! room's sync barrier a bounded, predicate-checked wait that releases
//! the room's write lock for the duration of the wait.
#[derive(Default)]
pub struct RoomCondvar {
    condvar: parking_lot::Condvar,
    dummy: parking_lot::Mutex<()>,
}

impl RoomCondvar {
    pub fn new() -> Self {
        Default::default()
    }

    /// Releases `guard` and waits *while* `condition` returns `true`,
    /// stopping as soon as it returns `false` or `timeout` elapses,
    /// whichever comes first, then reacquires `guard`. Same polarity as
    /// `parking_lot::Condvar::wait_while_for` — callers pass "keep
    /// waiting" predicates, not "done waiting" ones.
    pub fn wait_while_for<T>(
        &self,
        guard: &mut parking_lot::RwLockWriteGuard<'_, T>,
        timeout: std::time::Duration,
        mut condition: impl FnMut() -> bool,
    ) {
        let dummy_guard = self.dummy.lock();
        parking_lot::RwLockWriteGuard::unlocked(guard, || {
            let mut dummy_guard = dummy_guard;
            self.condvar.wait_while_for(&mut dummy_guard, |_| condition(), timeout);
        });
    }

    pub fn notify_all(&self) -> usize {
        self.condvar.notify_all()
    }
}
