//! A single tick of exchanged events for one room (§4.1).

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::AgError;
use crate::event::Event;
use crate::id::Id;
use crate::phase::Phase;

#[derive(Default)]
struct Inner {
    reports: BTreeMap<Id, Arc<Event>>,
    actions: BTreeMap<Id, Arc<Event>>,
    user_phase: BTreeMap<Id, Phase>,
}

pub struct SyncRecord {
    pub id: Id,
    inner: RwLock<Inner>,
}

impl SyncRecord {
    pub fn new() -> Self {
        Self {
            id: Id::new(),
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Merges `from`'s reports and actions into this record and advances
    /// `from` to `WAITING`. Fails if `from` has already submitted for this
    /// record, or if any event was not authored by `from`.
    pub fn add_events(
        &self,
        from: Id,
        new_reports: &[Arc<Event>],
        new_actions: &[Arc<Event>],
    ) -> Result<(), AgError> {
        let mut inner = self.inner.write();
        if *inner.user_phase.get(&from).unwrap_or(&Phase::Created) > Phase::Created {
            return Err(AgError::bad_request("Record already synced."));
        }
        for report in new_reports {
            if report.from != from {
                return Err(AgError::bad_request("Invalid report author."));
            }
        }
        for action in new_actions {
            if action.from != from {
                return Err(AgError::bad_request("Invalid action author."));
            }
        }
        for report in new_reports {
            inner.reports.insert(report.id, report.clone());
        }
        for action in new_actions {
            inner.actions.insert(action.id, action.clone());
        }
        inner.user_phase.insert(from, Phase::Waiting);
        Ok(())
    }

    pub fn get_phase(&self, user_id: Id) -> Phase {
        *self.inner.read().user_phase.get(&user_id).unwrap_or(&Phase::Created)
    }

    /// Monotonic: a no-op (returning `false`) if `new_phase` does not move
    /// the user forward.
    pub fn advance_phase(&self, user_id: Id, new_phase: Phase) -> bool {
        let mut inner = self.inner.write();
        let current = inner.user_phase.get(&user_id).copied().unwrap_or(Phase::Created);
        if new_phase <= current {
            return false;
        }
        inner.user_phase.insert(user_id, new_phase);
        true
    }

    pub fn get_max_phase(&self) -> Phase {
        self.inner
            .read()
            .user_phase
            .values()
            .copied()
            .max()
            .unwrap_or(Phase::Created)
    }

    pub fn get_reports(&self) -> Vec<Arc<Event>> {
        self.inner.read().reports.values().cloned().collect()
    }

    pub fn get_actions(&self) -> Vec<Arc<Event>> {
        self.inner.read().actions.values().cloned().collect()
    }
}
