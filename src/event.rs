//! Immutable events exchanged through a sync record (§3).
//!
//! `Event` itself has no wire representation — the HTTP layer is
//! responsible for shaping the `{id, from, type, event, sync_id?}`
//! response payloads described in §6; the core only ever hands out
//! `Arc<Event>`s.

use crate::id::Id;

#[derive(Debug, Clone)]
pub struct Event {
    pub id: Id,
    pub from: Id,
    pub kind: String,
    pub data: serde_json::Value,
}

impl Event {
    pub fn new(id: Id, from: Id, kind: String, data: serde_json::Value) -> Self {
        Self { id, from, kind, data }
    }
}
