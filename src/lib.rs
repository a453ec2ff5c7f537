//! ShoutWars room-sync engine: room lifecycle, the barrier-synchronized
//! sync protocol, session management, and background expiry.
//!
//! This crate is the authoritative *core* described in the system's
//! design: it knows nothing about HTTP, MessagePack, or environment
//! variables. It exposes a synchronous API (serialized by per-room and
//! per-registry locks) that a transport layer wraps; logging is injected
//! via [`logger::Logger`] rather than written to stdout/stderr directly.

pub mod condvar;
pub mod error;
pub mod event;
pub mod id;
pub mod logger;
pub mod phase;
pub mod room;
pub mod room_registry;
pub mod session;
pub mod sweeper;
pub mod sync_record;
pub mod user;

pub use error::AgError;
pub use id::Id;
