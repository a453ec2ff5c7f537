//! The injected logging sink.
//!
//! The core never talks to `tracing` or stdout directly — every component
//! that logs (rooms, registries, the sweeper) is handed a [`Logger`] at
//! construction time. The binary wires a real `tracing`-backed sink in;
//! tests wire a `Vec`-collecting one.

use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

/// A cheap, `Clone`-able logging sink. Implementations must not block for
/// long or panic; the sweeper and the sync barrier call this while holding
/// locks.
pub type Logger = Arc<dyn Fn(Level, &str) + Send + Sync>;

/// A logger that discards everything. Used as a default and in tests that
/// don't care about log output.
pub fn noop() -> Logger {
    Arc::new(|_, _| {})
}

#[cfg(test)]
pub fn collecting() -> (Logger, std::sync::Arc<parking_lot::Mutex<Vec<(Level, String)>>>) {
    let buf = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = buf.clone();
    let logger: Logger = Arc::new(move |level, msg| sink.lock().push((level, msg.to_owned())));
    (logger, buf)
}
