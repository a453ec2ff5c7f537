//! Environment-variable configuration (§6 "Environment configuration").
//!
//! Lives in the `shoutwars-server` binary crate, not `shoutwars_server`
//! the library (§1: environment-variable configuration is an external
//! collaborator) — the core never reads process state; only the binary
//! constructs a [`Config`] and hands its fields to the core's types.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {name} has an invalid value {value:?}: {source}")]
    InvalidValue {
        name: &'static str,
        value: String,
        source: std::num::ParseIntError,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub password: String,
    pub room_limit: usize,
    pub lobby_lifetime: Duration,
    pub game_lifetime: Duration,
    /// How long a user may go silent before the sweeper kicks them.
    pub user_timeout: Duration,
    /// How often the background sweeper runs.
    pub cleaner_interval: Duration,
    /// How long a sync call waits for stragglers from the previous tick.
    pub wait_timeout: Duration,
    /// How long a sync call waits for this tick's fan-out.
    pub sync_timeout: Duration,
    /// Minimum spacing between a user's successive sync calls.
    pub sync_rate_limit: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 7468,
            password: String::new(),
            room_limit: 100,
            lobby_lifetime: Duration::from_secs(60 * 10),
            game_lifetime: Duration::from_secs(60 * 20),
            user_timeout: Duration::from_secs(10),
            cleaner_interval: Duration::from_secs(3),
            wait_timeout: Duration::from_millis(200),
            sync_timeout: Duration::from_millis(50),
            sync_rate_limit: Duration::from_millis(100),
        }
    }
}

impl Config {
    /// Reads `PORT`, `PASSWORD`, `ROOM_LIMIT`, `LOBBY_LIFETIME`, and
    /// `GAME_LIFETIME` (minutes) from the process environment, falling
    /// back to the documented defaults for any that are unset. The
    /// remaining fields (barrier deadlines, sweeper cadence) are not
    /// externally configurable per §6 and keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            port: parse_env_or("PORT", defaults.port)?,
            password: std::env::var("PASSWORD").unwrap_or_default(),
            room_limit: parse_env_or("ROOM_LIMIT", defaults.room_limit)?,
            lobby_lifetime: Duration::from_secs(60 * parse_env_or("LOBBY_LIFETIME", 10u64)?),
            game_lifetime: Duration::from_secs(60 * parse_env_or("GAME_LIFETIME", 20u64)?),
            ..defaults
        })
    }

    pub fn auth_required(&self) -> bool {
        !self.password.is_empty()
    }
}

fn parse_env_or<T: std::str::FromStr<Err = std::num::ParseIntError>>(
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Err(_) => Ok(default),
        Ok(value) => value
            .parse()
            .map_err(|source| ConfigError::InvalidValue { name, value, source }),
    }
}
