//! Time-ordered 128-bit identifiers.
//!
//! Every entity (room, user, event, sync record, session) gets one of these.
//! Backed by UUIDv7 so that ordered-map iteration over ids reflects creation
//! order without a separate sequence counter.

use std::fmt;

/// Always rendered as its canonical 36-char hyphenated string on the wire,
/// regardless of whether the encoding format is human-readable (JSON) or
/// binary (MessagePack) — `uuid`'s own `Serialize` impl switches
/// representation based on that flag, which would make the wire format
/// depend on the transport's encoding choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(uuid::Uuid);

impl serde::Serialize for Id {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for Id {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        uuid::Uuid::parse_str(&s)
            .map(Id)
            .map_err(serde::de::Error::custom)
    }
}

impl Id {
    /// A fresh, process-unique, time-ordered id.
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// The nil id, used as "no cursor yet".
    pub const fn nil() -> Self {
        Self(uuid::Uuid::nil())
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(uuid::Uuid::parse_str(s)?))
    }
}

impl Default for Id {
    fn default() -> Self {
        Self::nil()
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<uuid::Uuid> for Id {
    fn from(value: uuid::Uuid) -> Self {
        Self(value)
    }
}

impl From<Id> for uuid::Uuid {
    fn from(value: Id) -> Self {
        value.0
    }
}
