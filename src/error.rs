//! Tagged error kinds (§7). The source this crate is modeled on used a
//! class hierarchy per kind; here a single enum carries the kind and a
//! human-readable message, with one mapping function to an HTTP status.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    TooManyRequests(String),
    #[error("{0}")]
    Internal(String),
    #[error("{0}")]
    ServiceUnavailable(String),
}

/// The seven kinds from §7, each mapped to exactly one HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    TooManyRequests,
    Internal,
    ServiceUnavailable,
}

impl AgError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
    pub fn too_many_requests(msg: impl Into<String>) -> Self {
        Self::TooManyRequests(msg.into())
    }
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::ServiceUnavailable(msg.into())
    }

    pub fn kind(&self) -> Kind {
        match self {
            Self::BadRequest(_) => Kind::BadRequest,
            Self::Unauthorized(_) => Kind::Unauthorized,
            Self::Forbidden(_) => Kind::Forbidden,
            Self::NotFound(_) => Kind::NotFound,
            Self::TooManyRequests(_) => Kind::TooManyRequests,
            Self::Internal(_) => Kind::Internal,
            Self::ServiceUnavailable(_) => Kind::ServiceUnavailable,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(m)
            | Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::NotFound(m)
            | Self::TooManyRequests(m)
            | Self::Internal(m)
            | Self::ServiceUnavailable(m) => m,
        }
    }
}

impl From<serde_json::Error> for AgError {
    fn from(value: serde_json::Error) -> Self {
        Self::bad_request(format!("Malformed request body: {value}"))
    }
}

impl From<uuid::Error> for AgError {
    fn from(value: uuid::Error) -> Self {
        Self::bad_request(format!("Malformed id: {value}"))
    }
}

impl From<rmp_serde::encode::Error> for AgError {
    fn from(value: rmp_serde::encode::Error) -> Self {
        Self::internal(format!("Failed to encode response: {value}"))
    }
}

impl From<rmp_serde::decode::Error> for AgError {
    fn from(value: rmp_serde::decode::Error) -> Self {
        Self::bad_request(format!("Malformed MessagePack body: {value}"))
    }
}
