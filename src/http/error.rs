//! Maps [`AgError`] kinds to HTTP statuses (§7). Kept out of the core
//! crate: the core never depends on `axum`, so this is the one place
//! `shoutwars_server::error::Kind` is translated into a status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use shoutwars_server::error::{AgError, Kind};

pub struct ApiError(pub AgError);

impl From<AgError> for ApiError {
    fn from(value: AgError) -> Self {
        Self(value)
    }
}

fn status_code(kind: Kind) -> StatusCode {
    match kind {
        Kind::BadRequest => StatusCode::BAD_REQUEST,
        Kind::Unauthorized => StatusCode::UNAUTHORIZED,
        Kind::Forbidden => StatusCode::FORBIDDEN,
        Kind::NotFound => StatusCode::NOT_FOUND,
        Kind::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
        Kind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        Kind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_code(self.0.kind());
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "internal error");
        }
        let body = serde_json::json!({ "error": self.0.message() });
        (status, super::codec::MsgPack(body)).into_response()
    }
}
