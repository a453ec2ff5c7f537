//! MessagePack request/response bodies (§6: "request and response bodies
//! are MessagePack-encoded mappings"). Mirrors `axum::Json` but for
//! `rmp-serde` — the only encoding the transport speaks.

use axum::body::{to_bytes, Body};
use axum::extract::{FromRequest, Request};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use shoutwars_server::error::AgError;

use super::error::ApiError;

pub struct MsgPack<T>(pub T);

const MAX_BODY_BYTES: usize = 1024 * 1024;

impl<T, S> FromRequest<S> for MsgPack<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let _ = state;
        let body = req.into_body();
        let bytes = to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|e| AgError::bad_request(format!("Failed to read request body: {e}")))?;
        let value: T = rmp_serde::from_slice(&bytes).map_err(AgError::from)?;
        Ok(MsgPack(value))
    }
}

impl<T: Serialize> IntoResponse for MsgPack<T> {
    fn into_response(self) -> Response {
        match rmp_serde::to_vec(&self.0) {
            Ok(bytes) => {
                let mut response = Response::new(Body::from(bytes));
                response
                    .headers_mut()
                    .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/msgpack"));
                response
            }
            Err(err) => {
                let mut response = Response::new(Body::from(format!("encode error: {err}")));
                *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                response
            }
        }
    }
}
