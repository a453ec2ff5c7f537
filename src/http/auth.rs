//! Bearer-secret authentication (§6). A mismatched or missing secret
//! produces the exact same 404 as an unknown route or API version —
//! deliberately indistinguishable so a probe can't tell "wrong secret"
//! from "no such route."

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::codec::MsgPack;
use super::AppState;

pub const UNKNOWN_ROUTE_MESSAGE: &str = "Invalid API version. Use /v1.";

pub fn not_found_response() -> Response {
    (StatusCode::NOT_FOUND, MsgPack(serde_json::json!({ "error": UNKNOWN_ROUTE_MESSAGE }))).into_response()
}

pub async fn require_bearer_secret(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if !state.config.auth_required() {
        return next.run(request).await;
    }
    let expected = format!("Bearer {}", state.config.password);
    let presented = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    if presented != Some(expected.as_str()) {
        return not_found_response();
    }
    next.run(request).await
}
