//! The HTTP transport (§6): route handlers, MessagePack encoding, bearer
//! auth, and request logging. Everything here is a thin adapter over the
//! `shoutwars_server` core — no room/session/barrier logic lives here.

mod auth;
mod codec;
mod error;
mod routes;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use shoutwars_server::room_registry::RoomRegistry;
use shoutwars_server::session::SessionRegistry;

#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RoomRegistry>,
    pub sessions: Arc<SessionRegistry>,
    pub config: Arc<Config>,
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/room/create", post(routes::create_room))
        .route("/room/join", post(routes::join_room))
        .route("/room/start", post(routes::start_game))
        .route("/room/sync", post(routes::sync))
        .route("/status", get(routes::status))
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), auth::require_bearer_secret));

    Router::new()
        .nest("/v1", api)
        .fallback(|| async { auth::not_found_response() })
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
