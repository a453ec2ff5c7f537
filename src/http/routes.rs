//! Route handlers (§6). Each is a thin adapter: decode the request,
//! call into the core, shape the response.

use std::sync::Arc;

use axum::extract::State;
use serde::{Deserialize, Serialize};

use shoutwars_server::error::AgError;
use shoutwars_server::event::Event;
use shoutwars_server::id::Id;
use shoutwars_server::user::RoomUser;

use super::codec::MsgPack;
use super::error::ApiError;
use super::AppState;

#[derive(Deserialize)]
pub struct NameDto {
    name: String,
}

#[derive(Deserialize)]
pub struct CreateRoomRequest {
    version: String,
    user: NameDto,
    size: usize,
}

#[derive(Serialize)]
pub struct CreateRoomResponse {
    session_id: Id,
    user_id: Id,
    id: Id,
}

pub async fn create_room(
    State(state): State<AppState>,
    MsgPack(req): MsgPack<CreateRoomRequest>,
) -> Result<MsgPack<CreateRoomResponse>, ApiError> {
    let owner = RoomUser::new(&req.user.name)?;
    let owner_id = owner.id;
    let room = state.rooms.create(&req.version, owner, req.size)?;
    let session = state.sessions.create(room.id, owner_id);
    Ok(MsgPack(CreateRoomResponse {
        session_id: session.id,
        user_id: owner_id,
        id: room.id,
    }))
}

#[derive(Deserialize)]
pub struct JoinRoomRequest {
    version: String,
    id: String,
    user: NameDto,
}

#[derive(Serialize)]
pub struct JoinRoomResponse {
    session_id: Id,
    user_id: Id,
    room_info: serde_json::Value,
}

pub async fn join_room(
    State(state): State<AppState>,
    MsgPack(req): MsgPack<JoinRoomRequest>,
) -> Result<MsgPack<JoinRoomResponse>, ApiError> {
    let room_id = Id::parse(&req.id).map_err(AgError::from)?;
    let room = state.rooms.get(room_id)?;
    let user = RoomUser::new(&req.user.name)?;
    let user_id = user.id;
    room.join(&req.version, user)?;
    let session = state.sessions.create(room.id, user_id);
    Ok(MsgPack(JoinRoomResponse {
        session_id: session.id,
        user_id,
        room_info: room.get_info(),
    }))
}

#[derive(Deserialize)]
pub struct StartGameRequest {
    session_id: String,
}

pub async fn start_game(
    State(state): State<AppState>,
    MsgPack(req): MsgPack<StartGameRequest>,
) -> Result<MsgPack<serde_json::Value>, ApiError> {
    let session = state.sessions.get(Id::parse(&req.session_id).map_err(AgError::from)?)?;
    let room = state.rooms.get(session.room_id)?;
    if session.user_id != room.get_owner()?.id {
        return Err(AgError::forbidden("Only owner can start the game.").into());
    }
    room.start_game()?;
    Ok(MsgPack(serde_json::json!({})))
}

#[derive(Deserialize)]
pub struct EventDto {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    event: serde_json::Value,
}

fn to_event(dto: &EventDto, from: Id) -> Result<Arc<Event>, AgError> {
    let id = Id::parse(&dto.id)?;
    Ok(Arc::new(Event::new(id, from, dto.kind.clone(), dto.event.clone())))
}

#[derive(Deserialize)]
pub struct SyncRequest {
    session_id: String,
    #[serde(default)]
    reports: Vec<EventDto>,
    #[serde(default)]
    actions: Vec<EventDto>,
    room_info: Option<serde_json::Value>,
}

#[derive(Serialize)]
pub struct EventOut {
    id: Id,
    from: Id,
    #[serde(rename = "type")]
    kind: String,
    event: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    sync_id: Option<Id>,
}

#[derive(Serialize)]
pub struct SyncResponse {
    id: Id,
    reports: Vec<EventOut>,
    actions: Vec<EventOut>,
    room_users: Vec<RoomUser>,
}

pub async fn sync(
    State(state): State<AppState>,
    MsgPack(req): MsgPack<SyncRequest>,
) -> Result<MsgPack<SyncResponse>, ApiError> {
    let session = state.sessions.get(Id::parse(&req.session_id).map_err(AgError::from)?)?;
    let room = state.rooms.get(session.room_id)?;
    let caller = session.user_id;

    if room.get_user(caller)?.last_time().elapsed() < state.config.sync_rate_limit {
        return Err(AgError::too_many_requests(format!(
            "Wait {}ms before sending another sync request.",
            state.config.sync_rate_limit.as_millis()
        ))
        .into());
    }

    let reports = req
        .reports
        .iter()
        .map(|e| to_event(e, caller))
        .collect::<Result<Vec<_>, _>>()?;
    let actions = req
        .actions
        .iter()
        .map(|e| to_event(e, caller))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(room_info) = req.room_info {
        if caller == room.get_owner()?.id {
            room.update_info(room_info)?;
        }
    }

    let records = room.sync(
        caller,
        &reports,
        &actions,
        state.config.wait_timeout,
        state.config.sync_timeout,
    )?;
    let top_id = records
        .last()
        .expect("a sync call always closes at least the tail record")
        .id;

    let mut reports_out = Vec::new();
    let mut actions_out = Vec::new();
    for record in &records {
        let sync_id = if record.id == top_id { None } else { Some(record.id) };
        for report in record.get_reports() {
            if report.from == caller {
                continue;
            }
            reports_out.push(EventOut {
                id: report.id,
                from: report.from,
                kind: report.kind.clone(),
                event: report.data.clone(),
                sync_id,
            });
        }
        for action in record.get_actions() {
            actions_out.push(EventOut {
                id: action.id,
                from: action.from,
                kind: action.kind.clone(),
                event: action.data.clone(),
                sync_id,
            });
        }
    }

    Ok(MsgPack(SyncResponse {
        id: top_id,
        reports: reports_out,
        actions: actions_out,
        room_users: room.get_users(),
    }))
}

#[derive(Serialize)]
pub struct StatusResponse {
    room_count: usize,
    room_limit: usize,
}

pub async fn status(State(state): State<AppState>) -> MsgPack<StatusResponse> {
    MsgPack(StatusResponse {
        room_count: state.rooms.count(),
        room_limit: state.rooms.get_limit(),
    })
}
