//! One thin handler per session-shaped Command API entry. Each handler
//! does argument parsing only; all behavior lives in `CommandService`.

use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use voltrek_core::Direction;

use crate::command::{HistoryOrder, SessionInfo};
use crate::session::{SortBy, SortOrder};

use super::error::ServerError;
use super::state::AppState;

#[derive(Deserialize, Default)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub config_name: Option<String>,
}

/// Body defaults to `{}` so a client that only wants the compiled-in
/// default config can post an empty JSON object.
pub async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionRequest>,
) -> Result<Json<SessionInfo>, ServerError> {
    let info = state.commands.create_session(body.config_name.as_deref()).await?;
    Ok(Json(info))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionInfo>, ServerError> {
    Ok(Json(state.commands.get_session(&id).await?))
}

#[derive(Deserialize)]
pub struct ListSessionsQuery {
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub limit: Option<usize>,
}

pub async fn list_sessions(
    State(state): State<AppState>,
    Query(q): Query<ListSessionsQuery>,
) -> Result<Json<Vec<SessionInfo>>, ServerError> {
    let sort_by = match q.sort_by.as_deref() {
        Some("accessed") | None => SortBy::Accessed,
        Some("created") => SortBy::Created,
        Some(other) => return Err(ServerError::InvalidArgument(format!("unknown sort_by: {other}"))),
    };
    let order = match q.order.as_deref() {
        Some("asc") => SortOrder::Asc,
        Some("desc") | None => SortOrder::Desc,
        Some(other) => return Err(ServerError::InvalidArgument(format!("unknown order: {other}"))),
    };
    Ok(Json(state.commands.list_sessions(sort_by, order, q.limit).await))
}

pub async fn delete_session(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, ServerError> {
    Ok(Json(state.commands.delete_session(&id).await?))
}

pub async fn get_state(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    Ok(Json(state.commands.get_state(&id).await?))
}

#[derive(Deserialize)]
pub struct MoveRequest {
    pub direction: String,
    pub reset: Option<bool>,
}

pub async fn mv(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<MoveRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let dir = Direction::from_str(&body.direction)?;
    let result = state.commands.mv(&id, dir, body.reset.unwrap_or(false)).await?;
    Ok(Json(result))
}

#[derive(Deserialize)]
pub struct BulkMoveRequest {
    pub moves: Vec<String>,
    pub reset: Option<bool>,
}

pub async fn bulk_move(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<BulkMoveRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let dirs = body
        .moves
        .iter()
        .map(|m| Direction::from_str(m))
        .collect::<Result<Vec<_>, _>>()?;
    let result = state.commands.bulk_move(&id, dirs, body.reset.unwrap_or(false)).await?;
    Ok(Json(result))
}

pub async fn reset(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, ServerError> {
    Ok(Json(state.commands.reset(&id).await?))
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub order: Option<String>,
}

pub async fn history(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<HistoryQuery>,
) -> Result<impl IntoResponse, ServerError> {
    let order = match q.order.as_deref() {
        Some("asc") => Some(HistoryOrder::Asc),
        Some("desc") | None => Some(HistoryOrder::Desc),
        Some(other) => return Err(ServerError::InvalidArgument(format!("unknown order: {other}"))),
    };
    let page = state.commands.history(&id, q.page, q.limit, order).await?;
    Ok(Json(page))
}
