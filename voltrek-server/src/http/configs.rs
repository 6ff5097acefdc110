//! Config Registry handlers: list, fetch, and save named `GameConfig`s.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use voltrek_core::{ConfigInfo, GameConfig};

use super::error::ServerError;
use super::state::AppState;

#[derive(Serialize)]
pub struct SaveConfigResponse {
    pub message: String,
    pub config_id: String,
}

pub async fn list_configs(State(state): State<AppState>) -> Json<Vec<ConfigInfo>> {
    Json(state.registry.list())
}

pub async fn get_config(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<GameConfig>, ServerError> {
    let config = state.registry.load(&name)?;
    Ok(Json((*config).clone()))
}

pub async fn save_config(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(mut body): Json<GameConfig>,
) -> Result<impl IntoResponse, ServerError> {
    body.name = name.clone();
    state.registry.save(&name, body)?;
    Ok(Json(SaveConfigResponse {
        message: format!("config {name} saved"),
        config_id: name,
    }))
}
