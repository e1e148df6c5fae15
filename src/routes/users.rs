use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::models::{NewParticipant, Participant};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub search: Option<String>,
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> AppResult<Json<Vec<Participant>>> {
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let users = state.directory.list(search).await?;
    Ok(Json(users))
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<NewParticipant>,
) -> AppResult<(StatusCode, Json<Participant>)> {
    payload.validate()?;
    let participant = state.directory.create(payload).await?;
    tracing::info!(user_id = %participant.id, username = %participant.handle, "participant created");
    Ok((StatusCode::CREATED, Json(participant)))
}
