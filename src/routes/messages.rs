use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};

use crate::error::AppResult;
use crate::middleware::resolve_pair;
use crate::models::Message;
use crate::state::AppState;

/// Recent history between the caller and `handle`, oldest first.
pub async fn get_messages(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    headers: HeaderMap,
) -> AppResult<Json<Vec<Message>>> {
    let pair = resolve_pair(&state, &headers, &handle).await?;

    let messages = state
        .messages
        .history(
            pair.caller.participant_id(),
            pair.counterpart.participant_id(),
            state.config.relay.history_limit,
        )
        .await?;

    Ok(Json(messages))
}
