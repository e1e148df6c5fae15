use axum::http::{header::AUTHORIZATION, HeaderMap};

use crate::error::{AppError, AppResult};
use crate::models::Participant;
use crate::state::AppState;

/// Caller and counterpart of a conversation, both resolved.
#[derive(Debug, Clone)]
pub struct ResolvedPair {
    pub caller: Participant,
    pub counterpart: Participant,
}

pub fn bearer_token(headers: &HeaderMap) -> AppResult<&str> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .unwrap_or_default();

    if token.is_empty() {
        return Err(AppError::Unauthenticated);
    }
    Ok(token)
}

pub async fn resolve_caller(state: &AppState, headers: &HeaderMap) -> AppResult<Participant> {
    let token = bearer_token(headers)?;
    let identity = state.identity.resolve_identity(token).await?;
    state.directory.get_by_email(&identity.email).await
}

pub async fn resolve_pair(
    state: &AppState,
    headers: &HeaderMap,
    handle: &str,
) -> AppResult<ResolvedPair> {
    let caller = resolve_caller(state, headers).await?;

    let handle = handle.trim();
    if handle.is_empty() {
        return Err(AppError::NotFound("counterpart handle missing".into()));
    }
    let counterpart = state.directory.get_by_handle(handle).await?;

    Ok(ResolvedPair {
        caller,
        counterpart,
    })
}
