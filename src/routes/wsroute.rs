use axum::{
    extract::{ws::WebSocketUpgrade, Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::middleware::resolve_pair;
use crate::state::AppState;
use crate::websocket::RelaySession;

/// Upgrade endpoint addressed by the counterpart's handle.
///
/// Authentication and resolution happen before the upgrade; a failure is
/// answered with a bare status and the connection is never upgraded.
pub async fn chat_handler(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let pair = match resolve_pair(&state, &headers, &handle).await {
        Ok(pair) => pair,
        Err(e) => {
            warn!(counterpart = %handle, error = %e, "relay handshake rejected");
            return e.status_code().into_response();
        }
    };

    let session = RelaySession::new(
        pair.caller,
        pair.counterpart,
        state.registry.clone(),
        state.messages.clone(),
        state.idle_timeout(),
    );

    ws.on_failed_upgrade(|e| warn!(error = %e, "websocket upgrade failed"))
        .on_upgrade(move |socket| session.run(socket))
}
