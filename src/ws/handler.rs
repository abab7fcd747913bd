//! Axum WebSocket upgrade handler.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use serde::Deserialize;

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::auth::extractor::bearer_token;

/// Query parameters accepted on the upgrade request.
#[derive(Debug, Default, Deserialize)]
pub struct WsAuthQuery {
    /// Access token, for clients that cannot set headers on upgrade.
    #[serde(default)]
    pub token: Option<String>,
}

/// `GET /ws`: Upgrade HTTP connection to WebSocket.
///
/// The credential is taken from `?token=` or, failing that, from an
/// `Authorization: Bearer` header. It is verified after the upgrade so a
/// rejected client still receives a close code explaining why.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<WsAuthQuery>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let credential = query
        .token
        .or_else(|| bearer_token(&headers).map(str::to_string));

    ws.on_upgrade(move |socket| run_connection(socket, state, credential))
}
