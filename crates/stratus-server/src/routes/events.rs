//! `/events` endpoints: recent snapshot and the WebSocket push channel.
//!
//! Push channel framing: every frame is one JSON object with
//! `{type, timestamp, id?, payload?}`. `connection` opens the handshake,
//! `heartbeat` keeps the connection observable, and `event` wraps a domain
//! event whose own `type` sits in the payload.

use crate::error::ApiResult;
use crate::middleware::require_role;
use crate::state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use stratus_auth::{AuthContext, Role};
use stratus_events::{Event, EventKind};
use tracing::debug;

const DEFAULT_RECENT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

pub async fn recent(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<RecentQuery>,
) -> ApiResult<Json<Vec<Event>>> {
    require_role(&state, &ctx, Role::Viewer)?;
    let limit = query.limit.unwrap_or(DEFAULT_RECENT).min(1000);
    Ok(Json(state.bus.recent(limit)))
}

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    /// Events from the ring to replay on connect.
    #[serde(default)]
    pub replay: usize,
}

/// Upgrade to the durable push channel.
pub async fn stream(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<StreamQuery>,
    ws: WebSocketUpgrade,
) -> ApiResult<Response> {
    require_role(&state, &ctx, Role::Viewer)?;
    let replay = query.replay;
    Ok(ws.on_upgrade(move |socket| push_loop(socket, state, ctx, replay)))
}

async fn push_loop(mut socket: WebSocket, state: AppState, ctx: AuthContext, replay: usize) {
    debug!("push channel opened for {}", ctx.principal_id);

    let connection_frame = json!({
        "type": "connection",
        "timestamp": Utc::now(),
        "payload": {
            "principal_id": ctx.principal_id,
            "heartbeat_seconds": state.bus.config().heartbeat_seconds,
        },
    });
    if socket
        .send(Message::Text(connection_frame.to_string()))
        .await
        .is_err()
    {
        return;
    }

    let mut subscription = state.bus.subscribe(replay);

    loop {
        tokio::select! {
            event = subscription.next() => {
                let frame = frame_for(&event);
                if socket.send(Message::Text(frame.to_string())).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    // Clients only ever send pings/pongs; ignore the rest.
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    debug!(
        "push channel closed for {} ({} events dropped)",
        ctx.principal_id,
        subscription.dropped()
    );
}

fn frame_for(event: &Event) -> serde_json::Value {
    match event.kind {
        EventKind::Heartbeat => json!({
            "type": "heartbeat",
            "timestamp": event.timestamp,
        }),
        _ => json!({
            "type": "event",
            "timestamp": event.timestamp,
            "id": event.id.to_string(),
            "payload": event,
        }),
    }
}
