//! WebSocket connection handler.
//!
//! Grounded on the teacher's `ws_handler`/`handle_socket` pair,
//! generalized from one process-global broadcast channel to one
//! per-session topic (spec §6.4: a read-only subscription protocol).

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};

use crate::hub::ForwardOutcome;
use crate::http::{AppState, ServerError};
use crate::session::SessionId;
use crate::snapshot::StateEnvelope;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServerError> {
    // Validate the session exists before upgrading; a 404 is much more
    // useful to a client than a socket that opens and immediately closes.
    state.commands.get_state(&id).await?;
    let session_id = SessionId::parse(&id);
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, session_id, state)))
}

async fn handle_socket(socket: WebSocket, session_id: SessionId, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let mut subscription = state.hub.subscribe(&session_id).await;
    let idle_timeout = state.ws_idle_timeout;

    if let Ok(current) = state.commands.get_state(session_id.as_str()).await {
        let envelope = StateEnvelope {
            session_id: session_id.to_string(),
            game_state: current,
        };
        let Ok(json) = serde_json::to_string(&envelope) else {
            return;
        };
        if sender.send(Message::Text(json.into())).await.is_err() {
            return;
        }
    }

    tracing::info!("session {session_id} websocket client connected");

    let send_session_id = session_id.clone();
    let mut send_task = tokio::spawn(async move {
        loop {
            match subscription.next().await {
                ForwardOutcome::Message(envelope) => {
                    let Ok(json) = serde_json::to_string(envelope.as_ref()) else {
                        continue;
                    };
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                // A lagged sink just missed some intermediate states; the
                // next message it gets is still the latest one.
                ForwardOutcome::Lagged(skipped) => {
                    tracing::warn!("session {send_session_id} ws sink lagged, skipped {skipped} message(s)");
                }
                ForwardOutcome::Closed => break,
            }
        }
        subscription
    });

    // The subscription protocol is read-only (spec §6.4): client frames
    // are drained so the socket's read half doesn't buffer, but ignored.
    // A read half that goes quiet for longer than the configured idle
    // timeout is treated as a dead connection and closed.
    let recv_session_id = session_id.clone();
    let mut recv_task = tokio::spawn(async move {
        loop {
            match tokio::time::timeout(idle_timeout, receiver.next()).await {
                Ok(Some(_)) => continue,
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!("session {recv_session_id} websocket read idle for {idle_timeout:?}, closing");
                    break;
                }
            }
        }
    });

    // The graceful path (the broadcast sink closing or evicting itself)
    // hands its `Subscription` back so it can be unregistered through
    // the hub's named `unsubscribe` operation; an aborted task drops its
    // `Subscription` in place, which unregisters it just as well.
    tokio::select! {
        res = &mut send_task => {
            recv_task.abort();
            if let Ok(subscription) = res {
                state.hub.unsubscribe(&session_id, subscription).await;
            }
        }
        _ = (&mut recv_task) => send_task.abort(),
    }

    tracing::info!("session {session_id} websocket client disconnected");
}
