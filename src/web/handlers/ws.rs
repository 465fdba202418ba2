//! WebSocket dispatcher: the session-streaming endpoint.
//!
//! One task per connection. Inbound text units are processed strictly in
//! arrival order, and predictions go back out on the same socket in trigger
//! order. A failing unit is logged and skipped; it never closes the
//! connection and never produces an outbound error message.

use crate::state::AppState;
use crate::types::{FeatureVector, InboundUnit, PipelineError, ServerMessage, DEFAULT_USER_NAME};
use crate::vision;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::time::{interval, timeout};
use uuid::Uuid;

/// WebSocket keepalive interval.
const PING_INTERVAL: Duration = Duration::from_secs(30);

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Connection loop. The only connection-local state is the bound session
/// name; everything else lives in the session store and survives the
/// socket.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = Uuid::now_v7();
    tracing::info!("client connected: conn={conn_id}");

    let (mut sender, mut receiver) = socket.split();
    let mut bound_name: Option<String> = None;
    let mut ping = interval(PING_INTERVAL);
    ping.tick().await; // skip the immediate first tick

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let Some(response) = process_unit(&state, &mut bound_name, text.as_str()).await else {
                            continue;
                        };
                        let json = match serde_json::to_string(&response) {
                            Ok(json) => json,
                            Err(e) => {
                                tracing::error!("conn={conn_id}: response serialization failed: {e}");
                                continue;
                            }
                        };
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            tracing::debug!("conn={conn_id}: send failed, client gone");
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    // Binary frames, pings and pongs are not protocol units.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!("conn={conn_id}: socket error: {e}");
                        break;
                    }
                }
            }
            _ = ping.tick() => {
                if sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }
        }
    }

    // The name binding dies with the socket; the session stays in the
    // store for the next connection that declares the same name.
    tracing::info!(
        "client disconnected: conn={conn_id} user={}",
        bound_name.as_deref().unwrap_or(DEFAULT_USER_NAME)
    );
}

/// Route one inbound unit. Returns the outbound message it produced, if
/// any; failures are absorbed here (logged and counted, nothing sent).
async fn process_unit(
    state: &AppState,
    bound_name: &mut Option<String>,
    text: &str,
) -> Option<ServerMessage> {
    let (payload, user_name) = match InboundUnit::decode(text) {
        InboundUnit::Identity { user_name } => {
            let name = user_name.unwrap_or_else(|| DEFAULT_USER_NAME.to_string());
            state.sessions.write().await.get_or_create(&name);
            *bound_name = Some(name);
            return None;
        }
        InboundUnit::Frame { image, user_name } => {
            let name = user_name
                .or_else(|| bound_name.clone())
                .unwrap_or_else(|| DEFAULT_USER_NAME.to_string());
            (image, name)
        }
        InboundUnit::Raw { payload } => {
            let name = bound_name
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_NAME.to_string());
            (payload, name)
        }
    };
    // A frame that names a session also (re)binds the connection.
    *bound_name = Some(user_name.clone());

    match ingest_frame(state, &user_name, &payload).await {
        Ok(Some(prediction)) => Some(ServerMessage::Prediction {
            user_name,
            prediction,
        }),
        Ok(None) => None,
        Err(e) => {
            if e.is_classifier_failure() {
                state.metrics.record_classifier_failure();
            } else {
                state.metrics.record_decode_failure();
            }
            tracing::warn!("frame dropped for {user_name}: {e}");
            None
        }
    }
}

/// Decode, extract, window, classify, smooth.
///
/// The session mutex is held across the whole mutation so interleaved
/// connections sharing a name can never corrupt the window or history; no
/// cross-session lock is held while the classifier runs.
async fn ingest_frame(
    state: &AppState,
    user_name: &str,
    payload: &str,
) -> Result<Option<String>, PipelineError> {
    let frame = vision::decode_frame(payload)?;
    let hands = state.tracker.detect(&frame).map_err(PipelineError::Tracking)?;
    let features = vision::features_from_hands(&hands);

    let session = state.sessions.write().await.get_or_create(user_name);
    let mut session = session.lock().await;

    let evicted = session.push_feature(features);
    state.metrics.record_frame();

    if !session.window_full() {
        return Ok(None);
    }

    let window = session.snapshot_window();
    match classify_window(state, window).await {
        Ok(label) => {
            state.metrics.record_inference();
            tracing::debug!("raw label for {}: {label} ({:?})", session.name, session.phase());
            session.record_label(label);
        }
        Err(e) => {
            // Leave the session exactly as it was before this frame.
            session.rollback_feature(evicted);
            return Err(e);
        }
    }

    match session.stable_label() {
        Some(stable) => {
            state.metrics.record_prediction();
            Ok(Some(stable))
        }
        None => Ok(None),
    }
}

/// Run the classifier on the blocking pool under the configured timeout.
async fn classify_window(
    state: &AppState,
    window: Vec<FeatureVector>,
) -> Result<String, PipelineError> {
    let classifier = state.classifier.clone();
    let timeout_ms = state.config.classify_timeout_ms;
    let task = tokio::task::spawn_blocking(move || classifier.classify(&window));
    match timeout(Duration::from_millis(timeout_ms), task).await {
        Ok(Ok(Ok(label))) => Ok(label),
        Ok(Ok(Err(e))) => Err(PipelineError::ClassifierFailed(e)),
        Ok(Err(join)) => Err(PipelineError::ClassifierFailed(join.into())),
        Err(_) => Err(PipelineError::ClassifierTimeout(timeout_ms)),
    }
}
