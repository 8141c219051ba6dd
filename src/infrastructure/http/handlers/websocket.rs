//! WebSocket Handler - 阅读进度推送

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::application::SessionKey;
use crate::domain::reading::{MaterialId, StudentId};
use crate::infrastructure::events::WsEvent;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProgressSocketParams {
    pub student: String,
}

/// 资料阅读进度 WebSocket（取代客户端轮询）
pub async fn progress_websocket_handler(
    ws: WebSocketUpgrade,
    Path(material_id): Path<String>,
    Query(params): Query<ProgressSocketParams>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let student_id =
        StudentId::new(params.student).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let material_id =
        MaterialId::new(material_id).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let key = SessionKey::new(student_id, material_id);

    Ok(ws
        .on_upgrade(move |socket| handle_progress_socket(socket, key, state))
        .into_response())
}

fn encode(event: &WsEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Message::Text(json)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize event");
            None
        }
    }
}

async fn handle_progress_socket(socket: WebSocket, key: SessionKey, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // 先订阅再读取快照，避免漏掉两者之间的变更
    let mut event_rx = state.event_publisher.subscribe(&key);

    tracing::info!(key = %key, "Progress WebSocket connected");

    match state.session_repo.find(&key).await {
        Ok(Some(session)) => {
            if let Some(msg) = encode(&WsEvent::progress_updated(&session)) {
                if sender.send(msg).await.is_err() {
                    drop(event_rx);
                    state.event_publisher.release(&key);
                    return;
                }
            }
        }
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Failed to load progress snapshot");
        }
    }

    let forward_key = key.clone();
    let forward = async move {
        loop {
            match event_rx.recv().await {
                Ok(event) => {
                    let Some(msg) = encode(&event) else { continue };
                    if let Err(e) = sender.send(msg).await {
                        tracing::debug!(
                            key = %forward_key,
                            error = %e,
                            "Failed to send WebSocket message"
                        );
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(key = %forward_key, skipped, "WebSocket subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    // 接收客户端消息（心跳 / 关闭）
    let receive_key = key.clone();
    let receive = async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::info!(key = %receive_key, "WebSocket closed by client");
                    break;
                }
                Err(e) => {
                    tracing::debug!(key = %receive_key, error = %e, "WebSocket error");
                    break;
                }
                _ => {}
            }
        }
    };

    // 等待任一方向结束
    tokio::select! {
        _ = forward => {}
        _ = receive => {}
    }

    state.event_publisher.release(&key);
    tracing::info!(key = %key, "Progress WebSocket disconnected");
}
