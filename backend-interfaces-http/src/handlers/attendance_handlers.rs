use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use backend_application::commands::checkin_commands;
use backend_application::queries::{attendance_queries, event_queries, scan_status_queries};
use backend_application::{AppError, AppState};
use backend_domain::{
    AttendanceRecord, CheckInReceipt, CheckInRequest, EventAttendanceRow, ScanStatus,
    StudentAttendanceRow,
};

use crate::error::HttpError;
use crate::middleware::{authorize, authorize_with_query, require_operator};

#[derive(serde::Deserialize)]
pub struct StreamQuery {
    pub access_token: Option<String>,
}

pub async fn check_in(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<CheckInRequest>,
) -> Result<(StatusCode, Json<CheckInReceipt>), HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let operator_id = require_operator(&headers)?;
    let receipt = checkin_commands::check_in(&state, &event_id, &operator_id, &payload.code)
        .await
        .map_err(|err| match err {
            AppError::Internal(err) => HttpError::Internal(format!("check-in failed: {}", err)),
            other => other.into(),
        })?;
    let status = if receipt.first_scan {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(receipt)))
}

pub async fn list_event_attendance(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<EventAttendanceRow>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let rows = attendance_queries::list_event_attendance(&state, &event_id).await?;
    Ok(Json(rows))
}

pub async fn list_student_attendance(
    State(state): State<AppState>,
    Path(student_number): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<StudentAttendanceRow>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let rows = attendance_queries::list_student_attendance(&state, &student_number).await?;
    Ok(Json(rows))
}

pub async fn get_last_scan(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Option<ScanStatus>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let operator_id = require_operator(&headers)?;
    let status = scan_status_queries::get_last_scan(&state, &operator_id).await?;
    Ok(Json(status))
}

pub async fn stream_check_ins(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    Query(query): Query<StreamQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<Response, HttpError> {
    if !authorize_with_query(&state.config, &headers, query.access_token.as_deref()) {
        return Err(HttpError::Unauthorized);
    }
    let event = event_queries::get_event(&state, &event_id).await?;
    let rx = state.checkin_stream_hub.subscribe(&event.id).await;
    Ok(ws
        .on_upgrade(move |socket| forward_check_ins(socket, rx, event.id))
        .into_response())
}

async fn forward_check_ins(
    socket: WebSocket,
    mut rx: broadcast::Receiver<AttendanceRecord>,
    event_id: String,
) {
    let (mut sender, mut receiver) = socket.split();
    debug!("check-in stream opened for {}", event_id);
    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Ok(record) => {
                    let payload = match serde_json::to_string(&record) {
                        Ok(payload) => payload,
                        Err(err) => {
                            warn!("failed to encode check-in for stream: {}", err);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(payload)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("check-in stream for {} lagged, skipped {}", event_id, skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
    let _ = sender.send(Message::Close(None)).await;
    debug!("check-in stream closed for {}", event_id);
}
