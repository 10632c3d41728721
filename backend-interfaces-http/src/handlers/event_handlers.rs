use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use backend_application::commands::event_commands;
use backend_application::queries::{dashboard_queries, event_queries};
use backend_application::AppState;
use backend_domain::{Event, EventAttendanceSummary, EventCreateRequest, EventDeleteResult};

use crate::error::HttpError;
use crate::middleware::{authorize, optional_operator};

pub async fn create_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<EventCreateRequest>,
) -> Result<(StatusCode, Json<Event>), HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let created_by = optional_operator(&headers);
    let event = event_commands::create_event(&state, created_by.as_deref(), payload).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn list_events(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Event>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let events = event_queries::list_events(&state).await?;
    Ok(Json(events))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Event>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let event = event_queries::get_event(&state, &event_id).await?;
    Ok(Json(event))
}

pub async fn delete_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<EventDeleteResult>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let result = event_commands::delete_event(&state, &event_id).await?;
    Ok(Json(result))
}

pub async fn attendance_dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<EventAttendanceSummary>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let summary = dashboard_queries::attendance_summary(&state).await?;
    Ok(Json(summary))
}
