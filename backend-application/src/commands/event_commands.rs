use tracing::{error, info};

use crate::{AppError, AppState};
use backend_domain::{
    current_millis, normalize_optional_text, Event, EventCreateRequest, EventDeleteResult, EventId,
    OperatorId,
};

pub async fn create_event(
    state: &AppState,
    created_by: Option<&str>,
    payload: EventCreateRequest,
) -> Result<Event, AppError> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("name must not be empty".to_string()));
    }
    let created_by = created_by
        .map(OperatorId::parse)
        .transpose()?
        .map(|id| id.to_string());
    if let Some(starts_at) = payload.starts_at {
        if starts_at < 0 {
            return Err(AppError::BadRequest("starts_at must not be negative".to_string()));
        }
    }

    let event = Event {
        id: EventId::generate().to_string(),
        name,
        description: normalize_optional_text(payload.description),
        location: normalize_optional_text(payload.location),
        starts_at: payload.starts_at,
        created_by,
        created_at: current_millis(),
    };
    state.event_repo.insert_event(&event).await.map_err(|err| {
        error!("failed to insert event: {}", err);
        AppError::Internal(err)
    })?;
    info!("event created: id={}, name={}", event.id, event.name);
    Ok(event)
}

/// Deletes an event. With `cascade_attendance_on_event_delete` its
/// attendance goes in the same store transaction; otherwise the rows stay
/// behind and student-scoped listings show them as "Unknown Event".
pub async fn delete_event(state: &AppState, event_id: &str) -> Result<EventDeleteResult, AppError> {
    let event_id = EventId::parse(event_id)?;
    let cascade = state.config.cascade_attendance_on_event_delete;

    let removal = state
        .event_repo
        .delete_event(&event_id, cascade)
        .await
        .map_err(|err| {
            error!("failed to delete event {}: {}", event_id, err);
            AppError::Internal(err)
        })?;
    if !removal.event_deleted && removal.attendance_removed == 0 {
        return Err(AppError::NotFound(format!("event '{}'", event_id)));
    }
    state.checkin_stream_hub.close(event_id.as_str()).await;
    info!(
        "event deleted: id={}, attendance_removed={}",
        event_id, removal.attendance_removed
    );
    Ok(EventDeleteResult {
        event_id: event_id.to_string(),
        attendance_removed: removal.attendance_removed,
    })
}
