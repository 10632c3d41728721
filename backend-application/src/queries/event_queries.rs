use tracing::error;

use crate::{AppError, AppState};
use backend_domain::{Event, EventId};

pub async fn list_events(state: &AppState) -> Result<Vec<Event>, AppError> {
    state.event_repo.fetch_events().await.map_err(|err| {
        error!("failed to fetch events: {}", err);
        AppError::Internal(err)
    })
}

pub async fn get_event(state: &AppState, event_id: &str) -> Result<Event, AppError> {
    let event_id = EventId::parse(event_id)?;
    state
        .event_repo
        .fetch_event(&event_id)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::NotFound(format!("event '{}'", event_id)))
}
