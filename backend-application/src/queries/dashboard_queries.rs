use std::collections::HashMap;

use tracing::error;

use crate::{AppError, AppState};
use backend_domain::{EventAttendanceSummary, UNKNOWN_EVENT};

/// Attendee count and latest check-in per event. Events without check-ins
/// report zero; attendance left behind by deleted events is kept under
/// "Unknown Event".
pub async fn attendance_summary(state: &AppState) -> Result<Vec<EventAttendanceSummary>, AppError> {
    let events = state.event_repo.fetch_events().await.map_err(|err| {
        error!("failed to fetch events: {}", err);
        AppError::Internal(err)
    })?;
    let tallies = state
        .attendance_repo
        .tally_by_event()
        .await
        .map_err(|err| {
            error!("failed to tally attendance: {}", err);
            AppError::Internal(err)
        })?;

    let mut by_event = tallies
        .into_iter()
        .map(|tally| (tally.event_id.clone(), tally))
        .collect::<HashMap<_, _>>();

    let mut summary = events
        .into_iter()
        .map(|event| {
            let tally = by_event.remove(&event.id);
            EventAttendanceSummary {
                event_id: event.id,
                event_name: event.name,
                attendees: tally.as_ref().map(|t| t.attendees).unwrap_or(0),
                last_scanned_at: tally.and_then(|t| t.last_scanned_at),
            }
        })
        .collect::<Vec<_>>();
    summary.extend(by_event.into_values().map(|tally| EventAttendanceSummary {
        event_id: tally.event_id,
        event_name: UNKNOWN_EVENT.to_string(),
        attendees: tally.attendees,
        last_scanned_at: tally.last_scanned_at,
    }));
    summary.sort_by(|a, b| {
        b.attendees
            .cmp(&a.attendees)
            .then_with(|| a.event_name.cmp(&b.event_name))
            .then_with(|| a.event_id.cmp(&b.event_id))
    });
    Ok(summary)
}
