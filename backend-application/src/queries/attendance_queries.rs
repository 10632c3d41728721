use std::collections::{BTreeSet, HashMap};

use tracing::{error, warn};

use crate::{AppError, AppState};
use backend_domain::{
    organizer_display_name, student_display_name, EventAttendanceRow, EventId, OperatorId,
    OrganizerIdentity, StudentAttendanceRow, StudentIdentity, StudentNumber, UNKNOWN_EVENT,
    UNKNOWN_NAME,
};

/// Every check-in of one event, joined with current student and organizer
/// names. Both joins are one batched directory query each, indexed by key.
pub async fn list_event_attendance(
    state: &AppState,
    event_id: &str,
) -> Result<Vec<EventAttendanceRow>, AppError> {
    let event_id = EventId::parse(event_id)?;
    let records = state
        .attendance_repo
        .list_event_attendance(&event_id)
        .await
        .map_err(|err| {
            error!("failed to fetch attendance of {}: {}", event_id, err);
            AppError::Internal(err)
        })?;
    if records.is_empty() {
        return Ok(Vec::new());
    }

    let student_numbers = records
        .iter()
        .filter_map(|record| StudentNumber::parse(&record.student_number).ok())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>();
    let operator_ids = records
        .iter()
        .filter_map(|record| OperatorId::parse(&record.operator_id).ok())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>();

    let students = match state
        .student_directory
        .find_by_student_numbers(&student_numbers)
        .await
    {
        Ok(students) => index_students(students),
        Err(err) => {
            warn!("student join failed for {}: {}", event_id, err);
            HashMap::new()
        }
    };
    let organizers = match state.organizer_directory.find_organizers(&operator_ids).await {
        Ok(organizers) => organizer_index(organizers),
        Err(err) => {
            warn!("organizer join failed for {}: {}", event_id, err);
            HashMap::new()
        }
    };

    Ok(records
        .into_iter()
        .map(|record| {
            let student_name = students
                .get(&record.student_number)
                .and_then(|matches| student_display_name(matches.as_slice()))
                .or_else(|| stored_name(&record.student_name))
                .unwrap_or_else(|| UNKNOWN_NAME.to_string());
            let operator_name = organizer_display_name(organizers.get(&record.operator_id))
                .or_else(|| stored_name(&record.operator_name))
                .unwrap_or_else(|| UNKNOWN_NAME.to_string());
            EventAttendanceRow {
                student_number: record.student_number,
                student_name,
                operator_id: record.operator_id,
                operator_name,
                scanned_at: record.scanned_at,
                scan_count: record.scan_count,
            }
        })
        .collect())
}

/// One student's check-ins across every event, most recent first.
pub async fn list_student_attendance(
    state: &AppState,
    student_number: &str,
) -> Result<Vec<StudentAttendanceRow>, AppError> {
    let student_number = StudentNumber::parse(student_number)?;
    let records = state
        .attendance_repo
        .list_student_attendance(&student_number)
        .await
        .map_err(|err| {
            error!(
                "failed to fetch attendance of student {}: {}",
                student_number, err
            );
            AppError::Internal(err)
        })?;

    let mut event_names: HashMap<String, String> = HashMap::new();
    let mut rows = Vec::with_capacity(records.len());
    for record in records {
        if !event_names.contains_key(&record.event_id) {
            let name = resolve_event_name(state, &record.event_id).await;
            event_names.insert(record.event_id.clone(), name);
        }
        let event_name = event_names
            .get(&record.event_id)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_EVENT.to_string());
        rows.push(StudentAttendanceRow {
            event_id: record.event_id,
            event_name,
            operator_name: stored_name(&record.operator_name)
                .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            scanned_at: record.scanned_at,
        });
    }
    rows.sort_by(|a, b| {
        b.scanned_at
            .cmp(&a.scanned_at)
            .then_with(|| a.event_id.cmp(&b.event_id))
    });
    Ok(rows)
}

async fn resolve_event_name(state: &AppState, event_id: &str) -> String {
    let Ok(event_id) = EventId::parse(event_id) else {
        return UNKNOWN_EVENT.to_string();
    };
    match state.event_repo.fetch_event(&event_id).await {
        Ok(Some(event)) => event.name,
        Ok(None) => UNKNOWN_EVENT.to_string(),
        Err(err) => {
            warn!("event lookup failed for {}: {}", event_id, err);
            UNKNOWN_EVENT.to_string()
        }
    }
}

/// Groups by business key, keeping directory order so the first match wins.
fn index_students(students: Vec<StudentIdentity>) -> HashMap<String, Vec<StudentIdentity>> {
    let mut index: HashMap<String, Vec<StudentIdentity>> = HashMap::new();
    for student in students {
        index
            .entry(student.student_number.clone())
            .or_default()
            .push(student);
    }
    index
}

fn stored_name(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn organizer_index(organizers: Vec<OrganizerIdentity>) -> HashMap<String, OrganizerIdentity> {
    organizers
        .into_iter()
        .map(|organizer| (organizer.id.clone(), organizer))
        .collect()
}
