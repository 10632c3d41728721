use tracing::{error, info, warn};

use crate::{AppError, AppState};
use backend_domain::{
    current_millis, name_or_unknown, organizer_display_name, student_display_name,
    AttendanceWrite, CheckInReceipt, EventId, OperatorId, ScanState, ScanStatus, StudentNumber,
};

/// Records one decoded code as a check-in of `operator_id` at `event_id`.
///
/// Blank codes are rejected before any lookup or write. Name resolution
/// never fails the check-in; it degrades to the "Unknown" fallback. A
/// failed write is reported on the operator's last-scan status and is not
/// retried.
pub async fn check_in(
    state: &AppState,
    event_id: &str,
    operator_id: &str,
    raw_code: &str,
) -> Result<CheckInReceipt, AppError> {
    let event_id = EventId::parse(event_id)?;
    let operator_id = OperatorId::parse(operator_id)?;
    state.metrics.record_scan();

    let student_number = match StudentNumber::parse(raw_code) {
        Ok(number) => number,
        Err(err) => {
            state.metrics.record_rejected_code();
            return Err(err.into());
        }
    };

    set_last_scan(
        state,
        &operator_id,
        &event_id,
        &student_number,
        ScanState::Pending,
        format!("scanned {}", student_number),
    )
    .await;

    match record_check_in(state, &event_id, &operator_id, &student_number).await {
        Ok(receipt) => {
            state.metrics.record_checkin();
            set_last_scan(
                state,
                &operator_id,
                &event_id,
                &student_number,
                ScanState::Recorded,
                receipt.message.clone(),
            )
            .await;
            state.checkin_stream_hub.publish(&receipt.record).await;
            state
                .scan_notifier
                .spawn_notice(state.config.clone(), receipt.record.clone());
            Ok(receipt)
        }
        Err(err) => {
            let scan_state = match &err {
                AppError::Unauthorized | AppError::NotFound(_) => ScanState::Rejected,
                _ => ScanState::Failed,
            };
            if scan_state == ScanState::Failed {
                state.metrics.record_checkin_error();
            }
            set_last_scan(
                state,
                &operator_id,
                &event_id,
                &student_number,
                scan_state,
                format!("check-in failed: {}", err),
            )
            .await;
            Err(err)
        }
    }
}

async fn record_check_in(
    state: &AppState,
    event_id: &EventId,
    operator_id: &OperatorId,
    student_number: &StudentNumber,
) -> Result<CheckInReceipt, AppError> {
    let event = state
        .event_repo
        .fetch_event(event_id)
        .await
        .map_err(|err| {
            error!("failed to fetch event {}: {}", event_id, err);
            AppError::Internal(err)
        })?;
    if event.is_none() {
        return Err(AppError::NotFound(format!("event '{}'", event_id)));
    }

    let organizer = match state.organizer_directory.find_organizer(operator_id).await {
        Ok(found) => found,
        Err(err) => {
            warn!("organizer lookup failed for {}: {}", operator_id, err);
            None
        }
    };
    if let Some(organizer) = &organizer {
        if !organizer.role().can_scan() {
            return Err(AppError::Unauthorized);
        }
    }
    let operator_name = organizer_display_name(organizer.as_ref());
    if operator_name.is_none() {
        state.metrics.record_name_fallback();
    }

    let student_name = resolve_student_name(state, student_number).await;
    if student_name.is_none() {
        state.metrics.record_name_fallback();
    }

    let write = AttendanceWrite {
        event_id: event_id.clone(),
        student_number: student_number.clone(),
        student_name: name_or_unknown(student_name),
        operator_id: operator_id.clone(),
        operator_name: name_or_unknown(operator_name),
        scanned_at: current_millis(),
    };
    let record = state
        .attendance_repo
        .upsert_attendance(&write)
        .await
        .map_err(|err| {
            error!(
                "attendance write failed: event={}, student={}, err={}",
                event_id, student_number, err
            );
            AppError::Internal(err)
        })?
        // Event deleted between the lookup above and the write.
        .ok_or_else(|| AppError::NotFound(format!("event '{}'", event_id)))?;

    let first_scan = record.scan_count <= 1;
    let message = if first_scan {
        format!("{} checked in", record.student_name)
    } else {
        format!(
            "{} already checked in, scan #{} refreshed",
            record.student_name, record.scan_count
        )
    };
    info!(
        "check-in recorded: event={}, student={}, operator={}, scans={}",
        record.event_id, record.student_number, record.operator_id, record.scan_count
    );
    Ok(CheckInReceipt {
        record,
        first_scan,
        message,
    })
}

async fn resolve_student_name(state: &AppState, student_number: &StudentNumber) -> Option<String> {
    match state
        .student_directory
        .find_by_student_number(student_number)
        .await
    {
        Ok(matches) => {
            if matches.len() > 1 {
                warn!(
                    "student number {} matches {} identities, using the first",
                    student_number,
                    matches.len()
                );
            }
            student_display_name(&matches)
        }
        Err(err) => {
            warn!("student lookup failed for {}: {}", student_number, err);
            None
        }
    }
}

async fn set_last_scan(
    state: &AppState,
    operator_id: &OperatorId,
    event_id: &EventId,
    student_number: &StudentNumber,
    scan_state: ScanState,
    message: String,
) {
    let status = ScanStatus {
        operator_id: operator_id.to_string(),
        event_id: event_id.to_string(),
        code: student_number.to_string(),
        state: scan_state,
        message,
        updated_at: current_millis(),
    };
    state
        .last_scans
        .write()
        .await
        .insert(operator_id.to_string(), status);
}
