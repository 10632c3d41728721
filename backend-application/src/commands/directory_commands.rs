use tracing::info;

use crate::{AppError, AppState};
use backend_domain::{
    OperatorId, OrganizerIdentity, OrganizerUpsertRequest, Role, StudentIdentity, StudentNumber,
    StudentUpsertRequest,
};

pub async fn register_student(
    state: &AppState,
    payload: StudentUpsertRequest,
) -> Result<StudentIdentity, AppError> {
    let id = normalize_required_text(payload.id, "id")?;
    let student_number = StudentNumber::parse(&payload.student_number)?;
    let student = StudentIdentity {
        id,
        student_number: student_number.to_string(),
        first_name: payload.first_name.trim().to_string(),
        last_name: payload.last_name.trim().to_string(),
    };
    state
        .student_directory
        .upsert_student(&student)
        .await
        .map_err(AppError::Internal)?;
    info!(
        "student registered: id={}, student_number={}",
        student.id, student.student_number
    );
    Ok(student)
}

pub async fn register_organizer(
    state: &AppState,
    payload: OrganizerUpsertRequest,
) -> Result<OrganizerIdentity, AppError> {
    let id = OperatorId::parse(&payload.id)?;
    let display_name = normalize_required_text(payload.display_name, "display_name")?;
    let role = match payload.role.as_deref().map(str::trim) {
        None | Some("") => Role::Organizer,
        Some(raw) => Role::parse(raw).ok_or_else(|| {
            AppError::BadRequest(format!(
                "unknown role '{}', expected student, organizer or admin",
                raw
            ))
        })?,
    };
    let organizer = OrganizerIdentity {
        id: id.to_string(),
        display_name,
        role: role.as_str().to_string(),
    };
    state
        .organizer_directory
        .upsert_organizer(&organizer)
        .await
        .map_err(AppError::Internal)?;
    info!("organizer registered: id={}, role={}", organizer.id, organizer.role);
    Ok(organizer)
}

fn normalize_required_text(value: String, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}
