use crate::{AppError, AppState};
use backend_domain::{normalize_optional_text, StudentIdentity, StudentListQuery};

pub async fn list_students(
    state: &AppState,
    query: StudentListQuery,
) -> Result<Vec<StudentIdentity>, AppError> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let text = normalize_optional_text(query.query);
    state
        .student_directory
        .fetch_students(text.as_deref(), limit)
        .await
        .map_err(AppError::Internal)
}
