use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;

use backend_application::commands::directory_commands;
use backend_application::queries::directory_queries;
use backend_application::AppState;
use backend_domain::{
    OrganizerIdentity, OrganizerUpsertRequest, StudentIdentity, StudentListQuery,
    StudentUpsertRequest,
};

use crate::error::HttpError;
use crate::middleware::authorize;

pub async fn upsert_student(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<StudentUpsertRequest>,
) -> Result<Json<StudentIdentity>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let student = directory_commands::register_student(&state, payload).await?;
    Ok(Json(student))
}

pub async fn list_students(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<StudentListQuery>,
) -> Result<Json<Vec<StudentIdentity>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let students = directory_queries::list_students(&state, query).await?;
    Ok(Json(students))
}

pub async fn upsert_organizer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<OrganizerUpsertRequest>,
) -> Result<Json<OrganizerIdentity>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let organizer = directory_commands::register_organizer(&state, payload).await?;
    Ok(Json(organizer))
}
