use axum::routing::{get, post, put};
use axum::Router;

use backend_application::AppState;

use crate::handlers::{attendance_handlers, directory_handlers, event_handlers, ops_handlers};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/v1/events",
            post(event_handlers::create_event).get(event_handlers::list_events),
        )
        .route(
            "/v1/events/:event_id",
            get(event_handlers::get_event).delete(event_handlers::delete_event),
        )
        .route(
            "/v1/events/:event_id/check-ins",
            post(attendance_handlers::check_in),
        )
        .route(
            "/v1/events/:event_id/check-ins/stream",
            get(attendance_handlers::stream_check_ins),
        )
        .route(
            "/v1/events/:event_id/attendance",
            get(attendance_handlers::list_event_attendance),
        )
        .route(
            "/v1/students/:student_number/attendance",
            get(attendance_handlers::list_student_attendance),
        )
        .route(
            "/v1/directory/students",
            put(directory_handlers::upsert_student).get(directory_handlers::list_students),
        )
        .route(
            "/v1/directory/organizers",
            put(directory_handlers::upsert_organizer),
        )
        .route("/v1/scan/last", get(attendance_handlers::get_last_scan))
        .route(
            "/v1/dashboard/attendance",
            get(event_handlers::attendance_dashboard),
        )
        .route("/v1/ops/health/live", get(ops_handlers::health_live))
        .route("/v1/ops/health/ready", get(ops_handlers::health_ready))
        .route(
            "/v1/ops/metrics/prometheus",
            get(ops_handlers::metrics_prometheus),
        )
        .with_state(state)
}
