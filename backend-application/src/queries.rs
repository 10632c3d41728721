pub mod attendance_queries;
pub mod dashboard_queries;
pub mod directory_queries;
pub mod event_queries;
pub mod scan_status_queries;
