use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Clone)]
pub struct CheckInRequest {
    pub code: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EventCreateRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub starts_at: Option<i64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StudentUpsertRequest {
    pub id: String,
    pub student_number: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OrganizerUpsertRequest {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct StudentListQuery {
    pub query: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EventDeleteResult {
    pub event_id: String,
    pub attendance_removed: u64,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
    pub cascade_attendance_on_event_delete: bool,
    pub scan_webhook_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_url: String,
    pub max_connections: u32,
}
