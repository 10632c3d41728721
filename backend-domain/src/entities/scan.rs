// Scan status entities
// What the operator sees after each decoded code

use serde::{Deserialize, Serialize};

use crate::entities::AttendanceRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    /// Decoded and shown to the operator; write not settled yet.
    Pending,
    Recorded,
    Rejected,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanStatus {
    pub operator_id: String,
    pub event_id: String,
    pub code: String,
    pub state: ScanState,
    pub message: String,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckInReceipt {
    pub record: AttendanceRecord,
    pub first_scan: bool,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSessionSummary {
    pub decoded: u64,
    pub recorded: u64,
    pub rejected: u64,
    pub failed: u64,
}
