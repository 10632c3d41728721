// Attendance entity
// One check-in of one student at one event, keyed by (event_id, student_number)

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::value_objects::{EventId, OperatorId, StudentNumber};

/// Stored attendance row. `student_name` and `operator_name` are
/// denormalized at write time; `first_scanned_at` and `scan_count` are
/// maintained by the store and never part of the merge payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AttendanceRecord {
    pub event_id: String,
    pub student_number: String,
    pub student_name: String,
    pub operator_id: String,
    pub operator_name: String,
    pub scanned_at: i64,
    pub first_scanned_at: i64,
    pub scan_count: i64,
}

/// Merge payload for an attendance upsert.
#[derive(Debug, Clone)]
pub struct AttendanceWrite {
    pub event_id: EventId,
    pub student_number: StudentNumber,
    pub student_name: String,
    pub operator_id: OperatorId,
    pub operator_name: String,
    pub scanned_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventAttendanceRow {
    pub student_number: String,
    pub student_name: String,
    pub operator_id: String,
    pub operator_name: String,
    pub scanned_at: i64,
    pub scan_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentAttendanceRow {
    pub event_id: String,
    pub event_name: String,
    pub operator_name: String,
    pub scanned_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AttendanceTally {
    pub event_id: String,
    pub attendees: i64,
    pub last_scanned_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventAttendanceSummary {
    pub event_id: String,
    pub event_name: String,
    pub attendees: i64,
    pub last_scanned_at: Option<i64>,
}
