use async_trait::async_trait;

use crate::entities::{
    AttendanceRecord,
    AttendanceTally,
    AttendanceWrite,
    Event,
    EventRemoval,
    OrganizerIdentity,
    StudentIdentity,
};
use crate::value_objects::{EventId, OperatorId, StudentNumber};

#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    async fn ensure_schema(&self) -> anyhow::Result<()>;
    /// Insert-or-merge keyed by (event_id, student_number). Never produces
    /// a second row for the same pair. `None` when the event no longer
    /// exists at write time; nothing is written then.
    async fn upsert_attendance(&self, write: &AttendanceWrite) -> anyhow::Result<Option<AttendanceRecord>>;
    async fn list_event_attendance(&self, event_id: &EventId) -> anyhow::Result<Vec<AttendanceRecord>>;
    /// Spans every event's attendance.
    async fn list_student_attendance(
        &self,
        student_number: &StudentNumber,
    ) -> anyhow::Result<Vec<AttendanceRecord>>;
    async fn tally_by_event(&self) -> anyhow::Result<Vec<AttendanceTally>>;
    async fn ping(&self) -> anyhow::Result<()>;
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn insert_event(&self, event: &Event) -> anyhow::Result<()>;
    async fn fetch_event(&self, event_id: &EventId) -> anyhow::Result<Option<Event>>;
    async fn fetch_events(&self) -> anyhow::Result<Vec<Event>>;
    /// Removes the event and, with `cascade_attendance`, its attendance in
    /// the same transaction.
    async fn delete_event(
        &self,
        event_id: &EventId,
        cascade_attendance: bool,
    ) -> anyhow::Result<EventRemoval>;
}

#[async_trait]
pub trait StudentDirectory: Send + Sync {
    async fn find_by_student_number(
        &self,
        student_number: &StudentNumber,
    ) -> anyhow::Result<Vec<StudentIdentity>>;
    async fn find_by_student_numbers(
        &self,
        student_numbers: &[StudentNumber],
    ) -> anyhow::Result<Vec<StudentIdentity>>;
    async fn upsert_student(&self, student: &StudentIdentity) -> anyhow::Result<()>;
    async fn fetch_students(&self, query: Option<&str>, limit: usize) -> anyhow::Result<Vec<StudentIdentity>>;
}

#[async_trait]
pub trait OrganizerDirectory: Send + Sync {
    async fn find_organizer(&self, operator_id: &OperatorId) -> anyhow::Result<Option<OrganizerIdentity>>;
    async fn find_organizers(&self, operator_ids: &[OperatorId]) -> anyhow::Result<Vec<OrganizerIdentity>>;
    async fn upsert_organizer(&self, organizer: &OrganizerIdentity) -> anyhow::Result<()>;
}
