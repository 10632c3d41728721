// In-memory port fakes shared by the application tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;
use tokio::sync::RwLock;

use backend_domain::ports::{
    AttendanceRepository, EventRepository, OrganizerDirectory, ScanNotifier, StudentDirectory,
};
use backend_domain::{
    AttendanceRecord, AttendanceTally, AttendanceWrite, Event, EventId, EventRemoval, OperatorId,
    OrganizerIdentity, RuntimeConfig, StudentIdentity, StudentNumber,
};

use crate::ops::CheckInStreamHub;
use crate::{AppState, Metrics};

#[derive(Default)]
pub struct MemoryStore {
    attendance: Mutex<Vec<AttendanceRecord>>,
    events: Mutex<HashMap<String, Event>>,
    students: Mutex<Vec<StudentIdentity>>,
    organizers: Mutex<HashMap<String, OrganizerIdentity>>,
    pub write_attempts: AtomicUsize,
    pub fail_writes: AtomicBool,
    pub remove_event_before_write: AtomicBool,
    pub fail_student_lookup: AtomicBool,
    pub fail_event_lookup_for: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn seed_event(&self, id: &str, name: &str) {
        self.events.lock().unwrap().insert(
            id.to_string(),
            Event {
                id: id.to_string(),
                name: name.to_string(),
                description: None,
                location: None,
                starts_at: None,
                created_by: None,
                created_at: 0,
            },
        );
    }

    pub fn seed_student(&self, id: &str, student_number: &str, first: &str, last: &str) {
        self.students.lock().unwrap().push(StudentIdentity {
            id: id.to_string(),
            student_number: student_number.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
        });
    }

    pub fn seed_organizer(&self, id: &str, display_name: &str, role: &str) {
        self.organizers.lock().unwrap().insert(
            id.to_string(),
            OrganizerIdentity {
                id: id.to_string(),
                display_name: display_name.to_string(),
                role: role.to_string(),
            },
        );
    }

    pub fn seed_attendance(&self, record: AttendanceRecord) {
        self.attendance.lock().unwrap().push(record);
    }

    pub fn attendance_rows(&self) -> Vec<AttendanceRecord> {
        self.attendance.lock().unwrap().clone()
    }

    pub fn writes(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AttendanceRepository for MemoryStore {
    async fn ensure_schema(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn upsert_attendance(
        &self,
        write: &AttendanceWrite,
    ) -> anyhow::Result<Option<AttendanceRecord>> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("permission denied"));
        }
        if self.remove_event_before_write.load(Ordering::SeqCst) {
            self.events.lock().unwrap().remove(write.event_id.as_str());
        }
        if !self.events.lock().unwrap().contains_key(write.event_id.as_str()) {
            return Ok(None);
        }
        let mut rows = self.attendance.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|row| {
            row.event_id == write.event_id.as_str()
                && row.student_number == write.student_number.as_str()
        }) {
            row.student_name = write.student_name.clone();
            row.operator_id = write.operator_id.to_string();
            row.operator_name = write.operator_name.clone();
            row.scanned_at = write.scanned_at;
            row.scan_count += 1;
            return Ok(Some(row.clone()));
        }
        let row = AttendanceRecord {
            event_id: write.event_id.to_string(),
            student_number: write.student_number.to_string(),
            student_name: write.student_name.clone(),
            operator_id: write.operator_id.to_string(),
            operator_name: write.operator_name.clone(),
            scanned_at: write.scanned_at,
            first_scanned_at: write.scanned_at,
            scan_count: 1,
        };
        rows.push(row.clone());
        Ok(Some(row))
    }

    async fn list_event_attendance(&self, event_id: &EventId) -> anyhow::Result<Vec<AttendanceRecord>> {
        let mut rows = self
            .attendance
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.event_id == event_id.as_str())
            .cloned()
            .collect::<Vec<_>>();
        rows.sort_by(|a, b| a.student_number.cmp(&b.student_number));
        Ok(rows)
    }

    async fn list_student_attendance(
        &self,
        student_number: &StudentNumber,
    ) -> anyhow::Result<Vec<AttendanceRecord>> {
        Ok(self
            .attendance
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.student_number == student_number.as_str())
            .cloned()
            .collect())
    }

    async fn tally_by_event(&self) -> anyhow::Result<Vec<AttendanceTally>> {
        let mut tallies: HashMap<String, AttendanceTally> = HashMap::new();
        for row in self.attendance.lock().unwrap().iter() {
            let tally = tallies
                .entry(row.event_id.clone())
                .or_insert_with(|| AttendanceTally {
                    event_id: row.event_id.clone(),
                    attendees: 0,
                    last_scanned_at: None,
                });
            tally.attendees += 1;
            tally.last_scanned_at = Some(
                tally
                    .last_scanned_at
                    .map_or(row.scanned_at, |last| last.max(row.scanned_at)),
            );
        }
        Ok(tallies.into_values().collect())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[async_trait]
impl EventRepository for MemoryStore {
    async fn insert_event(&self, event: &Event) -> anyhow::Result<()> {
        self.events
            .lock()
            .unwrap()
            .insert(event.id.clone(), event.clone());
        Ok(())
    }

    async fn fetch_event(&self, event_id: &EventId) -> anyhow::Result<Option<Event>> {
        if self.fail_event_lookup_for.lock().unwrap().as_deref() == Some(event_id.as_str()) {
            return Err(anyhow!("event lookup failed"));
        }
        Ok(self.events.lock().unwrap().get(event_id.as_str()).cloned())
    }

    async fn fetch_events(&self) -> anyhow::Result<Vec<Event>> {
        let mut events = self
            .events
            .lock()
            .unwrap()
            .values()
            .cloned()
            .collect::<Vec<_>>();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(events)
    }

    async fn delete_event(
        &self,
        event_id: &EventId,
        cascade_attendance: bool,
    ) -> anyhow::Result<EventRemoval> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("database is locked"));
        }
        let mut attendance_removed = 0;
        if cascade_attendance {
            let mut rows = self.attendance.lock().unwrap();
            let before = rows.len();
            rows.retain(|row| row.event_id != event_id.as_str());
            attendance_removed = (before - rows.len()) as u64;
        }
        let event_deleted = self.events.lock().unwrap().remove(event_id.as_str()).is_some();
        Ok(EventRemoval {
            event_deleted,
            attendance_removed,
        })
    }
}

#[async_trait]
impl StudentDirectory for MemoryStore {
    async fn find_by_student_number(
        &self,
        student_number: &StudentNumber,
    ) -> anyhow::Result<Vec<StudentIdentity>> {
        self.find_by_student_numbers(std::slice::from_ref(student_number))
            .await
    }

    async fn find_by_student_numbers(
        &self,
        student_numbers: &[StudentNumber],
    ) -> anyhow::Result<Vec<StudentIdentity>> {
        if self.fail_student_lookup.load(Ordering::SeqCst) {
            return Err(anyhow!("student directory unavailable"));
        }
        Ok(self
            .students
            .lock()
            .unwrap()
            .iter()
            .filter(|student| {
                student_numbers
                    .iter()
                    .any(|number| number.as_str() == student.student_number)
            })
            .cloned()
            .collect())
    }

    async fn upsert_student(&self, student: &StudentIdentity) -> anyhow::Result<()> {
        let mut students = self.students.lock().unwrap();
        students.retain(|item| item.id != student.id);
        students.push(student.clone());
        Ok(())
    }

    async fn fetch_students(&self, query: Option<&str>, limit: usize) -> anyhow::Result<Vec<StudentIdentity>> {
        Ok(self
            .students
            .lock()
            .unwrap()
            .iter()
            .filter(|student| {
                query
                    .map(|text| student.student_number.contains(text))
                    .unwrap_or(true)
            })
            .take(limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl OrganizerDirectory for MemoryStore {
    async fn find_organizer(&self, operator_id: &OperatorId) -> anyhow::Result<Option<OrganizerIdentity>> {
        Ok(self
            .organizers
            .lock()
            .unwrap()
            .get(operator_id.as_str())
            .cloned())
    }

    async fn find_organizers(&self, operator_ids: &[OperatorId]) -> anyhow::Result<Vec<OrganizerIdentity>> {
        let organizers = self.organizers.lock().unwrap();
        Ok(operator_ids
            .iter()
            .filter_map(|id| organizers.get(id.as_str()).cloned())
            .collect())
    }

    async fn upsert_organizer(&self, organizer: &OrganizerIdentity) -> anyhow::Result<()> {
        self.organizers
            .lock()
            .unwrap()
            .insert(organizer.id.clone(), organizer.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct CountingNotifier {
    pub notices: AtomicUsize,
}

impl ScanNotifier for CountingNotifier {
    fn spawn_notice(&self, _config: RuntimeConfig, _record: AttendanceRecord) {
        self.notices.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn runtime_config() -> RuntimeConfig {
    RuntimeConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        api_token: None,
        max_body_bytes: 1024 * 1024,
        request_timeout_seconds: 5,
        cascade_attendance_on_event_delete: true,
        scan_webhook_url: None,
    }
}

pub fn test_state(store: Arc<MemoryStore>) -> AppState {
    AppState {
        config: runtime_config(),
        attendance_repo: store.clone(),
        event_repo: store.clone(),
        student_directory: store.clone(),
        organizer_directory: store,
        scan_notifier: Arc::new(CountingNotifier::default()),
        last_scans: Arc::new(RwLock::new(HashMap::new())),
        checkin_stream_hub: Arc::new(CheckInStreamHub::default()),
        metrics: Arc::new(Metrics::default()),
    }
}

pub fn record(event_id: &str, student_number: &str, operator: &str, scanned_at: i64) -> AttendanceRecord {
    AttendanceRecord {
        event_id: event_id.to_string(),
        student_number: student_number.to_string(),
        student_name: String::new(),
        operator_id: operator.to_string(),
        operator_name: String::new(),
        scanned_at,
        first_scanned_at: scanned_at,
        scan_count: 1,
    }
}
