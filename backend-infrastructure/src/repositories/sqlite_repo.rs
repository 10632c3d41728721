use std::str::FromStr;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite};

use backend_domain::{
    AttendanceRecord, AttendanceRepository, AttendanceTally, AttendanceWrite, DbConfig, Event,
    EventId, EventRemoval, EventRepository, OperatorId, OrganizerDirectory, OrganizerIdentity, StudentDirectory,
    StudentIdentity, StudentNumber,
};

use crate::utils::is_memory_database;

const ATTENDANCE_COLUMNS: &str = "event_id, student_number, student_name, operator_id, \
operator_name, scanned_at, first_scanned_at, scan_count";
const EVENT_COLUMNS: &str = "id, name, description, location, starts_at, created_by, created_at";
const STUDENT_COLUMNS: &str = "id, student_number, first_name, last_name";

const SCHEMA: [&str; 6] = [
    r#"
CREATE TABLE IF NOT EXISTS events (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    description TEXT,
    location TEXT,
    starts_at INTEGER,
    created_by TEXT,
    created_at INTEGER NOT NULL
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS students (
    id TEXT PRIMARY KEY NOT NULL,
    student_number TEXT NOT NULL,
    first_name TEXT NOT NULL DEFAULT '',
    last_name TEXT NOT NULL DEFAULT ''
)
"#,
    "CREATE INDEX IF NOT EXISTS idx_students_student_number ON students (student_number)",
    r#"
CREATE TABLE IF NOT EXISTS organizers (
    id TEXT PRIMARY KEY NOT NULL,
    display_name TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'organizer'
)
"#,
    // The primary key is what makes repeated scans merge instead of duplicate.
    r#"
CREATE TABLE IF NOT EXISTS attendance (
    event_id TEXT NOT NULL,
    student_number TEXT NOT NULL,
    student_name TEXT NOT NULL,
    operator_id TEXT NOT NULL,
    operator_name TEXT NOT NULL,
    scanned_at INTEGER NOT NULL,
    first_scanned_at INTEGER NOT NULL,
    scan_count INTEGER NOT NULL DEFAULT 1,
    PRIMARY KEY (event_id, student_number)
)
"#,
    "CREATE INDEX IF NOT EXISTS idx_attendance_student ON attendance (student_number, scanned_at DESC)",
];

#[derive(Clone)]
pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DbConfig) -> Result<Self> {
        let memory = is_memory_database(&config.database_url);
        let mut options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true);
        if !memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }
        let mut pool_options = SqlitePoolOptions::new();
        if memory {
            // Every connection to :memory: is its own database; keep exactly one alive.
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        } else {
            pool_options = pool_options.max_connections(config.max_connections.max(1));
        }
        let pool = pool_options.connect_with(options).await?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl AttendanceRepository for SqliteRepo {
    async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn upsert_attendance(&self, write: &AttendanceWrite) -> Result<Option<AttendanceRecord>> {
        // The existence check and the write are one statement, so a row can
        // never land after its event's delete has committed.
        let sql = format!(
            r#"
INSERT INTO attendance ({ATTENDANCE_COLUMNS})
SELECT ?, ?, ?, ?, ?, ?, ?, 1
WHERE EXISTS (SELECT 1 FROM events WHERE id = ?)
ON CONFLICT (event_id, student_number) DO UPDATE SET
    student_name = excluded.student_name,
    operator_id = excluded.operator_id,
    operator_name = excluded.operator_name,
    scanned_at = excluded.scanned_at,
    scan_count = attendance.scan_count + 1
RETURNING {ATTENDANCE_COLUMNS}
"#
        );
        let record = sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(write.event_id.as_str())
            .bind(write.student_number.as_str())
            .bind(&write.student_name)
            .bind(write.operator_id.as_str())
            .bind(&write.operator_name)
            .bind(write.scanned_at)
            .bind(write.scanned_at)
            .bind(write.event_id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn list_event_attendance(&self, event_id: &EventId) -> Result<Vec<AttendanceRecord>> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE event_id = ? ORDER BY student_number"
        );
        let rows = sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(event_id.as_str())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_student_attendance(&self, student_number: &StudentNumber) -> Result<Vec<AttendanceRecord>> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE student_number = ? ORDER BY scanned_at DESC"
        );
        let rows = sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(student_number.as_str())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn tally_by_event(&self) -> Result<Vec<AttendanceTally>> {
        let rows = sqlx::query_as::<_, AttendanceTally>(
            "SELECT event_id, COUNT(*) AS attendees, MAX(scanned_at) AS last_scanned_at \
             FROM attendance GROUP BY event_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl EventRepository for SqliteRepo {
    async fn insert_event(&self, event: &Event) -> Result<()> {
        let sql = format!("INSERT INTO events ({EVENT_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?)");
        sqlx::query(&sql)
            .bind(&event.id)
            .bind(&event.name)
            .bind(&event.description)
            .bind(&event.location)
            .bind(event.starts_at)
            .bind(&event.created_by)
            .bind(event.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn fetch_event(&self, event_id: &EventId) -> Result<Option<Event>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?");
        let event = sqlx::query_as::<_, Event>(&sql)
            .bind(event_id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(event)
    }

    async fn fetch_events(&self) -> Result<Vec<Event>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY created_at DESC, id");
        let events = sqlx::query_as::<_, Event>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(events)
    }

    async fn delete_event(&self, event_id: &EventId, cascade_attendance: bool) -> Result<EventRemoval> {
        let mut tx = self.pool.begin().await?;
        let mut attendance_removed = 0;
        if cascade_attendance {
            attendance_removed = sqlx::query("DELETE FROM attendance WHERE event_id = ?")
                .bind(event_id.as_str())
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }
        let deleted = sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(event_id.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        Ok(EventRemoval {
            event_deleted: deleted > 0,
            attendance_removed,
        })
    }
}

#[async_trait]
impl StudentDirectory for SqliteRepo {
    async fn find_by_student_number(&self, student_number: &StudentNumber) -> Result<Vec<StudentIdentity>> {
        let sql = format!("SELECT {STUDENT_COLUMNS} FROM students WHERE student_number = ? ORDER BY id");
        let students = sqlx::query_as::<_, StudentIdentity>(&sql)
            .bind(student_number.as_str())
            .fetch_all(&self.pool)
            .await?;
        Ok(students)
    }

    async fn find_by_student_numbers(&self, student_numbers: &[StudentNumber]) -> Result<Vec<StudentIdentity>> {
        if student_numbers.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE student_number IN ("
        ));
        let mut separated = builder.separated(", ");
        for number in student_numbers {
            separated.push_bind(number.as_str());
        }
        separated.push_unseparated(") ORDER BY id");
        let students = builder
            .build_query_as::<StudentIdentity>()
            .fetch_all(&self.pool)
            .await?;
        Ok(students)
    }

    async fn upsert_student(&self, student: &StudentIdentity) -> Result<()> {
        sqlx::query(
            r#"
INSERT INTO students (id, student_number, first_name, last_name)
VALUES (?, ?, ?, ?)
ON CONFLICT (id) DO UPDATE SET
    student_number = excluded.student_number,
    first_name = excluded.first_name,
    last_name = excluded.last_name
"#,
        )
        .bind(&student.id)
        .bind(&student.student_number)
        .bind(&student.first_name)
        .bind(&student.last_name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fetch_students(&self, query: Option<&str>, limit: usize) -> Result<Vec<StudentIdentity>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {STUDENT_COLUMNS} FROM students"));
        if let Some(text) = query {
            let pattern = format!("%{}%", text.to_lowercase());
            builder
                .push(" WHERE lower(student_number) LIKE ")
                .push_bind(pattern.clone())
                .push(" OR lower(first_name || ' ' || last_name) LIKE ")
                .push_bind(pattern);
        }
        builder
            .push(" ORDER BY student_number, id LIMIT ")
            .push_bind(limit as i64);
        let students = builder
            .build_query_as::<StudentIdentity>()
            .fetch_all(&self.pool)
            .await?;
        Ok(students)
    }
}

#[async_trait]
impl OrganizerDirectory for SqliteRepo {
    async fn find_organizer(&self, operator_id: &OperatorId) -> Result<Option<OrganizerIdentity>> {
        let organizer = sqlx::query_as::<_, OrganizerIdentity>(
            "SELECT id, display_name, role FROM organizers WHERE id = ?",
        )
        .bind(operator_id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(organizer)
    }

    async fn find_organizers(&self, operator_ids: &[OperatorId]) -> Result<Vec<OrganizerIdentity>> {
        if operator_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT id, display_name, role FROM organizers WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in operator_ids {
            separated.push_bind(id.as_str());
        }
        separated.push_unseparated(")");
        let organizers = builder
            .build_query_as::<OrganizerIdentity>()
            .fetch_all(&self.pool)
            .await?;
        Ok(organizers)
    }

    async fn upsert_organizer(&self, organizer: &OrganizerIdentity) -> Result<()> {
        sqlx::query(
            r#"
INSERT INTO organizers (id, display_name, role)
VALUES (?, ?, ?)
ON CONFLICT (id) DO UPDATE SET
    display_name = excluded.display_name,
    role = excluded.role
"#,
        )
        .bind(&organizer.id)
        .bind(&organizer.display_name)
        .bind(&organizer.role)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
