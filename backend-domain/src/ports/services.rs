use crate::entities::{AttendanceRecord, RuntimeConfig};

pub trait ScanNotifier: Send + Sync {
    /// Fire-and-forget; delivery failures never reach the scan.
    fn spawn_notice(&self, config: RuntimeConfig, record: AttendanceRecord);
}
