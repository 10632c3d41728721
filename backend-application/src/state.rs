use std::collections::HashMap;
use std::sync::Arc;

use backend_domain::ports::{
    AttendanceRepository, EventRepository, OrganizerDirectory, ScanNotifier, StudentDirectory,
};
use backend_domain::{RuntimeConfig, ScanStatus};
use tokio::sync::RwLock;

use crate::ops::CheckInStreamHub;
use crate::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub attendance_repo: Arc<dyn AttendanceRepository>,
    pub event_repo: Arc<dyn EventRepository>,
    pub student_directory: Arc<dyn StudentDirectory>,
    pub organizer_directory: Arc<dyn OrganizerDirectory>,
    pub scan_notifier: Arc<dyn ScanNotifier>,
    /// Last scan per operator id.
    pub last_scans: Arc<RwLock<HashMap<String, ScanStatus>>>,
    pub checkin_stream_hub: Arc<CheckInStreamHub>,
    pub metrics: Arc<Metrics>,
}
