use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::RwLock;
use tracing::info;

use backend_application::ops::CheckInStreamHub;
use backend_application::{AppState, Metrics};
use backend_domain::AttendanceRepository;
use backend_infrastructure::{AppConfig, SqliteRepo, WebhookScanNotifier};

pub struct AppContext {
    pub state: AppState,
}

impl AppContext {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let runtime_config = config.to_runtime_config();
        let db_config = config.to_db_config();

        let repo = Arc::new(SqliteRepo::connect(&db_config).await?);
        repo.ensure_schema().await?;
        info!("attendance store ready at {}", db_config.database_url);

        let state = AppState {
            config: runtime_config,
            attendance_repo: repo.clone(),
            event_repo: repo.clone(),
            student_directory: repo.clone(),
            organizer_directory: repo,
            scan_notifier: Arc::new(WebhookScanNotifier::new()),
            last_scans: Arc::new(RwLock::new(HashMap::new())),
            checkin_stream_hub: Arc::new(CheckInStreamHub::default()),
            metrics: Arc::new(Metrics::default()),
        };

        Ok(Self { state })
    }
}
