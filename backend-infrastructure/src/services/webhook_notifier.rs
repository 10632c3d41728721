use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use backend_domain::ports::ScanNotifier;
use backend_domain::{AttendanceRecord, RuntimeConfig};

use crate::utils::millis_to_rfc3339;

#[derive(Default)]
pub struct WebhookScanNotifier;

impl WebhookScanNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl ScanNotifier for WebhookScanNotifier {
    fn spawn_notice(&self, config: RuntimeConfig, record: AttendanceRecord) {
        let Some(url) = config.scan_webhook_url.clone() else {
            return;
        };
        tokio::spawn(async move {
            match send_notice(&config, &url, &record).await {
                Ok(()) => debug!(
                    "scan webhook delivered: event={}, student={}",
                    record.event_id, record.student_number
                ),
                Err(err) => warn!("scan webhook failed: {}", err),
            }
        });
    }
}

async fn send_notice(config: &RuntimeConfig, url: &str, record: &AttendanceRecord) -> Result<()> {
    let client = Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_seconds.max(3)))
        .build()?;
    client
        .post(url)
        .json(&build_payload(record))
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}

fn build_payload(record: &AttendanceRecord) -> Value {
    json!({
        "type": "check_in",
        "event_id": record.event_id,
        "student_number": record.student_number,
        "student_name": record.student_name,
        "operator_id": record.operator_id,
        "operator_name": record.operator_name,
        "scanned_at": record.scanned_at,
        "scanned_at_rfc3339": millis_to_rfc3339(record.scanned_at),
        "first_scan": record.scan_count == 1,
        "scan_count": record.scan_count,
    })
}
