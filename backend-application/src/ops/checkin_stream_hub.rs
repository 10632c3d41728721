use std::collections::HashMap;

use backend_domain::AttendanceRecord;
use tokio::sync::{broadcast, RwLock};

const CHANNEL_BUFFER: usize = 64;

/// Live check-in feed, one broadcast channel per event.
#[derive(Default)]
pub struct CheckInStreamHub {
    channels: RwLock<HashMap<String, broadcast::Sender<AttendanceRecord>>>,
}

impl CheckInStreamHub {
    pub async fn subscribe(&self, event_id: &str) -> broadcast::Receiver<AttendanceRecord> {
        let mut channels = self.channels.write().await;
        channels
            .entry(event_id.trim().to_string())
            .or_insert_with(|| {
                let (tx, _rx) = broadcast::channel(CHANNEL_BUFFER);
                tx
            })
            .subscribe()
    }

    pub async fn publish(&self, record: &AttendanceRecord) {
        let channels = self.channels.read().await;
        // No subscribers yet means nobody is watching this event.
        if let Some(tx) = channels.get(record.event_id.trim()) {
            let _ = tx.send(record.clone());
        }
    }

    /// Drops the channel once an event is gone; open receivers see `Closed`.
    pub async fn close(&self, event_id: &str) {
        self.channels.write().await.remove(event_id.trim());
    }
}
