use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    scans: AtomicU64,
    codes_rejected: AtomicU64,
    checkins_recorded: AtomicU64,
    checkins_failed: AtomicU64,
    name_fallbacks: AtomicU64,
}

impl Metrics {
    pub fn record_scan(&self) {
        self.scans.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected_code(&self) {
        self.codes_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_checkin(&self) {
        self.checkins_recorded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_checkin_error(&self) {
        self.checkins_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_name_fallback(&self) {
        self.name_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn checkins_recorded(&self) -> u64 {
        self.checkins_recorded.load(Ordering::Relaxed)
    }

    pub fn render_prometheus(&self) -> String {
        let scans = self.scans.load(Ordering::Relaxed);
        let rejected = self.codes_rejected.load(Ordering::Relaxed);
        let recorded = self.checkins_recorded.load(Ordering::Relaxed);
        let failed = self.checkins_failed.load(Ordering::Relaxed);
        let fallbacks = self.name_fallbacks.load(Ordering::Relaxed);

        format!(
            "# TYPE campus_scans_total counter\n\
campus_scans_total {}\n\
# TYPE campus_scan_codes_rejected_total counter\n\
campus_scan_codes_rejected_total {}\n\
# TYPE campus_checkins_recorded_total counter\n\
campus_checkins_recorded_total {}\n\
# TYPE campus_checkins_failed_total counter\n\
campus_checkins_failed_total {}\n\
# TYPE campus_name_fallbacks_total counter\n\
campus_name_fallbacks_total {}\n",
            scans, rejected, recorded, failed, fallbacks
        )
    }
}
