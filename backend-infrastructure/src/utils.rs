use chrono::{TimeZone, Utc};

pub fn millis_to_rfc3339(ms: i64) -> String {
    Utc.timestamp_millis_opt(ms)
        .single()
        .unwrap_or_else(Utc::now)
        .to_rfc3339()
}

pub fn is_memory_database(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}
