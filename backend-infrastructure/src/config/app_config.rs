use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tokio::fs;

use backend_domain::{DbConfig, RuntimeConfig};

use crate::config::validation::validate_database_url;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub database_url: String,
    pub database_max_connections: u32,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
    pub cascade_attendance_on_event_delete: bool,
    pub scan_webhook_url: Option<String>,
    pub log_dir: Option<String>,
    pub log_json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3234".to_string(),
            api_token: None,
            database_url: "sqlite://./campus.db".to_string(),
            database_max_connections: 5,
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 15,
            cascade_attendance_on_event_delete: true,
            scan_webhook_url: None,
            log_dir: None,
            log_json: false,
        }
    }
}

impl AppConfig {
    pub fn config_path() -> PathBuf {
        PathBuf::from(env::var("CAMPUS_CONFIG").unwrap_or_else(|_| "./config.toml".to_string()))
    }

    pub async fn load() -> Result<Self> {
        let path = Self::config_path();
        let base_dir = path.parent();
        let mut config = if path.exists() {
            let content = fs::read_to_string(&path).await?;
            Self::from_toml(&content)?
        } else {
            AppConfig::default()
        };
        config.apply_env_overrides();
        config.resolve_paths(base_dir);
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|err| anyhow!("invalid config: {}", err))
    }

    pub fn normalize(&mut self) {
        if let Some(api_token) = &self.api_token {
            if api_token.trim().is_empty() {
                self.api_token = None;
            }
        }
        if let Some(url) = &self.scan_webhook_url {
            if url.trim().is_empty() {
                self.scan_webhook_url = None;
            }
        }
        if let Some(dir) = &self.log_dir {
            if dir.trim().is_empty() {
                self.log_dir = None;
            }
        }
        self.database_url = self.database_url.trim().to_string();
        if self.database_max_connections == 0 {
            self.database_max_connections = 1;
        }
    }

    fn resolve_paths(&mut self, base_dir: Option<&Path>) {
        let Some(base) = base_dir else {
            return;
        };
        self.database_url = resolve_sqlite_url(base, &self.database_url);
        if let Some(dir) = &self.log_dir {
            self.log_dir = Some(resolve_path(base, dir));
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| anyhow!("invalid bind_addr: {}", err))?;
        validate_database_url(&self.database_url)?;
        if self.max_body_bytes == 0 {
            return Err(anyhow!("max_body_bytes must be greater than 0"));
        }
        if self.request_timeout_seconds == 0 {
            return Err(anyhow!("request_timeout_seconds must be greater than 0"));
        }
        if let Some(url) = &self.scan_webhook_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(anyhow!("scan_webhook_url must be an http(s) url"));
            }
        }
        Ok(())
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            api_token: self.api_token.clone(),
            max_body_bytes: self.max_body_bytes,
            request_timeout_seconds: self.request_timeout_seconds,
            cascade_attendance_on_event_delete: self.cascade_attendance_on_event_delete,
            scan_webhook_url: self.scan_webhook_url.clone(),
        }
    }

    pub fn to_db_config(&self) -> DbConfig {
        DbConfig {
            database_url: self.database_url.clone(),
            max_connections: self.database_max_connections,
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("CAMPUS_BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Ok(value) = env::var("CAMPUS_API_TOKEN") {
            self.api_token = Some(value);
        }
        if let Ok(value) = env::var("CAMPUS_DATABASE_URL") {
            self.database_url = value;
        }
        if let Ok(value) = env::var("CAMPUS_DATABASE_MAX_CONNECTIONS") {
            self.database_max_connections = value.parse().unwrap_or(self.database_max_connections);
        }
        if let Ok(value) = env::var("CAMPUS_MAX_BODY_BYTES") {
            self.max_body_bytes = value.parse().unwrap_or(self.max_body_bytes);
        }
        if let Ok(value) = env::var("CAMPUS_REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = value.parse().unwrap_or(self.request_timeout_seconds);
        }
        if let Ok(value) = env::var("CAMPUS_CASCADE_ATTENDANCE_ON_EVENT_DELETE") {
            self.cascade_attendance_on_event_delete =
                value.parse().unwrap_or(self.cascade_attendance_on_event_delete);
        }
        if let Ok(value) = env::var("CAMPUS_SCAN_WEBHOOK_URL") {
            self.scan_webhook_url = Some(value);
        }
        if let Ok(value) = env::var("CAMPUS_LOG_DIR") {
            self.log_dir = Some(value);
        }
        if let Ok(value) = env::var("CAMPUS_LOG_JSON") {
            self.log_json = value.parse().unwrap_or(self.log_json);
        }
    }
}

fn resolve_path(base: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        trimmed.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}

/// Relative sqlite file urls are taken relative to the config file.
fn resolve_sqlite_url(base: &Path, url: &str) -> String {
    let trimmed = url.trim();
    if crate::utils::is_memory_database(trimmed) || base.as_os_str().is_empty() {
        return trimmed.to_string();
    }
    let Some(rest) = trimmed.strip_prefix("sqlite://") else {
        return trimmed.to_string();
    };
    let (file, query) = match rest.split_once('?') {
        Some((file, query)) => (file, Some(query)),
        None => (rest, None),
    };
    let resolved = resolve_path(base, file);
    match query {
        Some(query) => format!("sqlite://{}?{}", resolved, query),
        None => format!("sqlite://{}", resolved),
    }
}
