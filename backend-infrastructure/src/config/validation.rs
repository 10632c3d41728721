use anyhow::{anyhow, Result};

pub fn validate_database_url(value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(anyhow!("database_url is empty"));
    }
    if !value.starts_with("sqlite:") {
        return Err(anyhow!("database_url must be a sqlite: url"));
    }
    Ok(())
}
