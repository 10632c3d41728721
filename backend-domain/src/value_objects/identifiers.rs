// Identifier value objects

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on any identifier accepted from a scan or a path segment.
pub const MAX_IDENTIFIER_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("{0} exceeds {MAX_IDENTIFIER_LEN} characters")]
    TooLong(&'static str),
    #[error("{0} contains unreadable characters")]
    Unreadable(&'static str),
}

fn normalize(raw: &str, field: &'static str) -> Result<String, IdentifierError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(IdentifierError::Empty(field));
    }
    if trimmed.chars().count() > MAX_IDENTIFIER_LEN {
        return Err(IdentifierError::TooLong(field));
    }
    // U+FFFD is what a lossy decode leaves behind for bytes that were not UTF-8.
    if trimmed
        .chars()
        .any(|c| c.is_control() || c == char::REPLACEMENT_CHARACTER)
    {
        return Err(IdentifierError::Unreadable(field));
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        normalize(raw, "event_id").map(Self)
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Business key printed on a student card and encoded in its QR code.
/// Distinct from the student's account id; no format is imposed beyond
/// being non-empty, printable text after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentNumber(String);

impl StudentNumber {
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        normalize(raw, "student_number").map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Authenticated account id of the organizer operating a scanner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperatorId(String);

impl OperatorId {
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        normalize(raw, "operator_id").map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for StudentNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
