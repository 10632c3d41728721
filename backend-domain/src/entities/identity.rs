// Identity entities
// Read-only collaborators of the attendance workflow

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::value_objects::Role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct StudentIdentity {
    /// Account id, not the scanned business key.
    pub id: String,
    pub student_number: String,
    pub first_name: String,
    pub last_name: String,
}

impl StudentIdentity {
    pub fn display_name(&self) -> Option<String> {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            None
        } else {
            Some(full.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct OrganizerIdentity {
    pub id: String,
    pub display_name: String,
    pub role: String,
}

impl OrganizerIdentity {
    pub fn role(&self) -> Role {
        Role::from(self.role.as_str())
    }
}
