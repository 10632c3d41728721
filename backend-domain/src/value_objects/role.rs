// Account role value object

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Organizer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Organizer => "organizer",
            Role::Admin => "admin",
        }
    }

    /// Strict form for input; `None` for anything that is not a known role.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "student" => Some(Role::Student),
            "organizer" => Some(Role::Organizer),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn can_scan(&self) -> bool {
        matches!(self, Role::Organizer | Role::Admin)
    }
}

/// Lenient form for stored rows: unknown values get the least privilege.
impl From<&str> for Role {
    fn from(s: &str) -> Self {
        Role::parse(s).unwrap_or(Role::Student)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_roles_fall_back_to_student() {
        assert_eq!(Role::from(" ORGANIZER "), Role::Organizer);
        assert_eq!(Role::from("admin"), Role::Admin);
        assert_eq!(Role::from("guest"), Role::Student);
    }

    #[test]
    fn strict_parse_rejects_misspellings() {
        assert_eq!(Role::parse(" Admin"), Some(Role::Admin));
        assert_eq!(Role::parse("student"), Some(Role::Student));
        assert_eq!(Role::parse("organiser"), None);
    }

    #[test]
    fn only_staff_roles_scan() {
        assert!(Role::Organizer.can_scan());
        assert!(Role::Admin.can_scan());
        assert!(!Role::Student.can_scan());
    }
}
