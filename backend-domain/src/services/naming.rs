// Display-name resolution with literal fallbacks
// A missing or failed lookup never aborts a check-in or a listing.

use crate::entities::{OrganizerIdentity, StudentIdentity};

pub const UNKNOWN_NAME: &str = "Unknown";
pub const UNKNOWN_EVENT: &str = "Unknown Event";

/// First match wins; the directory does not enforce unique student numbers.
pub fn student_display_name(matches: &[StudentIdentity]) -> Option<String> {
    matches.first().and_then(StudentIdentity::display_name)
}

pub fn organizer_display_name(organizer: Option<&OrganizerIdentity>) -> Option<String> {
    organizer
        .map(|item| item.display_name.trim())
        .filter(|name| !name.is_empty())
        .map(ToString::to_string)
}

pub fn name_or_unknown(name: Option<String>) -> String {
    name.unwrap_or_else(|| UNKNOWN_NAME.to_string())
}
