pub mod checkin_commands;
pub mod directory_commands;
pub mod event_commands;
