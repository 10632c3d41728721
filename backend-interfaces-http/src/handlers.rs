pub mod attendance_handlers;
pub mod directory_handlers;
pub mod event_handlers;
pub mod ops_handlers;

pub use attendance_handlers::*;
pub use directory_handlers::*;
pub use event_handlers::*;
pub use ops_handlers::*;
