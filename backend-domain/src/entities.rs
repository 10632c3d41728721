// Domain entities
pub mod attendance;
pub mod event;
pub mod identity;
pub mod model;
pub mod scan;

pub use attendance::*;
pub use event::*;
pub use identity::*;
pub use model::*;
pub use scan::*;
