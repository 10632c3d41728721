// Domain value objects
pub mod identifiers;
pub mod role;

pub use identifiers::*;
pub use role::*;
