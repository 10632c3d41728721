// Domain services
pub mod naming;

pub use naming::*;
