pub mod webhook_notifier;

pub use webhook_notifier::*;
