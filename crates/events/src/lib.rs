//! Event system for autoblog
//!
//! This crate provides the event bus and event types through which pipeline
//! runs report lifecycle changes and progress to observers.

mod bus;
mod types;

pub use bus::{EventBus, RunSubscription};
pub use types::*;
