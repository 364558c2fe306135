//! Progress events for pipeline runs.

pub mod bus;
pub mod types;

pub use bus::EventBus;
pub use types::{Event, EventEnvelope};
