pub mod bus;
pub mod types;

// Re-export key types for convenience
pub use bus::{EventBus, EventBusConfig, EventBusStats, InMemoryEventBus, InMemoryEventBusBuilder};
pub use types::{
    event_handler, BusEvent, EventBusError, EventHandler, EventHandlerError, EventPayload,
};
