//! `pocketshop-events`: change notifications for in-memory state.
//!
//! Domain code emits events describing what changed; the presentation layer
//! subscribes and re-renders from a fresh snapshot.

pub mod bus;
pub mod event;
pub mod handler;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use event::Event;
pub use handler::execute;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
