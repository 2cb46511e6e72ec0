//! # Tessera Bus
//!
//! Prioritized publish/subscribe for datastore notifications.
//!
//! The bus provides:
//! - Listeners registered at an integer priority (lower values are notified first)
//! - Synchronous, in-order delivery on the posting thread
//! - Failure reporting: every listener sees the event, the first failure is returned
//! - An explicit process-scope [`EventManager`] handle for global events
//!
//! ## Example
//!
//! ```rust
//! use tessera_bus::{DatastoreEvent, EventBus};
//!
//! # fn main() -> tessera_core::Result<()> {
//! let bus: EventBus<DatastoreEvent> = EventBus::new();
//! let id = bus.register_fn(
//!     |event: &DatastoreEvent| {
//!         println!("got {}", event.kind());
//!         Ok(())
//!     },
//!     100,
//! );
//!
//! bus.post(&DatastoreEvent::Frozen)?;
//! bus.unregister(id);
//! # Ok(())
//! # }
//! ```

pub mod bus;
pub mod event;
pub mod manager;

pub use bus::{EventBus, EventSource, Listener, ListenerId};
pub use event::{DatastoreEvent, DatastoreId, GlobalEvent};
pub use manager::EventManager;
