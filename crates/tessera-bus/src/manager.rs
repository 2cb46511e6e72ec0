//! Process-scope event channel
//!
//! There is no hidden singleton: the application creates one
//! [`EventManager`] for its session and hands clones of it to every datastore.

use crate::bus::{EventBus, Listener, ListenerId};
use crate::event::GlobalEvent;
use std::sync::Arc;
use tessera_core::Result;

/// Cloneable handle to the session-wide channel
#[derive(Debug, Clone, Default)]
pub struct EventManager {
    bus: Arc<EventBus<GlobalEvent>>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, listener: Arc<dyn Listener<GlobalEvent>>, priority: i32) -> ListenerId {
        self.bus.register(listener, priority)
    }

    pub fn register_fn<F>(&self, f: F, priority: i32) -> ListenerId
    where
        F: Fn(&GlobalEvent) -> Result<()> + Send + Sync + 'static,
    {
        self.bus.register_fn(f, priority)
    }

    pub fn unregister(&self, id: ListenerId) -> bool {
        self.bus.unregister(id)
    }

    pub fn post(&self, event: GlobalEvent) -> Result<()> {
        self.bus.post(&event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::DatastoreId;
    use parking_lot::Mutex;

    #[test]
    fn test_clones_share_listeners() {
        let manager = EventManager::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        manager.register_fn(
            move |event| {
                sink.lock().push(event.clone());
                Ok(())
            },
            100,
        );

        let source = DatastoreId::next();
        manager
            .clone()
            .post(GlobalEvent::DatastoreClosing { source })
            .unwrap();

        assert_eq!(*seen.lock(), vec![GlobalEvent::DatastoreClosing { source }]);
    }
}
