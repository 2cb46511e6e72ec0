//! Prioritized event channel

use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tessera_core::{observe, Result};

/// Receives events posted on an [`EventBus`]
pub trait Listener<E>: Send + Sync {
    /// Handle one event
    ///
    /// Returning an error does not stop delivery to the remaining listeners;
    /// the poster is told about the first failure.
    fn on_event(&self, event: &E) -> Result<()>;
}

struct FnListener<F>(F);

impl<E, F> Listener<E> for FnListener<F>
where
    F: Fn(&E) -> Result<()> + Send + Sync,
{
    fn on_event(&self, event: &E) -> Result<()> {
        (self.0)(event)
    }
}

/// Something listeners can be attached to
///
/// Storage backends use this to register themselves on the datastore they
/// persist for.
pub trait EventSource<E> {
    fn register_listener(&self, listener: Arc<dyn Listener<E>>, priority: i32) -> ListenerId;
}

/// Handle returned by registration, used to unregister
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Registration<E> {
    id: ListenerId,
    priority: i32,
    listener: Arc<dyn Listener<E>>,
}

/// Synchronous publish/subscribe channel
///
/// Listeners are notified in ascending priority order; listeners sharing a
/// priority are notified in registration order. Delivery happens on the
/// posting thread with no lock held, so listeners may register, unregister,
/// or post from inside a callback.
pub struct EventBus<E> {
    listeners: RwLock<Vec<Registration<E>>>,
    next_id: AtomicU64,
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register a listener at `priority`
    pub fn register(&self, listener: Arc<dyn Listener<E>>, priority: i32) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut listeners = self.listeners.write();
        let slot = listeners
            .iter()
            .position(|r| r.priority > priority)
            .unwrap_or(listeners.len());
        listeners.insert(
            slot,
            Registration {
                id,
                priority,
                listener,
            },
        );
        id
    }

    /// Register a closure at `priority`
    pub fn register_fn<F>(&self, f: F, priority: i32) -> ListenerId
    where
        F: Fn(&E) -> Result<()> + Send + Sync + 'static,
        E: 'static,
    {
        self.register(Arc::new(FnListener(f)), priority)
    }

    /// Remove a listener; returns false if it was not registered
    pub fn unregister(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|r| r.id != id);
        listeners.len() != before
    }

    /// Deliver `event` to every listener
    pub fn post(&self, event: &E) -> Result<()> {
        let snapshot: Vec<(ListenerId, Arc<dyn Listener<E>>)> = self
            .listeners
            .read()
            .iter()
            .map(|r| (r.id, r.listener.clone()))
            .collect();

        let mut first_failure = None;
        for (id, listener) in snapshot {
            if let Err(e) = listener.on_event(event) {
                tracing::warn!("Listener {:?} failed to handle event: {}", id, e);
                observe::record_listener_failure();
                if first_failure.is_none() {
                    first_failure = Some(e);
                }
            }
        }

        match first_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }
}

impl<E> EventSource<E> for EventBus<E> {
    fn register_listener(&self, listener: Arc<dyn Listener<E>>, priority: i32) -> ListenerId {
        self.register(listener, priority)
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.len())
            .finish()
    }
}
