//! Memory-only storage

use crate::index::{forward_storage, ImageIndex};
use std::sync::Arc;
use tessera_bus::{DatastoreEvent, EventSource, Listener};
use tessera_core::{Result, STORAGE_LISTENER_PRIORITY};

/// Keeps every image in memory for the lifetime of the datastore
pub struct RamStorage {
    index: ImageIndex,
}

impl RamStorage {
    /// Create a storage that persists everything posted on `target`
    pub fn new<S>(target: &S) -> Arc<Self>
    where
        S: EventSource<DatastoreEvent> + ?Sized,
    {
        let storage = Arc::new(Self {
            index: ImageIndex::new(),
        });
        target.register_listener(storage.clone(), STORAGE_LISTENER_PRIORITY);
        storage
    }
}

impl Listener<DatastoreEvent> for RamStorage {
    fn on_event(&self, event: &DatastoreEvent) -> Result<()> {
        match event {
            DatastoreEvent::NewImage { image, .. } => self.index.put(image.clone()),
            DatastoreEvent::NewSummaryMetadata(summary) => {
                self.index.set_summary_metadata(summary.clone())
            }
            DatastoreEvent::Frozen | DatastoreEvent::Saved(_) => {}
        }
        Ok(())
    }
}

forward_storage!(RamStorage, index);
