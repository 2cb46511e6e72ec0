//! The datastore orchestrator
//!
//! Ties a storage backend, an event channel, and lifecycle state together.
//!
//! # Threading
//!
//! A datastore is meant to have one logical owner. Its fields are guarded
//! for memory safety, so listeners may call back into it, but nothing orders
//! concurrent mutations from different threads. Callers that share a
//! datastore across threads must serialize `put_image`, `set_summary_metadata`
//! and `freeze` themselves.

use parking_lot::RwLock;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tessera_bus::{
    DatastoreEvent, DatastoreId, EventBus, EventManager, EventSource, GlobalEvent, Listener,
    ListenerId,
};
use tessera_core::{
    observe, Coords, DatastoreConfig, Image, Result, Storage, SummaryMetadata, TesseraError,
};
use tessera_store::RamStorage;

/// Image datastore
///
/// Created unbound; a storage backend is attached with [`set_storage`].
/// Reads on an unbound datastore return `None`, never an error.
///
/// [`set_storage`]: Datastore::set_storage
pub struct Datastore {
    id: DatastoreId,
    storage: RwLock<Option<Arc<dyn Storage>>>,
    bus: EventBus<DatastoreEvent>,
    frozen: AtomicBool,
    save_path: RwLock<Option<PathBuf>>,
    events: EventManager,
    config: DatastoreConfig,
}

impl Datastore {
    /// Create an unbound datastore
    ///
    /// `events` is the session-wide channel that receives the closing event.
    pub fn new(events: EventManager) -> Self {
        Self::with_config(events, DatastoreConfig::default())
    }

    pub fn with_config(events: EventManager, config: DatastoreConfig) -> Self {
        Self {
            id: DatastoreId::next(),
            storage: RwLock::new(None),
            bus: EventBus::new(),
            frozen: AtomicBool::new(false),
            save_path: RwLock::new(None),
            events,
            config,
        }
    }

    /// Create a datastore bound to a fresh [`RamStorage`]
    pub fn new_in_memory(events: EventManager) -> Self {
        let store = Self::new(events);
        let storage = RamStorage::new(&store);
        store.set_storage(storage);
        store
    }

    pub fn id(&self) -> DatastoreId {
        self.id
    }

    pub fn config(&self) -> &DatastoreConfig {
        &self.config
    }

    pub fn event_manager(&self) -> &EventManager {
        &self.events
    }

    /// Replace the storage backend
    ///
    /// No validation and no notification; allowed even after freezing.
    pub fn set_storage(&self, storage: Arc<dyn Storage>) {
        *self.storage.write() = Some(storage);
    }

    fn storage(&self) -> Option<Arc<dyn Storage>> {
        self.storage.read().clone()
    }

    // ---------------------------------------------------------------------
    // Events
    // ---------------------------------------------------------------------

    /// Register a listener at the configured default priority
    pub fn register_for_events(&self, listener: Arc<dyn Listener<DatastoreEvent>>) -> ListenerId {
        self.bus.register(listener, self.config.default_priority)
    }

    /// Register a listener; lower priorities are notified first
    pub fn register_for_events_with_priority(
        &self,
        listener: Arc<dyn Listener<DatastoreEvent>>,
        priority: i32,
    ) -> ListenerId {
        self.bus.register(listener, priority)
    }

    /// Register a closure at the configured default priority
    pub fn register_fn<F>(&self, f: F) -> ListenerId
    where
        F: Fn(&DatastoreEvent) -> Result<()> + Send + Sync + 'static,
    {
        self.bus.register_fn(f, self.config.default_priority)
    }

    pub fn unregister_for_events(&self, id: ListenerId) -> bool {
        self.bus.unregister(id)
    }

    /// Post an arbitrary event to this datastore's listeners
    pub fn publish_event(&self, event: DatastoreEvent) -> Result<()> {
        self.bus.post(&event)
    }

    // ---------------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------------

    /// Validate an image and announce it to the storage and other listeners
    ///
    /// Fails with [`TesseraError::Frozen`] after [`freeze`](Self::freeze),
    /// with [`TesseraError::InvalidState`] if the bound storage is read-only,
    /// and with [`TesseraError::InvalidAxis`] if the image uses an axis the
    /// storage does not know. None of these failures posts anything.
    ///
    /// After the image is announced, any of its axes with a non-zero index
    /// that the summary metadata's axis order does not list yet is appended,
    /// and the extended summary metadata is posted.
    pub fn put_image(&self, image: Image) -> Result<()> {
        let our_axes = self.get_axes();
        self.put_image_within(image, our_axes.as_deref())
    }

    /// Put an image whose axes are checked against `allowed` rather than
    /// against what this datastore's storage has seen so far
    ///
    /// Used when copying into a fresh datastore, whose storage learns axes
    /// one image at a time.
    pub(crate) fn put_image_within(&self, image: Image, allowed: Option<&[String]>) -> Result<()> {
        self.ensure_mutable()?;

        if let Some(allowed) = allowed.filter(|axes| !axes.is_empty()) {
            let unknown = image
                .coords()
                .axes()
                .find(|axis| !allowed.iter().any(|ours| ours == axis));
            if let Some(axis) = unknown {
                return Err(TesseraError::InvalidAxis {
                    axis: axis.to_string(),
                    allowed: allowed.to_vec(),
                });
            }
        }

        // Axis order as it was before this image; no summary means no storage
        let summary = self.get_summary_metadata();
        let tracked: Option<Vec<String>> = summary
            .as_ref()
            .map(|s| s.axis_order().map(<[String]>::to_vec).unwrap_or_default());

        let coords = image.coords().clone();
        self.bus.post(&DatastoreEvent::NewImage {
            image,
            source: self.id,
        })?;
        observe::record_image_accepted();

        if let (Some(summary), Some(mut order)) = (summary, tracked) {
            let before = order.len();
            for (axis, index) in coords.iter() {
                if index > 0 && !order.iter().any(|known| known == axis) {
                    order.push(axis.to_string());
                }
            }
            if order.len() > before {
                tracing::debug!("{} axis order is now {:?}", self.id, order);
                self.set_summary_metadata(summary.copy().axis_order(order).build())?;
            }
        }

        Ok(())
    }

    /// Announce replacement summary metadata
    pub fn set_summary_metadata(&self, metadata: SummaryMetadata) -> Result<()> {
        self.ensure_mutable()?;
        self.bus.post(&DatastoreEvent::NewSummaryMetadata(metadata))
    }

    /// Refuse all further mutation
    ///
    /// Listeners are notified before the flag flips, so a listener that
    /// checks [`is_frozen`](Self::is_frozen) while handling the event still
    /// sees `false`. The flag is set even if a listener fails.
    pub fn freeze(&self) -> Result<()> {
        let delivered = self.bus.post(&DatastoreEvent::Frozen);
        self.frozen.store(true, Ordering::SeqCst);
        delivered
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::SeqCst)
    }

    fn ensure_mutable(&self) -> Result<()> {
        if self.is_frozen() {
            observe::record_frozen_rejection();
            return Err(TesseraError::Frozen);
        }
        if let Some(storage) = self.storage() {
            if !storage.is_writable() {
                return Err(TesseraError::InvalidState(format!(
                    "{} is bound to a read-only storage",
                    self.id
                )));
            }
        }
        Ok(())
    }

    /// Tell the session that this datastore is done
    ///
    /// Local state is unchanged; the datastore should be dropped afterwards.
    pub fn close(&self) -> Result<()> {
        self.events
            .post(GlobalEvent::DatastoreClosing { source: self.id })
    }

    /// Record where this datastore was saved and announce it
    pub fn set_save_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref().to_path_buf();
        *self.save_path.write() = Some(path.clone());
        self.bus.post(&DatastoreEvent::Saved(path))
    }

    pub fn save_path(&self) -> Option<PathBuf> {
        self.save_path.read().clone()
    }

    /// Copy the summary metadata and every image of `other` into this datastore
    pub fn copy_from(&self, other: &Datastore) -> Result<()> {
        let result = self.copy_contents(other);
        if let Err(e) = &result {
            tracing::error!("Failed to copy {} into {}: {}", other.id, self.id, e);
        }
        result
    }

    fn copy_contents(&self, other: &Datastore) -> Result<()> {
        if let Some(summary) = other.get_summary_metadata() {
            self.set_summary_metadata(summary)?;
        }
        for coords in other.get_unordered_image_coords().unwrap_or_default() {
            if let Some(image) = other.get_image(&coords) {
                self.put_image(image)?;
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    pub fn get_image(&self, coords: &Coords) -> Option<Image> {
        self.storage()?.get_image(coords)
    }

    pub fn get_any_image(&self) -> Option<Image> {
        self.storage()?.get_any_image()
    }

    pub fn get_images_matching(&self, coords: &Coords) -> Option<Vec<Image>> {
        Some(self.storage()?.get_images_matching(coords))
    }

    pub fn get_unordered_image_coords(&self) -> Option<Vec<Coords>> {
        Some(self.storage()?.get_unordered_image_coords())
    }

    /// Largest index seen along `axis`; -1 if unseen or unbound
    pub fn get_max_index(&self, axis: &str) -> i64 {
        self.storage().map_or(-1, |s| s.get_max_index(axis))
    }

    /// One more than [`get_max_index`](Self::get_max_index); 0 for an unseen axis
    pub fn get_axis_length(&self, axis: &str) -> usize {
        usize::try_from(self.get_max_index(axis) + 1).unwrap_or(0)
    }

    pub fn get_axes(&self) -> Option<Vec<String>> {
        Some(self.storage()?.get_axes())
    }

    pub fn get_max_indices(&self) -> Option<Coords> {
        Some(self.storage()?.get_max_indices())
    }

    pub fn get_num_images(&self) -> Option<usize> {
        Some(self.storage()?.get_num_images())
    }

    /// Summary metadata; an empty record if the storage holds none yet
    pub fn get_summary_metadata(&self) -> Option<SummaryMetadata> {
        Some(self.storage()?.get_summary_metadata().unwrap_or_default())
    }
}

impl EventSource<DatastoreEvent> for Datastore {
    fn register_listener(
        &self,
        listener: Arc<dyn Listener<DatastoreEvent>>,
        priority: i32,
    ) -> ListenerId {
        self.bus.register(listener, priority)
    }
}

impl fmt::Debug for Datastore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Datastore")
            .field("id", &self.id)
            .field("bound", &self.storage.read().is_some())
            .field("frozen", &self.is_frozen())
            .field("save_path", &self.save_path())
            .field("listeners", &self.bus.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn image(coords: Coords) -> Image {
        Image::new(coords, 1, 1, 1, vec![0u8])
    }

    fn record_kinds(store: &Datastore) -> Arc<Mutex<Vec<&'static str>>> {
        let kinds = Arc::new(Mutex::new(Vec::new()));
        let sink = kinds.clone();
        store.register_fn(move |event| {
            sink.lock().push(event.kind());
            Ok(())
        });
        kinds
    }

    #[test]
    fn test_unbound_reads() {
        let store = Datastore::new(EventManager::new());
        let coords = Coords::builder().time(0).build();

        assert!(store.get_image(&coords).is_none());
        assert!(store.get_any_image().is_none());
        assert!(store.get_images_matching(&coords).is_none());
        assert!(store.get_unordered_image_coords().is_none());
        assert!(store.get_axes().is_none());
        assert!(store.get_max_indices().is_none());
        assert!(store.get_num_images().is_none());
        assert!(store.get_summary_metadata().is_none());
        assert_eq!(store.get_max_index("time"), -1);
        assert_eq!(store.get_axis_length("time"), 0);
        assert!(!store.is_frozen());
        assert!(store.save_path().is_none());
    }

    #[test]
    fn test_unbound_put_skips_axis_tracking() {
        let store = Datastore::new(EventManager::new());
        let kinds = record_kinds(&store);

        store
            .put_image(image(Coords::builder().time(3).build()))
            .unwrap();
        assert_eq!(*kinds.lock(), vec!["new_image"]);
    }

    #[test]
    fn test_bound_empty_summary_is_default() {
        let store = Datastore::new_in_memory(EventManager::new());
        assert_eq!(store.get_summary_metadata(), Some(SummaryMetadata::default()));
        assert_eq!(store.get_num_images(), Some(0));
        assert_eq!(store.get_axes(), Some(Vec::new()));
    }

    #[test]
    fn test_new_image_precedes_axis_order_update() {
        let store = Datastore::new_in_memory(EventManager::new());
        let kinds = record_kinds(&store);

        store
            .put_image(image(Coords::builder().time(0).channel(2).build()))
            .unwrap();

        assert_eq!(*kinds.lock(), vec!["new_image", "new_summary_metadata"]);
    }

    #[test]
    fn test_new_axes_from_one_put_share_one_update() {
        let store = Datastore::new_in_memory(EventManager::new());
        let kinds = record_kinds(&store);

        store
            .put_image(image(Coords::builder().z(1).channel(2).build()))
            .unwrap();

        assert_eq!(*kinds.lock(), vec!["new_image", "new_summary_metadata"]);
        let summary = store.get_summary_metadata().unwrap();
        assert_eq!(summary.axis_order().unwrap(), ["z", "channel"]);
    }

    #[test]
    fn test_zero_indices_do_not_extend_axis_order() {
        let store = Datastore::new_in_memory(EventManager::new());
        let kinds = record_kinds(&store);

        store
            .put_image(image(Coords::builder().time(0).channel(0).build()))
            .unwrap();

        assert_eq!(*kinds.lock(), vec!["new_image"]);
        assert!(store
            .get_summary_metadata()
            .unwrap()
            .axis_order()
            .is_none());
    }

    #[test]
    fn test_invalid_axis_rejected_without_events() {
        let store = Datastore::new_in_memory(EventManager::new());
        store
            .put_image(image(Coords::builder().time(0).stage_position(0).build()))
            .unwrap();
        let kinds = record_kinds(&store);

        let err = store
            .put_image(image(Coords::builder().time(1).z(0).build()))
            .unwrap_err();

        match err {
            TesseraError::InvalidAxis { axis, allowed } => {
                assert_eq!(axis, "z");
                assert_eq!(allowed, vec!["time", "position"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(kinds.lock().is_empty());
        assert_eq!(store.get_num_images(), Some(1));
    }

    #[test]
    fn test_subset_of_known_axes_is_accepted() {
        let store = Datastore::new_in_memory(EventManager::new());
        store
            .put_image(image(Coords::builder().time(0).stage_position(0).build()))
            .unwrap();
        store
            .put_image(image(Coords::builder().time(1).build()))
            .unwrap();
        assert_eq!(store.get_num_images(), Some(2));
    }

    #[test]
    fn test_frozen_rejects_mutation_without_events() {
        let store = Datastore::new_in_memory(EventManager::new());
        store.freeze().unwrap();
        let kinds = record_kinds(&store);

        assert!(matches!(
            store.put_image(image(Coords::builder().time(1).build())),
            Err(TesseraError::Frozen)
        ));
        assert!(matches!(
            store.set_summary_metadata(SummaryMetadata::default()),
            Err(TesseraError::Frozen)
        ));
        assert!(kinds.lock().is_empty());
        assert_eq!(store.get_num_images(), Some(0));
    }

    #[test]
    fn test_freeze_twice_posts_twice() {
        let store = Datastore::new_in_memory(EventManager::new());
        let kinds = record_kinds(&store);

        store.freeze().unwrap();
        store.freeze().unwrap();

        assert!(store.is_frozen());
        assert_eq!(*kinds.lock(), vec!["frozen", "frozen"]);
    }

    #[test]
    fn test_freeze_listener_sees_unfrozen_flag() {
        let store = Arc::new(Datastore::new_in_memory(EventManager::new()));
        let observed = Arc::new(Mutex::new(None));

        let weak = Arc::downgrade(&store);
        let sink = observed.clone();
        store.register_fn(move |event| {
            if let (DatastoreEvent::Frozen, Some(store)) = (event, weak.upgrade()) {
                *sink.lock() = Some(store.is_frozen());
            }
            Ok(())
        });

        store.freeze().unwrap();
        assert_eq!(*observed.lock(), Some(false));
        assert!(store.is_frozen());
    }

    #[test]
    fn test_freeze_sets_flag_even_if_listener_fails() {
        let store = Datastore::new_in_memory(EventManager::new());
        store.register_fn(|event| match event {
            DatastoreEvent::Frozen => Err(TesseraError::Listener("flush failed".into())),
            _ => Ok(()),
        });

        assert!(store.freeze().is_err());
        assert!(store.is_frozen());
    }

    #[test]
    fn test_set_storage_after_freeze() {
        let store = Datastore::new(EventManager::new());
        store.freeze().unwrap();

        let ram = RamStorage::new(&store);
        store.set_storage(ram);
        assert_eq!(store.get_num_images(), Some(0));
    }

    #[test]
    fn test_close_posts_to_event_manager() {
        let events = EventManager::new();
        let closed = Arc::new(Mutex::new(Vec::new()));
        let sink = closed.clone();
        events.register_fn(
            move |event| {
                sink.lock().push(event.clone());
                Ok(())
            },
            100,
        );

        let store = Datastore::new_in_memory(events);
        let kinds = record_kinds(&store);
        store.close().unwrap();

        assert_eq!(
            *closed.lock(),
            vec![GlobalEvent::DatastoreClosing { source: store.id() }]
        );
        assert!(kinds.lock().is_empty());
        assert!(!store.is_frozen());
    }

    #[test]
    fn test_set_save_path_posts_saved() {
        let store = Datastore::new_in_memory(EventManager::new());
        let kinds = record_kinds(&store);

        store.set_save_path("/data/run1").unwrap();
        assert_eq!(store.save_path(), Some(PathBuf::from("/data/run1")));
        assert_eq!(*kinds.lock(), vec!["saved"]);
    }

    #[test]
    fn test_unregister_stops_delivery() {
        let store = Datastore::new_in_memory(EventManager::new());
        let count = Arc::new(Mutex::new(0));
        let sink = count.clone();
        let id = store.register_fn(move |_event| {
            *sink.lock() += 1;
            Ok(())
        });

        store.publish_event(DatastoreEvent::Frozen).unwrap();
        assert!(store.unregister_for_events(id));
        store.publish_event(DatastoreEvent::Frozen).unwrap();

        assert_eq!(*count.lock(), 1);
        assert!(!store.is_frozen());
    }

    #[test]
    fn test_copy_from() {
        let source = Datastore::new_in_memory(EventManager::new());
        source
            .set_summary_metadata(SummaryMetadata::builder().name("src").build())
            .unwrap();
        for t in 0..3 {
            source
                .put_image(image(Coords::builder().time(t).build()))
                .unwrap();
        }

        let target = Datastore::new_in_memory(EventManager::new());
        target.copy_from(&source).unwrap();

        assert_eq!(target.get_num_images(), Some(3));
        let summary = target.get_summary_metadata().unwrap();
        assert_eq!(summary.name(), Some("src"));
        assert_eq!(summary.axis_order().unwrap(), ["time"]);
    }

    #[test]
    fn test_copy_into_frozen_fails() {
        let source = Datastore::new_in_memory(EventManager::new());
        let target = Datastore::new_in_memory(EventManager::new());
        target.freeze().unwrap();

        assert!(matches!(target.copy_from(&source), Err(TesseraError::Frozen)));
    }
}
