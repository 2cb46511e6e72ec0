//! Tessera: an orchestration core for N-dimensional image datastores
//!
//! A [`Datastore`] is the consistency boundary acquisition code talks to:
//! - **Validation**: image coordinates must use the axes the storage already knows
//! - **Axis order**: axes are recorded in summary metadata as they first become non-zero
//! - **Lifecycle**: a datastore accepts images until it is frozen, then never again
//! - **Save**: a copy of the dataset is written to a new backend in stage-position order
//!
//! Storage backends persist images by listening on the datastore's event
//! channel; the datastore itself only validates and notifies.
//!
//! # Quick Start
//!
//! ```
//! use tessera::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let store = Datastore::new_in_memory(EventManager::new());
//!
//! let coords = Coords::builder().time(0).channel(1).build();
//! store.put_image(Image::new(coords, 2, 2, 1, vec![0u8; 4]))?;
//!
//! assert_eq!(store.get_num_images(), Some(1));
//! let summary = store.get_summary_metadata().unwrap();
//! assert_eq!(summary.axis_order().unwrap(), ["channel"]);
//! # Ok(())
//! # }
//! ```

pub mod datastore;
pub mod prelude;
pub mod save;

// Re-export core types
pub use tessera_core::{
    axis, observe, Coords, CoordsBuilder, DatastoreConfig, Image, ImageHeader, MultipageConfig,
    Result, SinglePlaneConfig, Storage, SummaryMetadata, SummaryMetadataBuilder, TesseraError,
};

// Re-export the event channel
pub use tessera_bus::{
    DatastoreEvent, DatastoreId, EventBus, EventManager, EventSource, GlobalEvent, Listener,
    ListenerId,
};

// Re-export storage backends
pub use tessera_store::{
    open_dataset, MultipageStorage, RamStorage, SinglePlaneSeriesStorage,
};

// Re-export main types from this crate
pub use datastore::Datastore;
pub use save::SaveMode;
