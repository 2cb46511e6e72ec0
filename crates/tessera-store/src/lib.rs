//! Storage backends for Tessera datastores
//!
//! Every backend keeps an in-memory [`ImageIndex`] that serves reads, and
//! registers itself on its datastore's event channel at
//! [`STORAGE_LISTENER_PRIORITY`](tessera_core::STORAGE_LISTENER_PRIORITY) so
//! it persists each image before any other listener is notified.
//!
//! - [`RamStorage`]: memory only
//! - [`MultipageStorage`]: one multi-frame file per stage position
//! - [`SinglePlaneSeriesStorage`]: one file per 2-D plane

pub mod descriptor;
pub mod index;
pub mod multipage;
pub mod ram;
pub mod record;
pub mod single_plane;

pub use descriptor::{DatasetDescriptor, DatasetFormat};
pub use index::ImageIndex;
pub use multipage::MultipageStorage;
pub use ram::RamStorage;
pub use single_plane::SinglePlaneSeriesStorage;

use std::path::Path;
use std::sync::Arc;
use tessera_core::{Result, Storage};

/// Open a saved dataset read-only, whichever layout it uses
pub fn open_dataset(dir: impl AsRef<Path>) -> Result<Arc<dyn Storage>> {
    let dir = dir.as_ref();
    let storage: Arc<dyn Storage> = match DatasetDescriptor::read(dir)?.format {
        DatasetFormat::Multipage => MultipageStorage::open(dir)?,
        DatasetFormat::SinglePlaneSeries => SinglePlaneSeriesStorage::open(dir)?,
    };
    Ok(storage)
}
