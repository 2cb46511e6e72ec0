//! Save pipeline
//!
//! A save copies the whole dataset into a fresh datastore bound to a new
//! on-disk backend, then freezes the copy so the backend flushes.

use crate::datastore::Datastore;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tessera_core::{
    axis, observe, Coords, DatastoreConfig, Result, Storage, SummaryMetadata, TesseraError,
};
use tessera_store::{MultipageStorage, SinglePlaneSeriesStorage};

/// On-disk layout produced by a save
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaveMode {
    /// One multi-frame file per stage position
    Multipage,
    /// One file per 2-D plane
    SinglePlaneSeries,
}

impl SaveMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaveMode::Multipage => "multipage",
            SaveMode::SinglePlaneSeries => "single-plane",
        }
    }

    /// Build this mode's backend at `path`, registered on `target`
    fn create_storage(
        self,
        target: &Datastore,
        path: &Path,
        config: &DatastoreConfig,
    ) -> Result<Arc<dyn Storage>> {
        let storage: Arc<dyn Storage> = match self {
            SaveMode::Multipage => MultipageStorage::create(target, path, config.multipage.clone())?,
            SaveMode::SinglePlaneSeries => {
                SinglePlaneSeriesStorage::create(target, path, config.single_plane.clone())?
            }
        };
        Ok(storage)
    }
}

impl fmt::Display for SaveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaveMode {
    type Err = TesseraError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "multipage" => Ok(SaveMode::Multipage),
            "single-plane" | "singleplane" | "single_plane" | "single-plane-series" => {
                Ok(SaveMode::SinglePlaneSeries)
            }
            _ => Err(TesseraError::UnrecognizedSaveMode(s.to_string())),
        }
    }
}

impl Datastore {
    /// Write a copy of this datastore to `path`
    ///
    /// Returns `false` if anything went wrong; the failure is logged. On
    /// success this datastore is frozen and remembers `path` as its save path.
    pub fn save(&self, mode: SaveMode, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        let start = Instant::now();

        match self.save_to(mode, path) {
            Ok(saved) => {
                let images = saved.get_num_images().unwrap_or(0);
                observe::record_save(start.elapsed(), images, true);
                true
            }
            Err(TesseraError::Frozen) => {
                tracing::error!(
                    "Couldn't modify newly-created datastore while saving to {}",
                    path.display()
                );
                observe::record_save(start.elapsed(), 0, false);
                false
            }
            Err(e) => {
                tracing::error!("Failed to save {} to {}: {}", self.id(), path.display(), e);
                observe::record_save(start.elapsed(), 0, false);
                false
            }
        }
    }

    /// Write a copy of this datastore to `path` and return the frozen copy
    ///
    /// Images are written in ascending stage position order. Images without
    /// a stage position come first, and images sharing a position keep the
    /// order the storage enumerates them in.
    pub fn save_to(&self, mode: SaveMode, path: impl AsRef<Path>) -> Result<Datastore> {
        let path = path.as_ref();

        let summary = self.resolved_summary();

        let duplicate = Datastore::with_config(self.event_manager().clone(), self.config().clone());
        let storage = mode.create_storage(&duplicate, path, self.config())?;
        duplicate.set_storage(storage);

        duplicate.set_summary_metadata(summary)?;

        // Checked against our axes: an early image may use only some of them
        let axes = self.get_axes().unwrap_or_default();
        let mut coords = self.get_unordered_image_coords().unwrap_or_default();
        coords.sort_by_key(|c| c.index(axis::STAGE_POSITION));
        for c in &coords {
            if let Some(image) = self.get_image(c) {
                duplicate.put_image_within(image, Some(axes.as_slice()))?;
            }
        }

        duplicate.set_save_path(path)?;
        duplicate.freeze()?;

        tracing::info!(
            "Saved {} images from {} to {} as {}",
            coords.len(),
            self.id(),
            path.display(),
            mode
        );

        if let Err(e) = self.set_save_path(path) {
            tracing::warn!("{} saved but could not record its save path: {}", self.id(), e);
        }
        if let Err(e) = self.freeze() {
            tracing::warn!("{} saved but a listener failed on freeze: {}", self.id(), e);
        }

        Ok(duplicate)
    }

    /// Summary metadata to write, with intended dimensions filled in from
    /// the data when the acquisition did not declare them
    fn resolved_summary(&self) -> SummaryMetadata {
        let summary = self.get_summary_metadata().unwrap_or_default();
        if summary.intended_dimensions().is_some() {
            return summary;
        }

        let mut dims = Coords::builder();
        for name in self.get_axes().unwrap_or_default() {
            let length = u32::try_from(self.get_axis_length(&name)).unwrap_or(u32::MAX);
            dims = dims.index(name, length);
        }
        summary.copy().intended_dimensions(dims.build()).build()
    }
}
