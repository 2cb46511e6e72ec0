//! Single-plane series storage: one file per 2-D plane
//!
//! Layout of a dataset directory:
//! - `dataset.json` – layout descriptor
//! - `summary.json` – summary metadata
//! - `{prefix}_{axis}-{index}_....bin` – raw pixels of one plane, axes sorted by name
//! - `{prefix}_{axis}-{index}_....json` – header of that plane

use crate::descriptor::{
    prepare_new_dataset_dir, DatasetDescriptor, DatasetFormat, DESCRIPTOR_FILE,
};
use crate::index::{forward_storage, ImageIndex};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tessera_bus::{DatastoreEvent, EventSource, Listener};
use tessera_core::{
    Coords, Image, ImageHeader, Result, SinglePlaneConfig, SummaryMetadata, TesseraError,
    STORAGE_LISTENER_PRIORITY,
};

const SUMMARY_FILE: &str = "summary.json";
const PIXELS_EXTENSION: &str = "bin";
const HEADER_EXTENSION: &str = "json";

/// Directory-of-planes storage
pub struct SinglePlaneSeriesStorage {
    dir: PathBuf,
    config: SinglePlaneConfig,
    index: ImageIndex,
    writable: bool,
}

impl SinglePlaneSeriesStorage {
    /// Create a new dataset at `dir` that persists everything posted on `target`
    pub fn create<S>(
        target: &S,
        dir: impl AsRef<Path>,
        config: SinglePlaneConfig,
    ) -> Result<Arc<Self>>
    where
        S: EventSource<DatastoreEvent> + ?Sized,
    {
        let dir = dir.as_ref().to_path_buf();
        prepare_new_dataset_dir(&dir)?;
        DatasetDescriptor {
            format: DatasetFormat::SinglePlaneSeries,
            prefix: config.prefix.clone(),
            split_positions: false,
            separate_metadata_file: true,
        }
        .write(&dir)?;

        tracing::info!("Created single-plane series at {}", dir.display());

        let storage = Arc::new(Self {
            dir,
            config,
            index: ImageIndex::new(),
            writable: true,
        });
        target.register_listener(storage.clone(), STORAGE_LISTENER_PRIORITY);
        Ok(storage)
    }

    /// Load an existing dataset read-only
    pub fn open(dir: impl AsRef<Path>) -> Result<Arc<Self>> {
        let dir = dir.as_ref().to_path_buf();
        let descriptor = DatasetDescriptor::read(&dir)?;
        if descriptor.format != DatasetFormat::SinglePlaneSeries {
            return Err(TesseraError::Storage(format!(
                "{} is not a single-plane series",
                dir.display()
            )));
        }
        let config = SinglePlaneConfig::default().with_prefix(descriptor.prefix);

        let mut header_files = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            let is_header = path.extension().and_then(|e| e.to_str()) == Some(HEADER_EXTENSION);
            let is_plane = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| {
                    n.strip_prefix(config.prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('_'))
                        && n != SUMMARY_FILE
                        && n != DESCRIPTOR_FILE
                });
            if is_header && is_plane {
                header_files.push(path);
            }
        }
        header_files.sort();

        let index = ImageIndex::new();
        for header_path in header_files {
            let header: ImageHeader = serde_json::from_str(&fs::read_to_string(&header_path)?)?;
            let pixels = fs::read(header_path.with_extension(PIXELS_EXTENSION))?;
            index.put(Image::from_parts(header, pixels));
        }

        let summary_path = dir.join(SUMMARY_FILE);
        if summary_path.exists() {
            let summary: SummaryMetadata =
                serde_json::from_str(&fs::read_to_string(&summary_path)?)?;
            index.set_summary_metadata(summary);
        }

        Ok(Arc::new(Self {
            dir,
            config,
            index,
            writable: false,
        }))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File stem for the plane at `coords`
    pub fn plane_stem(&self, coords: &Coords) -> String {
        let mut parts: Vec<(&str, u32)> = coords.iter().collect();
        parts.sort();
        let mut stem = self.config.prefix.clone();
        for (axis, index) in parts {
            stem.push('_');
            stem.push_str(axis);
            stem.push('-');
            stem.push_str(&index.to_string());
        }
        stem
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.writable {
            Ok(())
        } else {
            Err(TesseraError::InvalidState(format!(
                "Single-plane series at {} is open read-only",
                self.dir.display()
            )))
        }
    }

    fn write_plane(&self, image: &Image) -> Result<()> {
        self.ensure_writable()?;
        let stem = self.plane_stem(image.coords());
        fs::write(
            self.dir.join(format!("{}.{}", stem, PIXELS_EXTENSION)),
            image.pixels(),
        )?;
        let header = serde_json::to_string_pretty(&image.header())?;
        fs::write(self.dir.join(format!("{}.{}", stem, HEADER_EXTENSION)), header)?;
        Ok(())
    }

    fn write_summary(&self, summary: &SummaryMetadata) -> Result<()> {
        self.ensure_writable()?;
        let data = serde_json::to_string_pretty(summary)?;
        fs::write(self.dir.join(SUMMARY_FILE), data)?;
        Ok(())
    }
}

impl Listener<DatastoreEvent> for SinglePlaneSeriesStorage {
    fn on_event(&self, event: &DatastoreEvent) -> Result<()> {
        match event {
            DatastoreEvent::NewImage { image, .. } => {
                self.write_plane(image)?;
                self.index.put(image.clone());
            }
            DatastoreEvent::NewSummaryMetadata(summary) => {
                self.write_summary(summary)?;
                self.index.set_summary_metadata(summary.clone());
            }
            DatastoreEvent::Frozen => {
                tracing::info!(
                    "Finished writing {} plane(s) to {}",
                    tessera_core::Storage::get_num_images(&self.index),
                    self.dir.display()
                );
            }
            DatastoreEvent::Saved(_) => {}
        }
        Ok(())
    }
}

forward_storage!(SinglePlaneSeriesStorage, index, |s: &SinglePlaneSeriesStorage| s.writable);
