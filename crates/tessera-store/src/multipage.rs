//! Multipage storage: one frames file per stage position
//!
//! Layout of a dataset directory:
//! - `dataset.json` – layout descriptor
//! - `{prefix}_Pos{n}.frames` – every plane of position `n` (split mode), or
//!   `{prefix}.frames` – every plane of the dataset (combined mode)
//! - `{prefix}_metadata.json` – summary metadata, when kept in its own file
//!
//! A combined file is laid out position-major, so it only accepts images in
//! non-decreasing stage position order.

use crate::descriptor::{prepare_new_dataset_dir, DatasetDescriptor, DatasetFormat};
use crate::index::{forward_storage, ImageIndex};
use crate::record::{self, Record};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tessera_bus::{DatastoreEvent, EventSource, Listener};
use tessera_core::{
    axis, Image, ImageHeader, MultipageConfig, Result, SummaryMetadata, TesseraError,
    STORAGE_LISTENER_PRIORITY,
};

const FRAMES_EXTENSION: &str = "frames";

struct FrameWriter {
    files: BTreeMap<u32, BufWriter<File>>,
    last_position: Option<u32>,
    summary: Option<Vec<u8>>,
}

/// Frames-file backed storage
pub struct MultipageStorage {
    dir: PathBuf,
    config: MultipageConfig,
    index: ImageIndex,
    /// None when opened read-only
    writer: Option<Mutex<FrameWriter>>,
}

impl MultipageStorage {
    /// Create a new dataset at `dir` that persists everything posted on `target`
    pub fn create<S>(target: &S, dir: impl AsRef<Path>, config: MultipageConfig) -> Result<Arc<Self>>
    where
        S: EventSource<DatastoreEvent> + ?Sized,
    {
        let dir = dir.as_ref().to_path_buf();
        prepare_new_dataset_dir(&dir)?;
        DatasetDescriptor {
            format: DatasetFormat::Multipage,
            prefix: config.prefix.clone(),
            split_positions: config.split_positions,
            separate_metadata_file: config.separate_metadata_file,
        }
        .write(&dir)?;

        tracing::info!("Created multipage dataset at {}", dir.display());

        let storage = Arc::new(Self {
            dir,
            config,
            index: ImageIndex::new(),
            writer: Some(Mutex::new(FrameWriter {
                files: BTreeMap::new(),
                last_position: None,
                summary: None,
            })),
        });
        target.register_listener(storage.clone(), STORAGE_LISTENER_PRIORITY);
        Ok(storage)
    }

    /// Load an existing dataset read-only
    pub fn open(dir: impl AsRef<Path>) -> Result<Arc<Self>> {
        let dir = dir.as_ref().to_path_buf();
        let descriptor = DatasetDescriptor::read(&dir)?;
        if descriptor.format != DatasetFormat::Multipage {
            return Err(TesseraError::Storage(format!(
                "{} is not a multipage dataset",
                dir.display()
            )));
        }

        let config = MultipageConfig::default()
            .with_prefix(descriptor.prefix)
            .with_split_positions(descriptor.split_positions)
            .with_separate_metadata_file(descriptor.separate_metadata_file);

        let index = ImageIndex::new();
        let mut inline_summary = None;
        for path in frame_files(&dir, &config.prefix)? {
            let mut reader = BufReader::new(File::open(&path)?);
            while let Some(rec) = record::read_record(&mut reader)? {
                match rec {
                    Record::Summary { header } => {
                        inline_summary = Some(serde_json::from_slice::<SummaryMetadata>(&header)?);
                    }
                    Record::Image { header, pixels } => {
                        let header: ImageHeader = serde_json::from_slice(&header)?;
                        index.put(Image::from_parts(header, pixels));
                    }
                }
            }
        }

        let metadata_path = metadata_file(&dir, &config.prefix);
        let summary = if config.separate_metadata_file && metadata_path.exists() {
            Some(serde_json::from_str(&fs::read_to_string(&metadata_path)?)?)
        } else {
            inline_summary
        };
        if let Some(summary) = summary {
            index.set_summary_metadata(summary);
        }

        tracing::info!(
            "Opened multipage dataset at {} ({} images)",
            dir.display(),
            tessera_core::Storage::get_num_images(&index)
        );

        Ok(Arc::new(Self {
            dir,
            config,
            index,
            writer: None,
        }))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config(&self) -> &MultipageConfig {
        &self.config
    }

    fn writer(&self) -> Result<&Mutex<FrameWriter>> {
        self.writer.as_ref().ok_or_else(|| {
            TesseraError::InvalidState(format!(
                "Multipage dataset at {} is open read-only",
                self.dir.display()
            ))
        })
    }

    fn frames_path(&self, file_key: u32) -> PathBuf {
        if self.config.split_positions {
            self.dir
                .join(format!("{}_Pos{}.{}", self.config.prefix, file_key, FRAMES_EXTENSION))
        } else {
            self.dir
                .join(format!("{}.{}", self.config.prefix, FRAMES_EXTENSION))
        }
    }

    fn write_image(&self, image: &Image) -> Result<()> {
        let position = image.coords().index(axis::STAGE_POSITION).unwrap_or(0);
        let mut writer = self.writer()?.lock();

        if !self.config.split_positions {
            if let Some(last) = writer.last_position {
                if position < last {
                    return Err(TesseraError::Storage(format!(
                        "Combined frames file requires non-decreasing positions; got {} after {}",
                        position, last
                    )));
                }
            }
        }

        let file_key = if self.config.split_positions { position } else { 0 };
        if !writer.files.contains_key(&file_key) {
            let path = self.frames_path(file_key);
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            let mut out = BufWriter::with_capacity(self.config.write_buffer_size, file);
            if !self.config.separate_metadata_file {
                if let Some(summary) = &writer.summary {
                    record::write_summary(&mut out, summary)?;
                }
            }
            tracing::debug!("Opened frames file {}", path.display());
            writer.files.insert(file_key, out);
        }

        let header = serde_json::to_vec(&image.header())?;
        if let Some(out) = writer.files.get_mut(&file_key) {
            record::write_image(out, &header, image.pixels())?;
        }
        writer.last_position = Some(writer.last_position.map_or(position, |p| p.max(position)));
        Ok(())
    }

    fn write_summary(&self, summary: &SummaryMetadata) -> Result<()> {
        let mut writer = self.writer()?.lock();
        if self.config.separate_metadata_file {
            let data = serde_json::to_string_pretty(summary)?;
            fs::write(metadata_file(&self.dir, &self.config.prefix), data)?;
        } else {
            let header = serde_json::to_vec(summary)?;
            for out in writer.files.values_mut() {
                record::write_summary(out, &header)?;
            }
            writer.summary = Some(header);
        }
        Ok(())
    }

    /// Flush every open frames file
    fn finish(&self) -> Result<()> {
        let mut writer = self.writer()?.lock();
        for out in writer.files.values_mut() {
            out.flush()?;
        }
        tracing::info!(
            "Finished writing {} frames file(s) to {}",
            writer.files.len(),
            self.dir.display()
        );
        Ok(())
    }
}

impl Listener<DatastoreEvent> for MultipageStorage {
    fn on_event(&self, event: &DatastoreEvent) -> Result<()> {
        match event {
            DatastoreEvent::NewImage { image, .. } => {
                self.write_image(image)?;
                self.index.put(image.clone());
            }
            DatastoreEvent::NewSummaryMetadata(summary) => {
                self.write_summary(summary)?;
                self.index.set_summary_metadata(summary.clone());
            }
            DatastoreEvent::Frozen => self.finish()?,
            DatastoreEvent::Saved(_) => {}
        }
        Ok(())
    }
}

forward_storage!(MultipageStorage, index, |s: &MultipageStorage| s.writer.is_some());

fn metadata_file(dir: &Path, prefix: &str) -> PathBuf {
    dir.join(format!("{}_metadata.json", prefix))
}

/// Frames files belonging to `prefix`, combined file first, then by position
fn frame_files(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let key = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| frames_file_key(n, prefix));
        if let Some(key) = key {
            files.push((key, path));
        }
    }
    files.sort();
    Ok(files.into_iter().map(|(_, path)| path).collect())
}

/// Sort key of a frames file name written for `prefix`: None sorts the
/// combined file ahead of every per-position file
fn frames_file_key(name: &str, prefix: &str) -> Option<Option<u32>> {
    let stem = name
        .strip_suffix(FRAMES_EXTENSION)?
        .strip_suffix('.')?
        .strip_prefix(prefix)?;
    if stem.is_empty() {
        return Some(None);
    }
    let position = stem.strip_prefix("_Pos")?;
    if position.is_empty() || !position.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    position.parse().ok().map(Some)
}
