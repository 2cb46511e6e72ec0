//! `dataset.json`: identifies the layout of a saved dataset

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use tessera_core::Result;

pub const DESCRIPTOR_FILE: &str = "dataset.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetFormat {
    Multipage,
    SinglePlaneSeries,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    pub format: DatasetFormat,
    pub prefix: String,
    #[serde(default)]
    pub split_positions: bool,
    #[serde(default)]
    pub separate_metadata_file: bool,
}

impl DatasetDescriptor {
    pub fn read(dir: &Path) -> Result<Self> {
        let data = fs::read_to_string(dir.join(DESCRIPTOR_FILE))?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn write(&self, dir: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        fs::write(dir.join(DESCRIPTOR_FILE), data)?;
        Ok(())
    }
}

/// Create `dir` for writing a new dataset
///
/// Refuses a path that is a file or a directory that already has entries.
pub fn prepare_new_dataset_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        let occupied = !dir.is_dir() || fs::read_dir(dir)?.next().is_some();
        if occupied {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists and is not an empty directory", dir.display()),
            )
            .into());
        }
    }
    fs::create_dir_all(dir)?;
    Ok(())
}
