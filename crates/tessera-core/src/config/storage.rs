use serde::{Deserialize, Serialize};

/// Configuration for the multipage backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultipageConfig {
    /// Write one frames file per stage position
    /// Default: true
    #[serde(default = "default_split_positions")]
    pub split_positions: bool,

    /// Keep summary metadata in its own JSON file rather than inline records
    /// Default: true
    #[serde(default = "default_separate_metadata_file")]
    pub separate_metadata_file: bool,

    /// File name prefix
    /// Default: "images"
    #[serde(default = "default_multipage_prefix")]
    pub prefix: String,

    /// Buffer size for frame writers
    /// Default: 256KB
    #[serde(default = "default_write_buffer_size")]
    pub write_buffer_size: usize,
}

fn default_split_positions() -> bool {
    true
}

fn default_separate_metadata_file() -> bool {
    true
}

fn default_multipage_prefix() -> String {
    "images".to_string()
}

fn default_write_buffer_size() -> usize {
    256 * 1024 // 256KB
}

impl Default for MultipageConfig {
    fn default() -> Self {
        Self {
            split_positions: default_split_positions(),
            separate_metadata_file: default_separate_metadata_file(),
            prefix: default_multipage_prefix(),
            write_buffer_size: default_write_buffer_size(),
        }
    }
}

impl MultipageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_split_positions(mut self, split: bool) -> Self {
        self.split_positions = split;
        self
    }

    pub fn with_separate_metadata_file(mut self, separate: bool) -> Self {
        self.separate_metadata_file = separate;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

/// Configuration for the single-plane series backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinglePlaneConfig {
    /// File name prefix for plane files
    /// Default: "plane"
    #[serde(default = "default_plane_prefix")]
    pub prefix: String,
}

fn default_plane_prefix() -> String {
    "plane".to_string()
}

impl Default for SinglePlaneConfig {
    fn default() -> Self {
        Self {
            prefix: default_plane_prefix(),
        }
    }
}

impl SinglePlaneConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}
