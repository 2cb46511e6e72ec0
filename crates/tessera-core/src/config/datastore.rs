use super::storage::{MultipageConfig, SinglePlaneConfig};
use serde::{Deserialize, Serialize};

/// Priority given to listeners registered without an explicit priority.
/// Lower values are notified first.
pub const DEFAULT_LISTENER_PRIORITY: i32 = 100;

/// Priority storage backends register at, ahead of every default listener
pub const STORAGE_LISTENER_PRIORITY: i32 = 0;

/// Configuration for a datastore and the backends its save pipeline creates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatastoreConfig {
    /// Priority for `register_for_events` without an explicit priority
    /// Default: 100
    #[serde(default = "default_listener_priority")]
    pub default_priority: i32,

    /// Settings for multipage saves
    #[serde(default)]
    pub multipage: MultipageConfig,

    /// Settings for single-plane series saves
    #[serde(default)]
    pub single_plane: SinglePlaneConfig,
}

fn default_listener_priority() -> i32 {
    DEFAULT_LISTENER_PRIORITY
}

impl Default for DatastoreConfig {
    fn default() -> Self {
        Self {
            default_priority: default_listener_priority(),
            multipage: MultipageConfig::default(),
            single_plane: SinglePlaneConfig::default(),
        }
    }
}

impl DatastoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_priority(mut self, priority: i32) -> Self {
        self.default_priority = priority;
        self
    }

    pub fn with_multipage(mut self, config: MultipageConfig) -> Self {
        self.multipage = config;
        self
    }

    pub fn with_single_plane(mut self, config: SinglePlaneConfig) -> Self {
        self.single_plane = config;
        self
    }
}
