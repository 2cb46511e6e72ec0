pub mod datastore;
pub mod storage;

pub use datastore::{DatastoreConfig, DEFAULT_LISTENER_PRIORITY, STORAGE_LISTENER_PRIORITY};
pub use storage::{MultipageConfig, SinglePlaneConfig};
