//! Event payloads posted by datastores

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tessera_core::{Image, SummaryMetadata};

static NEXT_DATASTORE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a datastore, used as the event source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatastoreId(u64);

impl DatastoreId {
    /// Allocate a fresh id
    pub fn next() -> Self {
        Self(NEXT_DATASTORE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DatastoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "datastore#{}", self.0)
    }
}

/// Events posted on a datastore's own channel
#[derive(Debug, Clone)]
pub enum DatastoreEvent {
    /// An image passed validation and should be persisted
    NewImage { image: Image, source: DatastoreId },

    /// Replacement summary metadata
    NewSummaryMetadata(SummaryMetadata),

    /// The datastore is about to refuse further mutation
    Frozen,

    /// The datastore was saved to this path
    Saved(PathBuf),
}

impl DatastoreEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            DatastoreEvent::NewImage { .. } => "new_image",
            DatastoreEvent::NewSummaryMetadata(_) => "new_summary_metadata",
            DatastoreEvent::Frozen => "frozen",
            DatastoreEvent::Saved(_) => "saved",
        }
    }
}

/// Events posted on the process-scope channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlobalEvent {
    /// A datastore was closed by its owner
    DatastoreClosing { source: DatastoreId },
}
