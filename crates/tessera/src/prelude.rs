//! Tessera Prelude
//!
//! Import this to get all commonly used types and traits:
//!
//! ```
//! use tessera::prelude::*;
//! ```

// Core types
pub use crate::{
    axis, Coords, Datastore, DatastoreConfig, Image, Result, SaveMode, SummaryMetadata,
    TesseraError,
};

// Events
pub use crate::{DatastoreEvent, EventManager, GlobalEvent, Listener, ListenerId};

// Storage
pub use crate::{open_dataset, MultipageStorage, RamStorage, SinglePlaneSeriesStorage, Storage};

pub use std::sync::Arc;
