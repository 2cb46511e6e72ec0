//! Tessera Core: Types and traits for the Tessera image datastore
//!
//! This crate defines the value types and seams shared by every other crate:
//! - Coordinates: immutable multi-axis indices (`time=3, channel=1, ...`)
//! - Summary metadata: the dataset-level record, built by copy-with-modification
//! - Images: opaque pixel payloads tagged with a coordinate
//! - Storage: the pluggable backend read interface
//! - Configuration for the datastore and its storage backends

pub mod config;
pub mod error;
pub mod observe;
pub mod traits;
pub mod types;

pub use config::{
    DatastoreConfig, MultipageConfig, SinglePlaneConfig, DEFAULT_LISTENER_PRIORITY,
    STORAGE_LISTENER_PRIORITY,
};
pub use error::{Result, TesseraError};
pub use traits::Storage;
pub use types::{
    axis, Coords, CoordsBuilder, Image, ImageHeader, SummaryMetadata, SummaryMetadataBuilder,
};
