pub mod coords;
pub mod image;
pub mod metadata;

pub use coords::{axis, Coords, CoordsBuilder};
pub use image::{Image, ImageHeader};
pub use metadata::{SummaryMetadata, SummaryMetadataBuilder};
