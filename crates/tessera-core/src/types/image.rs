use crate::types::coords::Coords;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Pixel payload tagged with its coordinate
///
/// Cloning an image shares the pixel buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    coords: Coords,
    width: u32,
    height: u32,
    bytes_per_pixel: u8,
    pixels: Arc<[u8]>,
    metadata: BTreeMap<String, serde_json::Value>,
}

/// Everything about an image except its pixels, as stored by file backends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageHeader {
    pub coords: Coords,
    pub width: u32,
    pub height: u32,
    pub bytes_per_pixel: u8,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Image {
    pub fn new(
        coords: Coords,
        width: u32,
        height: u32,
        bytes_per_pixel: u8,
        pixels: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            coords,
            width,
            height,
            bytes_per_pixel,
            pixels: pixels.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn from_parts(header: ImageHeader, pixels: impl Into<Arc<[u8]>>) -> Self {
        Self {
            coords: header.coords,
            width: header.width,
            height: header.height,
            bytes_per_pixel: header.bytes_per_pixel,
            pixels: pixels.into(),
            metadata: header.metadata,
        }
    }

    /// Same pixels, placed at another coordinate
    pub fn copy_at(&self, coords: Coords) -> Self {
        Self {
            coords,
            ..self.clone()
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn coords(&self) -> &Coords {
        &self.coords
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bytes_per_pixel(&self) -> u8 {
        self.bytes_per_pixel
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn metadata(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.metadata
    }

    pub fn header(&self) -> ImageHeader {
        ImageHeader {
            coords: self.coords.clone(),
            width: self.width,
            height: self.height,
            bytes_per_pixel: self.bytes_per_pixel,
            metadata: self.metadata.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_at_shares_pixels() {
        let image = Image::new(Coords::builder().time(0).build(), 2, 1, 1, vec![7u8, 9]);
        let moved = image.copy_at(Coords::builder().time(5).build());

        assert_eq!(moved.coords().index("time"), Some(5));
        assert_eq!(moved.pixels(), image.pixels());
        assert_eq!(image.coords().index("time"), Some(0));
    }

    #[test]
    fn test_header_roundtrip() {
        let image = Image::new(Coords::builder().channel(1).build(), 1, 1, 2, vec![0u8, 1])
            .with_metadata("exposure_ms", serde_json::json!(12.5));
        let rebuilt = Image::from_parts(image.header(), image.pixels().to_vec());
        assert_eq!(rebuilt, image);
    }
}
