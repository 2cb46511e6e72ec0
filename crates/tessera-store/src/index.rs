//! In-memory image index shared by every backend

use parking_lot::RwLock;
use std::collections::HashMap;
use tessera_core::{Coords, CoordsBuilder, Image, Storage, SummaryMetadata};

#[derive(Default)]
struct IndexState {
    images: HashMap<Coords, Image>,
    /// Coordinates in first-arrival order
    order: Vec<Coords>,
    /// Largest index per axis, axes in first-seen order
    max_indices: Vec<(String, u32)>,
    summary: Option<SummaryMetadata>,
}

/// Coordinate-keyed image map with axis bookkeeping
///
/// Putting an image at an occupied coordinate replaces it.
#[derive(Default)]
pub struct ImageIndex {
    state: RwLock<IndexState>,
}

impl ImageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, image: Image) {
        let mut guard = self.state.write();
        let state = &mut *guard;
        for (axis, index) in image.coords().iter() {
            match state.max_indices.iter_mut().find(|(name, _)| name == axis) {
                Some(entry) => entry.1 = entry.1.max(index),
                None => state.max_indices.push((axis.to_string(), index)),
            }
        }
        let coords = image.coords().clone();
        if state.images.insert(coords.clone(), image).is_none() {
            state.order.push(coords);
        }
    }

    pub fn set_summary_metadata(&self, summary: SummaryMetadata) {
        self.state.write().summary = Some(summary);
    }

    pub fn contains(&self, coords: &Coords) -> bool {
        self.state.read().images.contains_key(coords)
    }
}

impl Storage for ImageIndex {
    fn get_image(&self, coords: &Coords) -> Option<Image> {
        self.state.read().images.get(coords).cloned()
    }

    fn get_any_image(&self) -> Option<Image> {
        let state = self.state.read();
        state
            .order
            .first()
            .and_then(|coords| state.images.get(coords).cloned())
    }

    fn get_images_matching(&self, coords: &Coords) -> Vec<Image> {
        let state = self.state.read();
        state
            .order
            .iter()
            .filter(|c| c.matches(coords))
            .filter_map(|c| state.images.get(c).cloned())
            .collect()
    }

    fn get_unordered_image_coords(&self) -> Vec<Coords> {
        self.state.read().order.clone()
    }

    fn get_max_index(&self, axis: &str) -> i64 {
        self.state
            .read()
            .max_indices
            .iter()
            .find(|(name, _)| name == axis)
            .map(|(_, index)| i64::from(*index))
            .unwrap_or(-1)
    }

    fn get_axes(&self) -> Vec<String> {
        self.state
            .read()
            .max_indices
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn get_max_indices(&self) -> Coords {
        self.state
            .read()
            .max_indices
            .iter()
            .fold(CoordsBuilder::new(), |builder, (axis, index)| {
                builder.index(axis.clone(), *index)
            })
            .build()
    }

    fn get_summary_metadata(&self) -> Option<SummaryMetadata> {
        self.state.read().summary.clone()
    }

    fn get_num_images(&self) -> usize {
        self.state.read().images.len()
    }
}

/// Implement [`Storage`] for a backend by forwarding to its [`ImageIndex`]
macro_rules! forward_storage {
    ($ty:ty, $field:ident) => {
        $crate::index::forward_storage!($ty, $field, |_storage: &$ty| true);
    };
    ($ty:ty, $field:ident, $writable:expr) => {
        impl tessera_core::Storage for $ty {
            fn is_writable(&self) -> bool {
                ($writable)(self)
            }

            fn get_image(&self, coords: &tessera_core::Coords) -> Option<tessera_core::Image> {
                self.$field.get_image(coords)
            }

            fn get_any_image(&self) -> Option<tessera_core::Image> {
                self.$field.get_any_image()
            }

            fn get_images_matching(
                &self,
                coords: &tessera_core::Coords,
            ) -> Vec<tessera_core::Image> {
                self.$field.get_images_matching(coords)
            }

            fn get_unordered_image_coords(&self) -> Vec<tessera_core::Coords> {
                self.$field.get_unordered_image_coords()
            }

            fn get_max_index(&self, axis: &str) -> i64 {
                self.$field.get_max_index(axis)
            }

            fn get_axes(&self) -> Vec<String> {
                self.$field.get_axes()
            }

            fn get_max_indices(&self) -> tessera_core::Coords {
                self.$field.get_max_indices()
            }

            fn get_summary_metadata(&self) -> Option<tessera_core::SummaryMetadata> {
                self.$field.get_summary_metadata()
            }

            fn get_num_images(&self) -> usize {
                self.$field.get_num_images()
            }
        }
    };
}

pub(crate) use forward_storage;
