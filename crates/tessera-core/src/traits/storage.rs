use crate::types::{Coords, Image, SummaryMetadata};

/// Pluggable image storage backend
///
/// Storage is the read side of a datastore. Writes reach a backend through
/// the datastore's event channel: a backend registers itself as a listener
/// when it is created for a datastore and persists the images and summary
/// metadata it is notified about.
///
/// Implementations use interior mutability, since the datastore and the
/// event channel both hold a shared handle to the same backend.
pub trait Storage: Send + Sync {
    /// Image stored at exactly `coords`
    fn get_image(&self, coords: &Coords) -> Option<Image>;

    /// Any stored image, or None if the storage is empty
    fn get_any_image(&self) -> Option<Image>;

    /// All images whose coordinates match every axis of `coords`
    fn get_images_matching(&self, coords: &Coords) -> Vec<Image>;

    /// Coordinates of every stored image, in no particular order
    fn get_unordered_image_coords(&self) -> Vec<Coords>;

    /// Largest index seen along `axis`, or -1 if the axis was never seen
    fn get_max_index(&self, axis: &str) -> i64;

    /// Every axis seen so far
    fn get_axes(&self) -> Vec<String>;

    /// Largest index seen along each axis
    fn get_max_indices(&self) -> Coords;

    /// Summary metadata last stored, if any
    fn get_summary_metadata(&self) -> Option<SummaryMetadata>;

    fn get_num_images(&self) -> usize;

    /// Whether this storage persists what its datastore posts
    ///
    /// False for a dataset opened read-only; a datastore bound to such a
    /// storage refuses mutation instead of dropping writes.
    fn is_writable(&self) -> bool {
        true
    }
}
