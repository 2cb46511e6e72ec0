//! Multi-axis image coordinates
//!
//! A [`Coords`] maps axis names to non-negative indices. Axes iterate in the
//! order they were first set on the builder; equality and hashing ignore that
//! order.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Well-known axis names
pub mod axis {
    pub const TIME: &str = "time";
    pub const CHANNEL: &str = "channel";
    pub const Z: &str = "z";
    pub const STAGE_POSITION: &str = "position";
}

/// Immutable multi-axis index
#[derive(Debug, Clone, Default)]
pub struct Coords {
    entries: Vec<(String, u32)>,
}

impl Coords {
    pub fn builder() -> CoordsBuilder {
        CoordsBuilder::default()
    }

    /// Builder seeded with this coordinate's axes
    pub fn copy(&self) -> CoordsBuilder {
        CoordsBuilder {
            entries: self.entries.clone(),
        }
    }

    /// Index along `axis`, if the axis is present
    pub fn index(&self, axis: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|(name, _)| name == axis)
            .map(|(_, index)| *index)
    }

    pub fn contains_axis(&self, axis: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == axis)
    }

    /// Axis names in iteration order
    pub fn axes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// (axis, index) pairs in iteration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|(name, index)| (name.as_str(), *index))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether every axis of `partial` is present here with the same index
    pub fn matches(&self, partial: &Coords) -> bool {
        partial
            .iter()
            .all(|(axis, index)| self.index(axis) == Some(index))
    }
}

impl PartialEq for Coords {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && other.matches(self)
    }
}

impl Eq for Coords {}

impl Hash for Coords {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut sorted: Vec<&(String, u32)> = self.entries.iter().collect();
        sorted.sort();
        sorted.len().hash(state);
        for (axis, index) in sorted {
            axis.hash(state);
            index.hash(state);
        }
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (axis, index)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", axis, index)?;
        }
        Ok(())
    }
}

impl Serialize for Coords {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (axis, index) in &self.entries {
            map.serialize_entry(axis, index)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Coords {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CoordsVisitor;

        impl<'de> Visitor<'de> for CoordsVisitor {
            type Value = Coords;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of axis names to non-negative indices")
            }

            fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<Coords, M::Error> {
                let mut builder = CoordsBuilder::default();
                while let Some((axis, index)) = access.next_entry::<String, u32>()? {
                    builder = builder.index(axis, index);
                }
                Ok(builder.build())
            }
        }

        deserializer.deserialize_map(CoordsVisitor)
    }
}

/// Accumulates axis→index pairs for a [`Coords`]
#[derive(Debug, Clone, Default)]
pub struct CoordsBuilder {
    entries: Vec<(String, u32)>,
}

impl CoordsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the index for `axis`; an axis that is already set keeps its
    /// position and takes the new index.
    pub fn index(mut self, axis: impl Into<String>, index: u32) -> Self {
        let axis = axis.into();
        match self.entries.iter_mut().find(|(name, _)| *name == axis) {
            Some(entry) => entry.1 = index,
            None => self.entries.push((axis, index)),
        }
        self
    }

    pub fn time(self, index: u32) -> Self {
        self.index(axis::TIME, index)
    }

    pub fn channel(self, index: u32) -> Self {
        self.index(axis::CHANNEL, index)
    }

    pub fn z(self, index: u32) -> Self {
        self.index(axis::Z, index)
    }

    pub fn stage_position(self, index: u32) -> Self {
        self.index(axis::STAGE_POSITION, index)
    }

    /// Drop `axis` from the coordinate being built
    pub fn remove_axis(mut self, axis: &str) -> Self {
        self.entries.retain(|(name, _)| name != axis);
        self
    }

    pub fn build(self) -> Coords {
        Coords {
            entries: self.entries,
        }
    }
}
