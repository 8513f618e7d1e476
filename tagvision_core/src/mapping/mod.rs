// tagvision_core/src/mapping/mod.rs

//! The field map: where every known fiducial sits on the field.

use std::collections::HashMap;

use crate::geometry::Pose3;
use crate::types::TagId;

mod layout;

pub use layout::FieldDimensions;

/// Registry from tag identifier to field-frame pose.
///
/// Filled during setup and only read afterwards, so it needs no locking.
/// An unknown identifier is a normal answer, not an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    tags: HashMap<TagId, Pose3>,
    dimensions: Option<FieldDimensions>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tag, replacing any earlier pose for the same id.
    /// Returns the pose that was replaced.
    pub fn add_tag(&mut self, id: TagId, pose: Pose3) -> Option<Pose3> {
        self.tags.insert(id, pose)
    }

    pub fn tag_pose(&self, id: TagId) -> Option<Pose3> {
        self.tags.get(&id).copied()
    }

    pub fn contains(&self, id: TagId) -> bool {
        self.tags.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Registered ids in ascending order.
    pub fn ids(&self) -> Vec<TagId> {
        let mut ids: Vec<TagId> = self.tags.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// All tags, ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = (TagId, Pose3)> + '_ {
        self.ids().into_iter().filter_map(|id| self.tag_pose(id).map(|p| (id, p)))
    }

    pub fn dimensions(&self) -> Option<FieldDimensions> {
        self.dimensions
    }

    pub fn set_dimensions(&mut self, dimensions: FieldDimensions) {
        self.dimensions = Some(dimensions);
    }
}

impl FromIterator<(TagId, Pose3)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (TagId, Pose3)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (id, pose) in iter {
            map.add_tag(id, pose);
        }
        map
    }
}
