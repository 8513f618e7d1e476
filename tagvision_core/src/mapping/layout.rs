// tagvision_core/src/mapping/layout.rs

//! Reading and writing the JSON field-layout documents published for FRC fields.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VisionError};
use crate::geometry::RigidTransform;
use crate::mapping::FieldMap;
use crate::types::TagId;

/// Outer size of the field in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldDimensions {
    pub length: f64,
    pub width: f64,
}

// --- Document schema ---

#[derive(Debug, Serialize, Deserialize)]
struct LayoutDocument {
    tags: Vec<LayoutTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    field: Option<FieldDimensions>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LayoutTag {
    #[serde(rename = "ID")]
    id: TagId,
    pose: LayoutPose,
}

#[derive(Debug, Serialize, Deserialize)]
struct LayoutPose {
    translation: LayoutTranslation,
    rotation: LayoutRotation,
}

#[derive(Debug, Serialize, Deserialize)]
struct LayoutTranslation {
    x: f64,
    y: f64,
    z: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct LayoutRotation {
    quaternion: LayoutQuaternion,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct LayoutQuaternion {
    w: f64,
    x: f64,
    y: f64,
    z: f64,
}

impl LayoutTag {
    fn to_pose(&self) -> Result<RigidTransform> {
        let t = &self.pose.translation;
        let q = &self.pose.rotation.quaternion;
        RigidTransform::try_from_quaternion(q.w, q.x, q.y, q.z, Vector3::new(t.x, t.y, t.z))
            .map_err(|source| VisionError::LayoutTag {
                id: self.id,
                source: Box::new(source),
            })
    }

    fn from_pose(id: TagId, pose: &RigidTransform) -> Self {
        let t = pose.translation();
        let q = pose.rotation().into_inner();
        Self {
            id,
            pose: LayoutPose {
                translation: LayoutTranslation {
                    x: t.x,
                    y: t.y,
                    z: t.z,
                },
                rotation: LayoutRotation {
                    quaternion: LayoutQuaternion {
                        w: q.w,
                        x: q.i,
                        y: q.j,
                        z: q.k,
                    },
                },
            },
        }
    }
}

impl FieldMap {
    /// Parses a field layout. Any malformed tag rejects the whole document.
    pub fn from_layout_json(json: &str) -> Result<Self> {
        let doc: LayoutDocument = serde_json::from_str(json)?;

        let mut map = FieldMap::new();
        for tag in &doc.tags {
            let pose = tag.to_pose()?;
            if map.add_tag(tag.id, pose).is_some() {
                tracing::warn!(tag_id = tag.id, "duplicate tag in field layout, keeping the last entry");
            }
        }
        if let Some(dimensions) = doc.field {
            map.set_dimensions(dimensions);
        }

        tracing::debug!(tags = map.len(), "loaded field layout");
        Ok(map)
    }

    pub fn to_layout_json(&self) -> Result<String> {
        let doc = LayoutDocument {
            tags: self
                .iter()
                .map(|(id, pose)| LayoutTag::from_pose(id, &pose))
                .collect(),
            field: self.dimensions(),
        };
        Ok(serde_json::to_string_pretty(&doc)?)
    }
}
