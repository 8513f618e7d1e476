// tagvision_core/src/error.rs

use thiserror::Error;

/// Setup-time failures. Nothing in the per-frame path returns one of these;
/// a frame that cannot be used is skipped, not reported.
#[derive(Debug, Error)]
pub enum VisionError {
    /// A rotation matrix that is not orthonormal or is a reflection.
    #[error("degenerate rotation matrix: {0}")]
    DegenerateRotation(String),

    /// A quaternion that cannot be normalized.
    #[error("invalid quaternion (w={w}, x={x}, y={y}, z={z})")]
    InvalidQuaternion { w: f64, x: f64, y: f64, z: f64 },

    /// A translation with NaN or infinite components.
    #[error("non-finite translation [{x}, {y}, {z}]")]
    NonFiniteTranslation { x: f64, y: f64, z: f64 },

    /// The field layout document could not be parsed.
    #[error("malformed field layout: {0}")]
    Layout(#[from] serde_json::Error),

    /// A tag entry inside a field layout is unusable.
    #[error("field layout tag {id}: {source}")]
    LayoutTag {
        id: u32,
        #[source]
        source: Box<VisionError>,
    },
}

impl VisionError {
    pub fn degenerate_rotation(reason: impl Into<String>) -> Self {
        Self::DegenerateRotation(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, VisionError>;
