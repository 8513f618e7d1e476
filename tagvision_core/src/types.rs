// tagvision_core/src/types.rs

use std::sync::Arc;

use crate::messages::FrameResult;

// --- Core Identifier ---
/// Fiducial identifier as decoded by the camera pipeline.
pub type TagId = u32;

// --- Core Trait for Camera Feeds ---
// The estimator only ever needs "what is the newest frame"; anything that can
// answer that (a network subscriber, a recorded log, a simulated camera) plugs in here.
pub trait FrameSource: Send + Sync {
    /// The most recent frame, or `None` if the feed has produced nothing yet.
    /// Must not block.
    fn latest_result(&self) -> Option<Arc<FrameResult>>;
}
