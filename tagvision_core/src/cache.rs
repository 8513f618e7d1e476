// tagvision_core/src/cache.rs

use arc_swap::ArcSwapOption;
use std::sync::Arc;

use crate::messages::FrameResult;
use crate::types::FrameSource;

/// Holds the most recent camera frame.
///
/// One writer (the camera side) replaces the snapshot, any number of readers
/// take it. A publish is a single pointer swap, so a reader gets either the
/// old frame or the new one in full, and a snapshot it already holds never
/// changes underneath it. Neither side ever blocks.
#[derive(Debug, Default)]
pub struct DetectionCache {
    current: ArcSwapOption<FrameResult>,
}

impl DetectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current snapshot.
    pub fn publish(&self, frame: FrameResult) {
        self.publish_shared(Arc::new(frame));
    }

    pub fn publish_shared(&self, frame: Arc<FrameResult>) {
        tracing::trace!(
            timestamp = frame.timestamp(),
            detections = frame.detections().len(),
            "publishing frame"
        );
        self.current.store(Some(frame));
    }

    /// The latest published snapshot, or `None` before the first publish.
    pub fn current(&self) -> Option<Arc<FrameResult>> {
        self.current.load_full()
    }

    /// Capture time of the current snapshot.
    pub fn timestamp(&self) -> Option<f64> {
        self.current.load().as_ref().map(|f| f.timestamp())
    }

    /// Pipeline latency of the current snapshot in milliseconds.
    pub fn latency_ms(&self) -> Option<f64> {
        self.current.load().as_ref().map(|f| f.latency_ms())
    }

    /// Validity flag of the current snapshot; `false` when there is none.
    pub fn has_targets(&self) -> bool {
        self.current.load().as_ref().is_some_and(|f| f.has_targets())
    }

    /// Drops the current snapshot, returning to the "no data yet" state.
    pub fn clear(&self) {
        self.current.store(None);
    }
}

impl FrameSource for DetectionCache {
    fn latest_result(&self) -> Option<Arc<FrameResult>> {
        self.current()
    }
}
