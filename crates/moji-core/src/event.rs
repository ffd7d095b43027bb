use serde::{Deserialize, Serialize};

use crate::session::Stage;

/// Progress signals published toward the presentation layer.
///
/// Delivery is best effort. The funnel never waits on a consumer and keeps
/// running when nobody listens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FunnelEvent {
    /// The session moved to a new stage.
    StageChanged { stage: Stage },
    /// Batch generation is working on slot `current` of `total`.
    SlotProgress { current: usize, total: usize },
    /// A batch slot exhausted its synthesis attempts and degraded to a
    /// placeholder entry.
    SlotDegraded { index: usize },
    /// A clip finished: `completed` of `total` done.
    ClipProgress {
        sticker_index: usize,
        completed: usize,
        total: usize,
    },
}
