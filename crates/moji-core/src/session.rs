//! Session domain model.
//!
//! A session is one end-to-end run through the generation funnel. It is
//! the "pure" state the orchestration layer operates on, independent of
//! any storage format or presentation concern.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::StyleId;
use crate::content::{StickerState, Theme};
use crate::grant::DownloadGrant;
use crate::selection::SelectionSet;

/// Stickers produced by one batch generation.
pub const BATCH_SIZE: usize = 12;

/// Stickers that must be chosen before animation may start.
pub const SUBSET_SIZE: usize = 8;

/// Media types accepted for the source photo.
pub const ACCEPTED_MEDIA_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

/// One node of the funnel's finite-state sequence.
///
/// Transitions are one-way and driven by explicit operations; the only
/// backward movements are the regeneration loops and failure reverts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Upload,
    StylesGenerating,
    StyleSelect,
    TexturesGenerating,
    TextureSelect,
    SceneSelect,
    Pay,
    BatchGenerating,
    SubsetSelect,
    AnimatingBatch,
    Done,
}

impl Stage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Done)
    }
}

/// Reference to a generated static image, resolved by the asset host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef(pub String);

/// Reference to a generated looping clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRef(pub String);

/// Metadata of the photo a user submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoUpload {
    pub file_name: String,
    pub media_type: String,
}

impl PhotoUpload {
    pub fn new(file_name: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
        }
    }

    /// Whether the declared media type is one the funnel accepts.
    pub fn is_supported(&self) -> bool {
        ACCEPTED_MEDIA_TYPES.contains(&self.media_type.as_str())
    }
}

/// A transient generated preview tied to a generation seed.
///
/// Regeneration produces a new seed and a fresh asset set; old assets are
/// replaced, not versioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewAsset {
    pub image: ImageRef,
    pub seed: u64,
}

/// A style preview paired with its catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StylePreview {
    pub style: StyleId,
    pub asset: PreviewAsset,
}

/// One item of a generated batch.
///
/// Immutable after batch creation. `image` is `None` for a slot whose
/// synthesis exhausted its attempts and degraded to a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sticker {
    pub index: usize,
    pub state: StickerState,
    pub caption: String,
    pub action: String,
    pub image: Option<ImageRef>,
}

/// A clip produced for one selected sticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimatedClip {
    pub sticker_index: usize,
    pub video: Option<VideoRef>,
}

/// One user's end-to-end run through the funnel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub stage: Stage,
    pub photo: Option<PhotoUpload>,
    pub selected_style: Option<StyleId>,
    pub selected_texture: Option<usize>,
    pub theme: Theme,
    pub style_seed: u64,
    pub texture_seed: u64,
    pub style_previews: Vec<StylePreview>,
    pub texture_previews: Vec<PreviewAsset>,
    /// Opaque reference to the confirmed style+texture pair, minted on
    /// texture confirmation and used to request the final batch.
    pub identity: Option<String>,
    pub stickers: Vec<Sticker>,
    pub subset: SelectionSet,
    pub clips: Vec<AnimatedClip>,
    pub grant: Option<DownloadGrant>,
}

impl Session {
    /// Creates a fresh session in the upload stage.
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    /// Creates a fresh session with a caller-provided id.
    ///
    /// The id keys the session's ledger, so resuming under a known id
    /// preserves the daily quota.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            stage: Stage::Upload,
            photo: None,
            selected_style: None,
            selected_texture: None,
            theme: Theme::Daily,
            style_seed: 0,
            texture_seed: 0,
            style_previews: Vec::new(),
            texture_previews: Vec::new(),
            identity: None,
            stickers: Vec::new(),
            subset: SelectionSet::new(SUBSET_SIZE),
            clips: Vec::new(),
            grant: None,
        }
    }

    /// Restores initial values, keeping the session id.
    ///
    /// The ledger is date-scoped and owned outside the session; a reset
    /// never touches it.
    pub fn reset(&mut self) {
        *self = Self::with_id(self.id.clone());
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
