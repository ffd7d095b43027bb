//! Collaborator contracts of the generation funnel.
//!
//! The funnel core treats synthesis and payment as black boxes with
//! bounded latency and possible failure. This crate defines those narrow
//! contracts and ships local placeholder implementations for development
//! and tests.

pub mod placeholder;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use moji_core::content::Theme;
use moji_core::session::{ImageRef, VideoRef};

pub use placeholder::{AutoApprovePayment, PlaceholderSynthesis};

/// Failure reported by a synthesis backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    /// The backend reached its internal limits or produced no output.
    #[error("synthesis backend failed: {0}")]
    Backend(String),
    /// The backend could not be reached at all.
    #[error("synthesis backend unavailable: {0}")]
    Unavailable(String),
}

/// Failure reported by a payment backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// The charge was actively declined.
    #[error("charge declined: {reason}")]
    Declined { reason: String },
    /// The backend could not process the request.
    #[error("payment backend failed: {0}")]
    Backend(String),
}

/// Order descriptor handed to the payment collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Identity reference of the confirmed style+texture pair.
    pub identity: String,
    pub theme: Theme,
    pub amount_cents: u32,
    /// Human-readable package summary shown on the receipt.
    pub summary: String,
}

/// Proof of a captured charge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: String,
    pub amount_cents: u32,
    pub paid_at: DateTime<Utc>,
}

/// Image and clip synthesis collaborator.
///
/// At most one call is in flight per session at any time; the funnel
/// awaits each result before issuing the next request.
#[async_trait]
pub trait SynthesisService: Send + Sync {
    /// Generates one preview image for a prompt under a seed.
    ///
    /// The same prompt and seed may legitimately yield different assets
    /// between calls; the seed only scopes one preview batch.
    async fn generate_preview(&self, prompt: &str, seed: u64) -> Result<ImageRef, SynthesisError>;

    /// Generates the static image of one batch slot.
    ///
    /// # Arguments
    ///
    /// * `identity` - reference to the confirmed style+texture pair
    /// * `index` - slot position within the batch
    /// * `caption` - display text rendered onto the sticker
    async fn generate_sticker(
        &self,
        identity: &str,
        index: usize,
        caption: &str,
    ) -> Result<ImageRef, SynthesisError>;

    /// Turns a static sticker image into a looping clip.
    async fn animate(&self, image: &ImageRef) -> Result<VideoRef, SynthesisError>;
}

/// Payment collaborator.
#[async_trait]
pub trait PaymentService: Send + Sync {
    /// Charges the order, returning a receipt or a decline.
    async fn charge(&self, order: &Order) -> Result<Receipt, PaymentError>;
}
