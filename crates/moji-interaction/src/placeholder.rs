//! Local placeholder collaborators.
//!
//! These implementations stand in for the real synthesis and payment
//! backends during development. Asset URLs are derived deterministically
//! from the request parameters so the same request always resolves to the
//! same placeholder.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

use moji_core::session::{ImageRef, VideoRef};

use crate::{Order, PaymentError, PaymentService, Receipt, SynthesisError, SynthesisService};

const DEFAULT_BASE_URL: &str = "https://picsum.photos/400/400";

fn short_hash(value: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Synthesis stand-in producing placeholder image URLs.
#[derive(Debug, Clone)]
pub struct PlaceholderSynthesis {
    base_url: String,
}

impl PlaceholderSynthesis {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for PlaceholderSynthesis {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SynthesisService for PlaceholderSynthesis {
    async fn generate_preview(
        &self,
        prompt: &str,
        seed: u64,
    ) -> Result<ImageRef, SynthesisError> {
        log::debug!("placeholder preview: seed={seed} prompt_len={}", prompt.len());
        let url = format!(
            "{}?random=preview_{}_{}",
            self.base_url,
            seed,
            short_hash(prompt)
        );
        Ok(ImageRef(url))
    }

    async fn generate_sticker(
        &self,
        identity: &str,
        index: usize,
        caption: &str,
    ) -> Result<ImageRef, SynthesisError> {
        log::debug!("placeholder sticker: identity={identity} index={index}");
        let url = format!(
            "{}?random=sticker_{}_{}_{}",
            self.base_url,
            short_hash(identity),
            index,
            short_hash(caption)
        );
        Ok(ImageRef(url))
    }

    async fn animate(&self, image: &ImageRef) -> Result<VideoRef, SynthesisError> {
        log::debug!("placeholder clip for {}", image.0);
        let url = format!("{}?random=clip_{}", self.base_url, short_hash(&image.0));
        Ok(VideoRef(url))
    }
}

/// Payment stand-in that approves every charge.
#[derive(Debug, Clone, Default)]
pub struct AutoApprovePayment;

impl AutoApprovePayment {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PaymentService for AutoApprovePayment {
    async fn charge(&self, order: &Order) -> Result<Receipt, PaymentError> {
        log::info!(
            "auto-approving charge of {} cents for {}",
            order.amount_cents,
            order.identity
        );
        Ok(Receipt {
            id: Uuid::new_v4().to_string(),
            amount_cents: order.amount_cents,
            paid_at: Utc::now(),
        })
    }
}
