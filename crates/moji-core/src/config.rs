use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Sliding-window upload throttle policy.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ThrottleConfig {
    /// Window inside which uploads count toward the threshold.
    pub window: Duration,
    /// Uploads allowed inside the window before the penalty applies.
    pub max_uploads: usize,
    /// Extra processing delay once the threshold is exceeded.
    pub penalty: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(10 * 60),
            max_uploads: 10,
            penalty: Duration::from_secs(3),
        }
    }
}

/// Watermark stamped onto preview assets by the presentation layer.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct WatermarkConfig {
    pub text: String,
    pub position: String,
    pub opacity: f32,
    pub font_size: u32,
    pub color: String,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            text: "预览".to_string(),
            position: "bottom-right".to_string(),
            opacity: 0.3,
            font_size: 16,
            color: "white".to_string(),
        }
    }
}

/// Tunable parameters of the generation funnel.
///
/// The defaults are the reference product values. The config is injected
/// into the use case rather than read from ambient state, so tests can run
/// with zero delays.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct FunnelConfig {
    /// Base processing delay after a photo upload.
    pub upload_processing: Duration,
    /// Delay for a free-form regeneration of a preview set.
    pub regen_delay: Duration,
    /// Delay for the initial texture preview generation.
    pub texture_generation_delay: Duration,
    /// Pacing delay for each synthesis attempt of a batch slot.
    pub slot_attempt_delay: Duration,
    /// Per-clip rendering delay during animation.
    pub clip_render_delay: Duration,
    /// Free regenerations granted per calendar day.
    pub daily_free_retries: u32,
    /// Validity window of an issued download grant.
    pub grant_ttl: Duration,
    /// Order price in cents (CNY).
    pub price_cents: u32,
    pub throttle: ThrottleConfig,
    pub watermark: WatermarkConfig,
}

impl Default for FunnelConfig {
    fn default() -> Self {
        Self {
            upload_processing: Duration::from_secs(5),
            regen_delay: Duration::from_millis(1200),
            texture_generation_delay: Duration::from_millis(1500),
            slot_attempt_delay: Duration::from_millis(260),
            clip_render_delay: Duration::from_millis(400),
            daily_free_retries: 2,
            grant_ttl: Duration::from_secs(60 * 60),
            price_cents: 690,
            throttle: ThrottleConfig::default(),
            watermark: WatermarkConfig::default(),
        }
    }
}

impl FunnelConfig {
    /// A config with every delay zeroed. Intended for tests and benchmarks.
    pub fn without_delays() -> Self {
        Self {
            upload_processing: Duration::ZERO,
            regen_delay: Duration::ZERO,
            texture_generation_delay: Duration::ZERO,
            slot_attempt_delay: Duration::ZERO,
            clip_render_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}
