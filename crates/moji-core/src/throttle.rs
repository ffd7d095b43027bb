//! Sliding-window upload throttle.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::config::ThrottleConfig;

/// Detects abnormal upload rates and answers with a delay penalty.
///
/// The throttle keeps an ordered history of upload timestamps. Each upload
/// prunes entries older than the window, appends the new timestamp, and
/// reports the extra delay the caller should add to its processing time.
/// It never rejects an upload; the penalty is a policy signal, not a rate
/// limiter.
#[derive(Debug, Clone)]
pub struct UploadThrottle {
    window: Duration,
    max_uploads: usize,
    penalty: Duration,
    history: Vec<DateTime<Utc>>,
}

impl UploadThrottle {
    pub fn new(config: &ThrottleConfig) -> Self {
        Self {
            window: config.window,
            max_uploads: config.max_uploads,
            penalty: config.penalty,
            history: Vec::new(),
        }
    }

    /// Records an upload at `now` and returns the penalty delay.
    ///
    /// Returns the configured penalty when more than `max_uploads` uploads
    /// fall inside the window (including this one), otherwise zero.
    pub fn record(&mut self, now: DateTime<Utc>) -> Duration {
        self.history.retain(|t| {
            now.signed_duration_since(*t)
                .to_std()
                .map(|age| age <= self.window)
                .unwrap_or(false)
        });
        self.history.push(now);

        if self.history.len() > self.max_uploads {
            self.penalty
        } else {
            Duration::ZERO
        }
    }

    /// Uploads currently inside the window.
    pub fn recent_uploads(&self) -> usize {
        self.history.len()
    }

    /// Drops the recorded history.
    pub fn clear(&mut self) {
        self.history.clear();
    }
}
