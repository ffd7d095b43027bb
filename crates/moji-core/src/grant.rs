//! Time-bounded download grants.

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Length of the opaque grant token.
const TOKEN_LEN: usize = 32;

/// A short-lived retrieval token for the final asset archive.
///
/// The grant only carries the expiry arithmetic; enforcement happens at the
/// external asset host that resolves the token. There is no renewal. After
/// expiry a consumer asks for a fresh grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadGrant {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl DownloadGrant {
    /// Mints a grant valid for `ttl` from `now`.
    ///
    /// The token is drawn from a space large enough that uniqueness holds
    /// by construction.
    pub fn issue<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>, ttl: Duration) -> Self {
        let token: String = rng
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect();

        Self {
            token,
            issued_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Renders the retrieval URL understood by the asset host.
    pub fn retrieval_url(&self, base: &str) -> String {
        format!(
            "{}/download?token={}&expires={}",
            base.trim_end_matches('/'),
            self.token,
            self.expires_at.timestamp_millis()
        )
    }
}
