//! Daily free-regeneration quota.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Outcome of consuming one regeneration from the ledger.
///
/// Exhaustion is not an error. A regeneration is never blocked; an empty
/// ledger only changes who pays for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryGrant {
    /// Covered by the daily free quota.
    Granted,
    /// Quota exhausted; the regeneration must be billed externally.
    Billable,
}

/// Per-day counter of free regenerations.
///
/// The counter is scoped to a calendar day. Reading or consuming it on a
/// later date first resets the count to the daily quota. The current date
/// is always passed in by the caller, never read from ambient state, so
/// rollover behavior is directly testable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryLedger {
    pub date: NaiveDate,
    pub count: u32,
    pub daily_quota: u32,
}

impl RetryLedger {
    /// Creates a full ledger for the given day.
    pub fn new(today: NaiveDate, daily_quota: u32) -> Self {
        Self {
            date: today,
            count: daily_quota,
            daily_quota,
        }
    }

    fn roll(&mut self, today: NaiveDate) {
        if self.date != today {
            self.date = today;
            self.count = self.daily_quota;
        }
    }

    /// Remaining free regenerations for `today`, applying date rollover.
    pub fn peek(&mut self, today: NaiveDate) -> u32 {
        self.roll(today);
        self.count
    }

    /// Consumes one free regeneration if any remain.
    ///
    /// Returns [`RetryGrant::Billable`] when the quota is already spent;
    /// the caller proceeds either way.
    pub fn consume(&mut self, today: NaiveDate) -> RetryGrant {
        self.roll(today);
        if self.count > 0 {
            self.count -= 1;
            RetryGrant::Granted
        } else {
            RetryGrant::Billable
        }
    }
}

/// An abstract store for per-session ledgers.
///
/// Keyed by session identity so a shared deployment cannot leak quota
/// between sessions. The single-session runtime simply uses one key.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Loads the ledger for a session.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(ledger))`: a ledger was previously saved
    /// - `Ok(None)`: no ledger stored for this session
    async fn load(&self, session_id: &str) -> Result<Option<RetryLedger>>;

    /// Persists the ledger for a session.
    async fn save(&self, session_id: &str, ledger: &RetryLedger) -> Result<()>;
}
