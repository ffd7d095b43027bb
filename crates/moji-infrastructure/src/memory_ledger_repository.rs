//! In-memory ledger persistence for ephemeral runs and tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use moji_core::error::{MojiError, Result};
use moji_core::ledger::{LedgerRepository, RetryLedger};

/// Keeps ledgers in a process-local map. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryLedgerRepository {
    ledgers: Mutex<HashMap<String, RetryLedger>>,
}

impl MemoryLedgerRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerRepository for MemoryLedgerRepository {
    async fn load(&self, session_id: &str) -> Result<Option<RetryLedger>> {
        let ledgers = self
            .ledgers
            .lock()
            .map_err(|e| MojiError::internal(format!("ledger map poisoned: {e}")))?;
        Ok(ledgers.get(session_id).cloned())
    }

    async fn save(&self, session_id: &str, ledger: &RetryLedger) -> Result<()> {
        let mut ledgers = self
            .ledgers
            .lock()
            .map_err(|e| MojiError::internal(format!("ledger map poisoned: {e}")))?;
        ledgers.insert(session_id.to_string(), ledger.clone());
        Ok(())
    }
}
