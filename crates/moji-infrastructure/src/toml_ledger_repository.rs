//! TOML-file-backed ledger persistence.

use async_trait::async_trait;
use std::fs::{self, File};
use std::io::Write as IoWrite;
use std::path::PathBuf;

use moji_core::error::Result;
use moji_core::ledger::{LedgerRepository, RetryLedger};

/// Stores one TOML file per session under a root directory.
///
/// Writes go through a temporary file followed by an atomic rename, so a
/// crash mid-write never leaves a torn ledger behind.
pub struct TomlLedgerRepository {
    root: PathBuf,
}

impl TomlLedgerRepository {
    /// Creates a repository rooted at `root`. The directory is created
    /// lazily on first save.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Creates a repository under the platform config directory
    /// (`<config>/moji/ledger`), falling back to the current directory
    /// when the platform reports none.
    pub fn in_config_dir() -> Self {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(base.join("moji").join("ledger"))
    }

    fn ledger_path(&self, session_id: &str) -> PathBuf {
        self.root.join(format!("{session_id}.toml"))
    }
}

#[async_trait]
impl LedgerRepository for TomlLedgerRepository {
    async fn load(&self, session_id: &str) -> Result<Option<RetryLedger>> {
        let path = self.ledger_path(session_id);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        let ledger: RetryLedger = toml::from_str(&content)?;
        tracing::debug!("loaded ledger for session {session_id}: {} left", ledger.count);
        Ok(Some(ledger))
    }

    async fn save(&self, session_id: &str, ledger: &RetryLedger) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root)?;
        }

        let toml_string = toml::to_string_pretty(ledger)?;

        let path = self.ledger_path(session_id);
        let tmp_path = self.root.join(format!(".{session_id}.toml.tmp"));

        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(toml_string.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &path)?;
        tracing::debug!("saved ledger for session {session_id}");
        Ok(())
    }
}
