pub mod memory_ledger_repository;
pub mod toml_ledger_repository;

pub use memory_ledger_repository::MemoryLedgerRepository;
pub use toml_ledger_repository::TomlLedgerRepository;
