//! Persistence backends for account records
//!
//! The secret store delegates all durable I/O to a [`StorageBackend`],
//! keeping the store itself pure and letting each embedding pick its
//! own medium. Two implementations ship with the engine: an in-memory
//! backend for tests and ephemeral use, and a YAML file backend for
//! simple on-disk persistence.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::errors::{StoreError, StoreResult};
use crate::models::Account;

/// Trait for persisting account records.
///
/// Implementations must be usable from the scheduler task, hence
/// `Send + Sync`. Each operation is atomic with respect to the medium:
/// a failed `put` or `delete` must not leave a partially-updated record
/// visible to a subsequent `list`.
pub trait StorageBackend: Send + Sync {
    /// Read all persisted accounts, in their stored order.
    fn list(&self) -> StoreResult<Vec<Account>>;

    /// Persist one account, replacing any record with the same id.
    fn put(&self, account: &Account) -> StoreResult<()>;

    /// Remove the record with the given id. Removing an absent id is
    /// not an error.
    fn delete(&self, id: &str) -> StoreResult<()>;
}

/// In-memory backend for tests and ephemeral use.
///
/// Write failures can be simulated to exercise error paths.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: Mutex<Vec<Account>>,
    fail_writes: AtomicBool,
}

impl MemoryBackend {
    /// Create an empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend pre-seeded with records.
    pub fn with_accounts(accounts: Vec<Account>) -> Self {
        Self {
            records: Mutex::new(accounts),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make every subsequent `put`/`delete` fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StoreError::Backend {
                message: "simulated write failure".to_string(),
            })
        } else {
            Ok(())
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Account>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StorageBackend for MemoryBackend {
    fn list(&self) -> StoreResult<Vec<Account>> {
        Ok(self.lock().clone())
    }

    fn put(&self, account: &Account) -> StoreResult<()> {
        self.check_writable()?;
        let mut records = self.lock();
        match records.iter_mut().find(|r| r.id == account.id) {
            Some(existing) => *existing = account.clone(),
            None => records.push(account.clone()),
        }
        Ok(())
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        self.check_writable()?;
        self.lock().retain(|r| r.id != id);
        Ok(())
    }
}

/// On-disk document holding all account records.
#[derive(Debug, Serialize, Deserialize)]
struct AccountsFile {
    version: String,
    accounts: Vec<Account>,
}

const ACCOUNTS_FILE_VERSION: &str = "1.0";

/// File backend storing all accounts in a single YAML document.
///
/// Writes go to a temporary sibling file first and are moved into place
/// with a rename, so readers never observe a half-written document.
#[derive(Debug)]
pub struct YamlFileBackend {
    path: PathBuf,
}

impl YamlFileBackend {
    /// Create a backend for the given file path. The file is created on
    /// the first write; a missing file reads as an empty account list.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn read_all(&self) -> StoreResult<Vec<Account>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let contents = std::fs::read_to_string(&self.path).map_err(|e| StoreError::Io {
            message: format!("failed to read accounts file '{}': {}", self.path.display(), e),
        })?;

        let file: AccountsFile = serde_yaml::from_str(&contents)?;
        Ok(file.accounts)
    }

    fn write_all(&self, accounts: Vec<Account>) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::Io {
                    message: format!(
                        "failed to create directory for '{}': {}",
                        self.path.display(),
                        e
                    ),
                })?;
            }
        }

        let file = AccountsFile {
            version: ACCOUNTS_FILE_VERSION.to_string(),
            accounts,
        };
        let contents = serde_yaml::to_string(&file)?;

        // Write-then-rename keeps the previous document intact if the
        // write fails partway.
        let tmp_path = self.path.with_extension("yml.tmp");
        std::fs::write(&tmp_path, contents).map_err(|e| StoreError::Io {
            message: format!("failed to write '{}': {}", tmp_path.display(), e),
        })?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Io {
            message: format!("failed to replace '{}': {}", self.path.display(), e),
        })?;

        debug!(path = %self.path.display(), "accounts file written");
        Ok(())
    }
}

impl StorageBackend for YamlFileBackend {
    fn list(&self) -> StoreResult<Vec<Account>> {
        self.read_all()
    }

    fn put(&self, account: &Account) -> StoreResult<()> {
        let mut accounts = self.read_all()?;
        match accounts.iter_mut().find(|r| r.id == account.id) {
            Some(existing) => *existing = account.clone(),
            None => accounts.push(account.clone()),
        }
        self.write_all(accounts)
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        let mut accounts = self.read_all()?;
        let before = accounts.len();
        accounts.retain(|r| r.id != id);
        if accounts.len() == before {
            return Ok(());
        }
        self.write_all(accounts)
    }
}
