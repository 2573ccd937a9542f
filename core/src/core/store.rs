//! Secret store for enrolled accounts
//!
//! The store keeps all accounts in memory, in insertion order, and
//! delegates durable I/O to an injected [`StorageBackend`]. Mutations
//! persist to the backend *before* touching the in-memory collection,
//! so a failed write never leaves a half-applied record visible to
//! readers.

use tracing::debug;

use crate::core::backend::StorageBackend;
use crate::core::errors::{CoreError, CoreResult};
use crate::models::Account;

/// Durable mapping from account id to account record.
pub struct SecretStore<B: StorageBackend> {
    /// Injected persistence backend.
    backend: B,

    /// All accounts, in insertion order for stable display.
    accounts: Vec<Account>,

    /// Whether `load` has run against the backend.
    loaded: bool,
}

impl<B: StorageBackend> SecretStore<B> {
    /// Create a store over the given backend. Call [`load`](Self::load)
    /// before using it.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            accounts: Vec::new(),
            loaded: false,
        }
    }

    /// Load all persisted accounts from the backend, replacing any
    /// in-memory state.
    ///
    /// Records are loaded as-is; an account with unusable key material
    /// surfaces as an error entry in snapshots rather than failing the
    /// whole load.
    pub fn load(&mut self) -> CoreResult<()> {
        self.accounts = self.backend.list()?;
        self.loaded = true;
        debug!(count = self.accounts.len(), "accounts loaded from backend");
        Ok(())
    }

    /// Whether the store has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// All accounts in insertion order.
    pub fn accounts(&self) -> CoreResult<&[Account]> {
        if !self.loaded {
            return Err(CoreError::NotLoaded);
        }
        Ok(&self.accounts)
    }

    /// Look up an account by id.
    pub fn get(&self, id: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    /// Whether an account with the given id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Number of enrolled accounts.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether no accounts are enrolled.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Add a new account.
    ///
    /// Fails with a validation error for an empty name or secret, and
    /// with a duplicate-id error if the id is already enrolled. The
    /// record is persisted before it becomes visible in memory.
    pub fn add(&mut self, account: Account) -> CoreResult<()> {
        if !self.loaded {
            return Err(CoreError::NotLoaded);
        }

        if let Err(errors) = account.validate() {
            return Err(CoreError::Validation {
                message: errors.join("; "),
            });
        }

        if self.contains(&account.id) {
            return Err(CoreError::DuplicateId {
                id: account.id.clone(),
            });
        }

        self.backend.put(&account)?;
        debug!(id = %account.id, "account added");
        self.accounts.push(account);
        Ok(())
    }

    /// Remove an account by id. Removing an absent id is a no-op, not
    /// an error.
    pub fn remove(&mut self, id: &str) -> CoreResult<()> {
        if !self.loaded {
            return Err(CoreError::NotLoaded);
        }

        match self.accounts.iter().position(|a| a.id == id) {
            Some(index) => {
                self.backend.delete(id)?;
                self.accounts.remove(index);
                debug!(%id, "account removed");
            }
            None => {
                debug!(%id, "remove of unknown account id ignored");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::backend::MemoryBackend;
    use crate::core::errors::StoreError;
    use crate::models::SecretKey;
    use assert_matches::assert_matches;

    fn account(name: &str) -> Account {
        Account::new(name, SecretKey::from_base32("JBSWY3DPEHPK3PXP").unwrap())
    }

    fn loaded_store() -> SecretStore<MemoryBackend> {
        let mut store = SecretStore::new(MemoryBackend::new());
        store.load().unwrap();
        store
    }

    #[test]
    fn test_operations_require_load() {
        let mut store = SecretStore::new(MemoryBackend::new());
        assert!(!store.is_loaded());
        assert_matches!(store.accounts(), Err(CoreError::NotLoaded));
        assert_matches!(store.add(account("a")), Err(CoreError::NotLoaded));
        assert_matches!(store.remove("a"), Err(CoreError::NotLoaded));
    }

    #[test]
    fn test_load_reads_persisted_accounts() {
        let existing = account("existing");
        let backend = MemoryBackend::with_accounts(vec![existing.clone()]);

        let mut store = SecretStore::new(backend);
        store.load().unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&existing.id).unwrap().name, "existing");
    }

    #[test]
    fn test_add_and_remove() {
        let mut store = loaded_store();
        let a = account("a");
        let id = a.id.clone();

        store.add(a).unwrap();
        assert!(store.contains(&id));
        assert_eq!(store.len(), 1);

        store.remove(&id).unwrap();
        assert!(!store.contains(&id));
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_rejects_duplicates() {
        let mut store = loaded_store();
        let a = account("a");
        let duplicate = a.clone();

        store.add(a).unwrap();
        assert_matches!(store.add(duplicate), Err(CoreError::DuplicateId { .. }));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_add_rejects_invalid_accounts() {
        let mut store = loaded_store();

        assert_matches!(
            store.add(account("   ")),
            Err(CoreError::Validation { .. })
        );
        assert_matches!(
            store.add(Account::new("a", SecretKey::new(Vec::new()))),
            Err(CoreError::Validation { .. })
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_absent_id_is_noop() {
        let mut store = loaded_store();
        store.add(account("a")).unwrap();

        store.remove("not-an-id").unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_insertion_order_is_preserved() {
        let mut store = loaded_store();
        let names = ["first", "second", "third"];
        let mut ids = Vec::new();

        for name in names {
            let a = account(name);
            ids.push(a.id.clone());
            store.add(a).unwrap();
        }

        store.remove(&ids[1]).unwrap();
        store.add(account("fourth")).unwrap();

        let ordered: Vec<_> = store
            .accounts()
            .unwrap()
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(ordered, vec!["first", "third", "fourth"]);
    }

    #[test]
    fn test_failed_put_leaves_store_unchanged() {
        let backend = MemoryBackend::new();
        backend.set_fail_writes(true);

        let mut store = SecretStore::new(backend);
        store.load().unwrap();

        let result = store.add(account("a"));
        assert_matches!(
            result,
            Err(CoreError::Store(StoreError::Backend { .. }))
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_failed_delete_keeps_account() {
        let backend = MemoryBackend::new();
        let mut store = SecretStore::new(backend);
        store.load().unwrap();

        let a = account("a");
        let id = a.id.clone();
        store.add(a).unwrap();

        store.backend.set_fail_writes(true);
        assert_matches!(
            store.remove(&id),
            Err(CoreError::Store(StoreError::Backend { .. }))
        );
        assert!(store.contains(&id));
    }
}
