//! Credential manager
//!
//! The composition root: wires the secret store, the code engine, and
//! the refresh scheduler together, and exposes the operations the
//! presentation layer consumes. Construction loads all persisted
//! accounts before the scheduler's first tick, so the first published
//! snapshot is already populated.
//!
//! The manager is the sole writer of the account collection; the
//! scheduler only ever reads it. External callers must not reach
//! around the manager to mutate the store while the scheduler runs.

use std::sync::Arc;

use tokio::sync::{watch, RwLock};
use tracing::info;

use crate::config::EngineConfig;
use crate::core::backend::StorageBackend;
use crate::core::errors::CoreResult;
use crate::core::scheduler::RefreshScheduler;
use crate::core::store::SecretStore;
use crate::core::types::CodeSnapshot;
use crate::models::{Account, AccountSummary, OtpParams, SecretKey};

/// Composition root over a store, the engine, and the scheduler.
pub struct CredentialManager<B: StorageBackend> {
    /// Shared account collection: manager writes, scheduler reads.
    store: Arc<RwLock<SecretStore<B>>>,

    /// Owned scheduler; stopped automatically when the manager drops.
    scheduler: RefreshScheduler,

    /// Publishing side of the snapshot feed.
    feed: Arc<watch::Sender<CodeSnapshot>>,

    /// Receiver used to answer `current_snapshot`.
    snapshot_rx: watch::Receiver<CodeSnapshot>,

    config: EngineConfig,
}

impl<B: StorageBackend> std::fmt::Debug for CredentialManager<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<B: StorageBackend + 'static> CredentialManager<B> {
    /// Create a manager with default configuration, loading all
    /// persisted accounts from the backend.
    pub async fn new(backend: B) -> CoreResult<Self> {
        Self::with_config(backend, EngineConfig::default()).await
    }

    /// Create a manager with explicit configuration.
    pub async fn with_config(backend: B, config: EngineConfig) -> CoreResult<Self> {
        config.validate()?;

        let mut store = SecretStore::new(backend);
        store.load()?;
        info!(accounts = store.len(), "credential manager initialized");

        let (feed, snapshot_rx) = watch::channel(CodeSnapshot::empty(config.default_params.period));
        let mut scheduler = RefreshScheduler::new(config.default_params.period);
        scheduler.set_tick_interval(config.tick_interval());

        Ok(Self {
            store: Arc::new(RwLock::new(store)),
            scheduler,
            feed: Arc::new(feed),
            snapshot_rx,
            config,
        })
    }

    /// Start the refresh scheduler. No-op if already running.
    pub fn start(&mut self) {
        self.scheduler
            .start(Arc::clone(&self.store), Arc::clone(&self.feed));
    }

    /// Stop the refresh scheduler. No-op if idle.
    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    /// Whether the scheduler is currently running.
    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Enroll a new account from Base32 secret text, using the
    /// configured default parameters.
    ///
    /// The secret is decoded, a fresh unique id is assigned, and the
    /// record is persisted before this call returns. If the scheduler
    /// is running, the account appears in the next tick's snapshot.
    pub async fn add_account(&self, name: &str, secret_text: &str) -> CoreResult<AccountSummary> {
        self.add_account_with_params(name, secret_text, self.config.default_params)
            .await
    }

    /// Enroll a new account with explicit code derivation parameters.
    pub async fn add_account_with_params(
        &self,
        name: &str,
        secret_text: &str,
        params: OtpParams,
    ) -> CoreResult<AccountSummary> {
        let secret = SecretKey::from_base32(secret_text)?;
        let account = Account::new(name, secret).with_params(params);
        let summary = account.summary();

        self.store.write().await.add(account)?;
        info!(id = %summary.id, "account enrolled");
        Ok(summary)
    }

    /// Remove an account. Removing an absent id is a no-op; the account
    /// disappears from the next tick's snapshot.
    pub async fn remove_account(&self, id: &str) -> CoreResult<()> {
        self.store.write().await.remove(id)?;
        info!(%id, "account removed");
        Ok(())
    }

    /// All enrolled accounts as summaries, in insertion order. Key
    /// material never leaves the store.
    pub async fn list_accounts(&self) -> CoreResult<Vec<AccountSummary>> {
        let store = self.store.read().await;
        Ok(store.accounts()?.iter().map(Account::summary).collect())
    }

    /// The latest published snapshot.
    pub fn current_snapshot(&self) -> CodeSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Subscribe to the push-style snapshot feed.
    pub fn subscribe(&self) -> watch::Receiver<CodeSnapshot> {
        self.feed.subscribe()
    }
}
