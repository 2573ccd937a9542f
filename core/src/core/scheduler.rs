//! Refresh scheduler
//!
//! A single periodic driver that recomputes every account's code once
//! per second of wall-clock time and publishes the result as a fresh
//! [`CodeSnapshot`]. The scheduler reads the clock anew on every tick
//! rather than accumulating elapsed intervals, so timer jitter can
//! never drift the codes away from real time.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::core::backend::StorageBackend;
use crate::core::store::SecretStore;
use crate::core::types::{CodeEntry, CodeSnapshot, CodeState, DEFAULT_TICK_INTERVAL};
use crate::models::Account;
use crate::otp;

/// Periodic driver for code recomputation.
///
/// Two states: idle (no timer) and running (timer active). `start`
/// while running and `stop` while idle are no-ops. One instance lives
/// for the lifetime of its owning manager; there is no global timer
/// state.
pub struct RefreshScheduler {
    /// Standard window length used for the snapshot countdown.
    period: u32,

    /// Wall-clock cadence of ticks. One second in production;
    /// shortened in tests.
    tick_interval: Duration,

    /// Handle of the running tick task, if any.
    handle: Option<JoinHandle<()>>,

    /// Signals the tick task to stop.
    shutdown: Option<watch::Sender<bool>>,
}

impl RefreshScheduler {
    /// Create an idle scheduler for the given standard period.
    pub fn new(period: u32) -> Self {
        Self {
            period,
            tick_interval: DEFAULT_TICK_INTERVAL,
            handle: None,
            shutdown: None,
        }
    }

    /// Override the tick cadence. Only takes effect on the next
    /// `start`.
    pub fn set_tick_interval(&mut self, interval: Duration) {
        self.tick_interval = interval;
    }

    /// Whether the timer is currently active.
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Begin ticking. The first tick fires immediately, so a freshly
    /// started scheduler publishes a populated snapshot right away.
    ///
    /// Calling `start` while already running is a no-op.
    pub fn start<B>(
        &mut self,
        store: Arc<RwLock<SecretStore<B>>>,
        feed: Arc<watch::Sender<CodeSnapshot>>,
    ) where
        B: StorageBackend + 'static,
    {
        if self.handle.is_some() {
            debug!("refresh scheduler already running");
            return;
        }

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let tick_interval = self.tick_interval;
        let period = self.period;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick_interval);

            loop {
                tokio::select! {
                    biased;

                    _ = shutdown_rx.changed() => {
                        debug!("refresh scheduler stopping");
                        break;
                    }
                    _ = interval.tick() => {
                        // Wall-clock time, read fresh every tick.
                        let now = otp::unix_now();
                        let store = store.read().await;
                        match store.accounts() {
                            Ok(accounts) => {
                                feed.send_replace(compute_snapshot(accounts, now, period));
                            }
                            Err(err) => {
                                // Fatal to this tick only; the previous
                                // snapshot stays published and the next
                                // tick retries.
                                warn!("skipping refresh tick: {err}");
                            }
                        }
                    }
                }
            }
        });

        self.handle = Some(handle);
        self.shutdown = Some(shutdown_tx);
        debug!(?tick_interval, "refresh scheduler started");
    }

    /// Stop ticking. An in-flight tick runs to completion; no tick
    /// starts afterwards. Calling `stop` while idle is a no-op.
    pub fn stop(&mut self) {
        let Some(shutdown) = self.shutdown.take() else {
            return;
        };
        let _ = shutdown.send(true);
        self.handle.take();
        debug!("refresh scheduler stopped");
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Derive a snapshot for the given accounts at the given timestamp.
///
/// A failure for one account becomes that account's error entry and
/// never affects its siblings.
pub(crate) fn compute_snapshot(accounts: &[Account], now: u64, period: u32) -> CodeSnapshot {
    let entries = accounts
        .iter()
        .map(|account| {
            let state = match otp::totp_at(account.secret.as_bytes(), now, &account.params) {
                Ok(code) => CodeState::Code(code),
                Err(err) => {
                    debug!(account = %account.id, "code generation failed: {err}");
                    CodeState::Error(err.into())
                }
            };
            CodeEntry {
                account_id: account.id.clone(),
                state,
            }
        })
        .collect();

    CodeSnapshot {
        entries,
        seconds_remaining: otp::seconds_remaining_at(now, period),
        period,
        generated_at: now,
    }
}
