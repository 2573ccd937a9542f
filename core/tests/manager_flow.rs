//! End-to-end flow tests
//!
//! These tests exercise the full backend → store → manager → scheduler
//! path: accounts enrolled through the manager must show up as live
//! codes in published snapshots, removals must disappear, and a broken
//! record must never take its siblings down with it.

use std::time::Duration;

use tokio::time::timeout;

use otpkeep_core::{
    Account, CodeSnapshot, CodeState, CredentialManager, EngineConfig, MemoryBackend, SecretKey,
    YamlFileBackend,
};

const SECRET: &str = "JBSWY3DPEHPK3PXP";
const WAIT: Duration = Duration::from_secs(5);

fn fast_config() -> EngineConfig {
    EngineConfig {
        tick_millis: 10,
        ..EngineConfig::default()
    }
}

async fn next_snapshot(
    rx: &mut tokio::sync::watch::Receiver<CodeSnapshot>,
) -> CodeSnapshot {
    timeout(WAIT, rx.changed())
        .await
        .expect("timed out waiting for a snapshot")
        .expect("snapshot feed closed");
    rx.borrow().clone()
}

async fn snapshot_where(
    rx: &mut tokio::sync::watch::Receiver<CodeSnapshot>,
    mut predicate: impl FnMut(&CodeSnapshot) -> bool,
) -> CodeSnapshot {
    timeout(WAIT, async {
        loop {
            rx.changed().await.expect("snapshot feed closed");
            let snapshot = rx.borrow().clone();
            if predicate(&snapshot) {
                return snapshot;
            }
        }
    })
    .await
    .expect("timed out waiting for a matching snapshot")
}

#[tokio::test]
async fn added_account_appears_in_next_snapshot() {
    let mut manager = CredentialManager::with_config(MemoryBackend::new(), fast_config())
        .await
        .unwrap();
    let mut rx = manager.subscribe();
    manager.start();

    // First tick publishes an empty snapshot
    let first = next_snapshot(&mut rx).await;
    assert!(first.is_empty());
    assert!(first.seconds_remaining >= 1 && first.seconds_remaining <= 30);

    let summary = manager.add_account("alice@example.com", SECRET).await.unwrap();
    let snapshot = snapshot_where(&mut rx, |s| s.get(&summary.id).is_some()).await;

    let code = snapshot
        .get(&summary.id)
        .and_then(CodeState::code)
        .expect("fresh account should have a valid code");
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_digit()));

    manager.stop();
}

#[tokio::test]
async fn removed_account_disappears_from_next_snapshot() {
    let mut manager = CredentialManager::with_config(MemoryBackend::new(), fast_config())
        .await
        .unwrap();
    let keep = manager.add_account("keep", SECRET).await.unwrap();
    let removed = manager.add_account("drop", SECRET).await.unwrap();

    let mut rx = manager.subscribe();
    manager.start();
    snapshot_where(&mut rx, |s| s.len() == 2).await;

    manager.remove_account(&removed.id).await.unwrap();
    let snapshot = snapshot_where(&mut rx, |s| s.get(&removed.id).is_none()).await;
    assert!(snapshot.get(&keep.id).is_some());
    assert_eq!(snapshot.len(), 1);

    // Removing an id that never existed changes the entry set not at all
    manager.remove_account("no-such-id").await.unwrap();
    let unchanged = snapshot_where(&mut rx, |s| s.generated_at >= snapshot.generated_at).await;
    let ids = |s: &CodeSnapshot| -> Vec<String> {
        s.entries.iter().map(|e| e.account_id.clone()).collect()
    };
    assert_eq!(ids(&unchanged), ids(&snapshot));

    manager.stop();
}

#[tokio::test]
async fn corrupted_secret_yields_error_entry_without_poisoning_siblings() {
    // A record with unusable key material, as a damaged backend file
    // would produce it
    let broken = Account::new("broken", SecretKey::new(Vec::new()));
    let broken_id = broken.id.clone();
    let backend = MemoryBackend::with_accounts(vec![broken]);

    let mut manager = CredentialManager::with_config(backend, fast_config())
        .await
        .unwrap();
    let healthy = manager.add_account("healthy", SECRET).await.unwrap();

    let mut rx = manager.subscribe();
    manager.start();
    let snapshot = snapshot_where(&mut rx, |s| s.len() == 2).await;

    assert!(snapshot.get(&broken_id).is_some_and(CodeState::is_error));
    let code = snapshot
        .get(&healthy.id)
        .and_then(CodeState::code)
        .expect("sibling account must still produce a code");
    assert_eq!(code.len(), 6);

    manager.stop();
}

#[tokio::test]
async fn accounts_persist_across_manager_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accounts.yml");

    let enrolled = {
        let manager = CredentialManager::with_config(YamlFileBackend::new(&path), fast_config())
            .await
            .unwrap();
        manager.add_account("durable", SECRET).await.unwrap()
    };

    // A new manager over the same file sees the account before its
    // scheduler ever ticks
    let mut manager = CredentialManager::with_config(YamlFileBackend::new(&path), fast_config())
        .await
        .unwrap();
    let listed = manager.list_accounts().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, enrolled.id);
    assert_eq!(listed[0].name, "durable");

    let mut rx = manager.subscribe();
    manager.start();
    let snapshot = snapshot_where(&mut rx, |s| s.len() == 1).await;
    assert!(snapshot.get(&enrolled.id).is_some_and(|s| !s.is_error()));

    manager.stop();
}

#[tokio::test]
async fn failed_backend_write_rejects_enrolment_cleanly() {
    let backend = MemoryBackend::new();
    backend.set_fail_writes(true);

    let manager = CredentialManager::with_config(backend, fast_config())
        .await
        .unwrap();
    assert!(manager.add_account("a", SECRET).await.is_err());
    assert!(manager.list_accounts().await.unwrap().is_empty());
}

#[tokio::test]
async fn stopped_manager_publishes_no_further_snapshots() {
    let mut manager = CredentialManager::with_config(MemoryBackend::new(), fast_config())
        .await
        .unwrap();
    manager.add_account("a", SECRET).await.unwrap();

    let mut rx = manager.subscribe();
    manager.start();
    next_snapshot(&mut rx).await;
    manager.stop();

    // Allow an in-flight tick to complete, then expect silence
    tokio::time::sleep(Duration::from_millis(30)).await;
    let last = rx.borrow_and_update().clone();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!rx.has_changed().unwrap_or(false));
    assert_eq!(*rx.borrow(), last);
}

#[tokio::test]
async fn snapshot_countdown_stays_in_window_bounds() {
    let mut manager = CredentialManager::with_config(MemoryBackend::new(), fast_config())
        .await
        .unwrap();
    manager.add_account("a", SECRET).await.unwrap();

    let mut rx = manager.subscribe();
    manager.start();

    for _ in 0..5 {
        let snapshot = next_snapshot(&mut rx).await;
        assert!(
            snapshot.seconds_remaining >= 1 && snapshot.seconds_remaining <= snapshot.period,
            "seconds_remaining {} outside [1, {}]",
            snapshot.seconds_remaining,
            snapshot.period
        );
    }

    manager.stop();
}
