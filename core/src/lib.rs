//! otpkeep core library
//!
//! This crate is the credential lifecycle engine behind otpkeep: it
//! stores named TOTP secrets, derives a fresh code for each at a fixed
//! cadence, and reports the time remaining in the current validity
//! window. Presentation and the concrete persistence medium live
//! outside the crate; persistence plugs in through the
//! [`StorageBackend`] trait and presentation consumes published
//! [`CodeSnapshot`] values.
//!
//! # Features
//!
//! - **Code derivation**: RFC 4226/6238 HOTP/TOTP over HMAC-SHA1/256/512
//! - **Secret storage**: insertion-ordered account CRUD over an
//!   injected backend, with write-before-visible atomicity
//! - **Refresh scheduling**: a drift-free 1 Hz driver publishing
//!   consistent snapshots through a watch channel
//! - **Key hygiene**: secrets are zeroized on drop, redacted from
//!   `Debug`, and never copied into snapshots or logs
//!
//! # Usage
//!
//! ```rust
//! use otpkeep_core::{CredentialManager, MemoryBackend};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> otpkeep_core::CoreResult<()> {
//! let mut manager = CredentialManager::new(MemoryBackend::new()).await?;
//! manager.add_account("alice@example.com", "JBSWY3DPEHPK3PXP").await?;
//!
//! manager.start();
//! let snapshot = manager.current_snapshot();
//! assert!(snapshot.seconds_remaining >= 1 && snapshot.seconds_remaining <= 30);
//! manager.stop();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod logging;
pub mod models;
pub mod otp;

// Re-export commonly used types for convenience
pub use crate::config::EngineConfig;
pub use crate::core::{
    CodeEntry, CodeError, CodeSnapshot, CodeState, CoreError, CoreResult, CredentialManager,
    MemoryBackend, RefreshScheduler, SecretStore, StorageBackend, StoreError, StoreResult,
    YamlFileBackend,
};
pub use crate::models::{Account, AccountSummary, OtpAlgorithm, OtpParams, SecretKey};
pub use crate::otp::base32::DecodeError;
pub use crate::otp::OtpError;

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_version() {
        assert!(VERSION.chars().next().is_some_and(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_reexports_compose() {
        // The root re-exports cover the full enrolment path
        let secret = SecretKey::from_base32("JBSWY3DPEHPK3PXP").unwrap();
        let account = Account::new("alice", secret);
        assert!(account.validate().is_ok());

        let code = otp::totp_at(account.secret.as_bytes(), 59, &account.params).unwrap();
        assert_eq!(code.len(), 6);
    }
}
