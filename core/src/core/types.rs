//! Core types and constants
//!
//! The snapshot types published by the refresh scheduler, plus the
//! shared constants for code derivation defaults and validation limits.

use serde::Serialize;
use std::time::Duration;

use crate::core::errors::CodeError;

/// Default validity window length in seconds.
pub const DEFAULT_TOTP_PERIOD: u32 = 30;

/// Default number of code digits.
pub const DEFAULT_TOTP_DIGITS: u8 = 6;

/// Smallest supported digit count.
pub const MIN_CODE_DIGITS: u8 = 1;

/// Largest supported digit count.
pub const MAX_CODE_DIGITS: u8 = 10;

/// Maximum account name length to prevent memory issues.
pub const MAX_ACCOUNT_NAME_LENGTH: usize = 200;

/// Wall-clock cadence of the refresh scheduler.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Outcome of code generation for one account within a snapshot.
///
/// Either a valid code string or a structured error kind; never a
/// free-form error message masquerading as a code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeState {
    /// A freshly derived code.
    Code(String),

    /// Generation failed for this account only.
    Error(CodeError),
}

impl CodeState {
    /// The code, if generation succeeded.
    pub fn code(&self) -> Option<&str> {
        match self {
            CodeState::Code(code) => Some(code),
            CodeState::Error(_) => None,
        }
    }

    /// Whether this entry is an error entry.
    pub fn is_error(&self) -> bool {
        matches!(self, CodeState::Error(_))
    }
}

/// One account's slot within a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeEntry {
    /// Id of the account this entry belongs to.
    pub account_id: String,

    /// Code or error for the current window.
    pub state: CodeState,
}

/// A complete, immutable view of all current codes.
///
/// Regenerated wholesale on every scheduler tick and replaced as a
/// unit, so readers always observe a consistent view. Entries keep the
/// store's insertion order for stable display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeSnapshot {
    /// Per-account entries, in store insertion order.
    pub entries: Vec<CodeEntry>,

    /// Seconds left in the current standard window, in `[1, period]`.
    pub seconds_remaining: u32,

    /// Length of the standard window in seconds.
    pub period: u32,

    /// Unix timestamp the snapshot was derived from (0 before the
    /// first tick).
    pub generated_at: u64,
}

impl CodeSnapshot {
    /// The snapshot published before the scheduler's first tick.
    pub fn empty(period: u32) -> Self {
        Self {
            entries: Vec::new(),
            seconds_remaining: period,
            period,
            generated_at: 0,
        }
    }

    /// Look up the entry for an account id.
    pub fn get(&self, account_id: &str) -> Option<&CodeState> {
        self.entries
            .iter()
            .find(|entry| entry.account_id == account_id)
            .map(|entry| &entry.state)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the snapshot has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
