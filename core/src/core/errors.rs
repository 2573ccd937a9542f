//! Error types for the credential engine
//!
//! Two levels, mirroring the store/backend split: [`StoreError`] covers
//! persistence-backend failures, [`CoreError`] is the top-level type
//! surfaced by the store and the manager. [`CodeError`] is the small,
//! cloneable kind that stands in for a code inside a snapshot entry.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::otp::base32::DecodeError;
use crate::otp::OtpError;

/// Errors raised by persistence backends.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// General I/O failure while reading or writing records.
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Records could not be serialized or deserialized.
    #[error("serialization error: {message}")]
    Serialization { message: String },

    /// Backend-specific failure.
    #[error("backend error: {message}")]
    Backend { message: String },
}

/// Top-level errors for store and manager operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// The store has not been loaded from its backend yet.
    #[error("secret store has not been loaded")]
    NotLoaded,

    /// An account failed validation.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// An account with the same id is already enrolled.
    #[error("account with id '{id}' already exists")]
    DuplicateId { id: String },

    /// Malformed Base32 secret text.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Engine-level misconfiguration.
    #[error(transparent)]
    Otp(#[from] OtpError),

    /// Persistence failure (wrapped).
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type for backend operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Why a snapshot entry carries no code.
///
/// A structured kind rather than free-form text, so presentation layers
/// never have to distinguish a code from an error message by content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeError {
    /// The stored secret is empty or otherwise unusable.
    #[error("secret key is empty or unusable")]
    BadSecret,

    /// The account's parameters are outside the supported ranges.
    #[error("code parameters are out of range")]
    BadParameters,
}

impl From<OtpError> for CodeError {
    fn from(err: OtpError) -> Self {
        match err {
            OtpError::EmptyKey => CodeError::BadSecret,
            OtpError::InvalidDigits(_) | OtpError::InvalidPeriod => CodeError::BadParameters,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for StoreError {
    fn from(err: serde_yaml::Error) -> Self {
        StoreError::Serialization {
            message: err.to_string(),
        }
    }
}
