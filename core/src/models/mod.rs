//! Data models for otpkeep
//!
//! This module contains the core data structures used throughout the
//! engine: enrolled accounts, their per-account OTP parameters, and the
//! wrapper type that keeps raw key material contained.

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;
use zeroize::Zeroize;

use crate::core::types::{
    DEFAULT_TOTP_DIGITS, DEFAULT_TOTP_PERIOD, MAX_ACCOUNT_NAME_LENGTH, MAX_CODE_DIGITS,
    MIN_CODE_DIGITS,
};
use crate::otp::base32;
use crate::otp::base32::DecodeError;
use crate::otp::OtpError;

/// Hash algorithm used for HMAC-based code derivation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OtpAlgorithm {
    #[default]
    Sha1,
    Sha256,
    Sha512,
}

/// Per-account code derivation parameters.
///
/// The defaults (SHA-1, 6 digits, 30 seconds) match the de-facto
/// authenticator standard; everything is configurable per account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpParams {
    /// HMAC hash algorithm.
    pub algorithm: OtpAlgorithm,

    /// Number of digits in the generated code (1 through 10).
    pub digits: u8,

    /// Validity window length in seconds.
    pub period: u32,
}

impl Default for OtpParams {
    fn default() -> Self {
        Self {
            algorithm: OtpAlgorithm::default(),
            digits: DEFAULT_TOTP_DIGITS,
            period: DEFAULT_TOTP_PERIOD,
        }
    }
}

impl OtpParams {
    /// Check that digits and period are inside the supported ranges.
    pub fn validate(&self) -> Result<(), OtpError> {
        if !(MIN_CODE_DIGITS..=MAX_CODE_DIGITS).contains(&self.digits) {
            return Err(OtpError::InvalidDigits(self.digits));
        }
        if self.period == 0 {
            return Err(OtpError::InvalidPeriod);
        }
        Ok(())
    }
}

/// Raw decoded key material.
///
/// The bytes are zeroized on drop, never appear in `Debug` output, and
/// serialize as Base32 text in the persistence format. Key material is
/// owned by the secret store and only handed to the engine transiently
/// during code computation; it must never be copied into snapshots or
/// logs.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(Vec<u8>);

impl SecretKey {
    /// Wrap already-decoded key bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Decode Base32 secret text into key material.
    pub fn from_base32(text: &str) -> Result<Self, DecodeError> {
        base32::decode(text).map(Self)
    }

    /// Borrow the raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Whether the key holds no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Canonical Base32 rendering, used by the persistence format.
    pub fn to_base32(&self) -> String {
        base32::encode(&self.0)
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey(***)")
    }
}

impl Serialize for SecretKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base32())
    }
}

impl<'de> Deserialize<'de> for SecretKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        SecretKey::from_base32(&text).map_err(serde::de::Error::custom)
    }
}

/// One enrolled credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier, assigned at creation and never reused.
    pub id: String,

    /// Human-readable display label.
    pub name: String,

    /// Raw decoded key material.
    pub secret: SecretKey,

    /// Code derivation parameters for this account.
    #[serde(default)]
    pub params: OtpParams,

    /// When this account was enrolled (Unix timestamp).
    pub created_at: i64,

    /// When this account was last modified (Unix timestamp).
    pub updated_at: i64,
}

impl Account {
    /// Create a new account with a generated id and default parameters.
    pub fn new(name: impl Into<String>, secret: SecretKey) -> Self {
        let now = Utc::now().timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            secret,
            params: OtpParams::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Builder: set code derivation parameters.
    pub fn with_params(mut self, params: OtpParams) -> Self {
        self.params = params;
        self
    }

    /// Validate the account record.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.id.trim().is_empty() {
            errors.push("id cannot be empty".to_string());
        }
        if self.name.trim().is_empty() {
            errors.push("name cannot be empty".to_string());
        }
        if self.name.len() > MAX_ACCOUNT_NAME_LENGTH {
            errors.push(format!(
                "name exceeds {MAX_ACCOUNT_NAME_LENGTH} characters"
            ));
        }
        if self.secret.is_empty() {
            errors.push("secret cannot be empty".to_string());
        }
        if let Err(e) = self.params.validate() {
            errors.push(e.to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Projection without key material, for listing.
    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

/// Listing projection of an account: identifier and label only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub id: String,
    pub name: String,
}
