//! OTP code derivation
//!
//! This module implements HMAC-based one-time passwords (RFC 4226) and
//! their time-based variant (RFC 6238). Everything here is a pure
//! function of its inputs: raw key bytes, a counter or timestamp, and
//! the per-account [`OtpParams`]. The refresh scheduler feeds wall-clock
//! time in from the outside, so code derivation itself never touches
//! the system clock except through the explicit `*_now` conveniences.

pub mod base32;

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::models::{OtpAlgorithm, OtpParams};

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;
type HmacSha512 = Hmac<Sha512>;

/// Errors raised by code derivation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OtpError {
    /// The secret key is empty.
    #[error("secret key must not be empty")]
    EmptyKey,

    /// The requested digit count is outside the supported range.
    #[error("unsupported digit count {0} (expected 1 through 10)")]
    InvalidDigits(u8),

    /// The period is zero.
    #[error("period must be greater than zero")]
    InvalidPeriod,
}

/// Compute an HOTP code for raw key bytes and a counter value.
///
/// The counter is encoded as an 8-byte big-endian integer, fed through
/// HMAC with the configured hash, and truncated per RFC 4226 §5.3.
pub fn hotp(key: &[u8], counter: u64, params: &OtpParams) -> Result<String, OtpError> {
    if key.is_empty() {
        return Err(OtpError::EmptyKey);
    }
    params.validate()?;

    let digest = hmac_digest(key, &counter.to_be_bytes(), params.algorithm);
    Ok(truncate(&digest, params.digits))
}

/// Compute a TOTP code for an explicit unix timestamp.
pub fn totp_at(key: &[u8], unix_seconds: u64, params: &OtpParams) -> Result<String, OtpError> {
    params.validate()?;
    hotp(key, time_step_at(unix_seconds, params.period), params)
}

/// Compute a TOTP code for the current wall-clock time.
pub fn totp(key: &[u8], params: &OtpParams) -> Result<String, OtpError> {
    totp_at(key, unix_now(), params)
}

/// The time-step counter for a given unix timestamp.
pub fn time_step_at(unix_seconds: u64, period: u32) -> u64 {
    unix_seconds / u64::from(period)
}

/// Seconds left in the validity window containing `unix_seconds`.
///
/// At an exact multiple of `period` this is `period`, never 0, so a
/// countdown always runs `period → 1` before the code changes.
pub fn seconds_remaining_at(unix_seconds: u64, period: u32) -> u32 {
    let p = u64::from(period);
    (p - (unix_seconds % p)) as u32
}

/// Verify a submitted code against the window at `unix_seconds`,
/// accepting up to `drift_window` time-steps of clock skew either way.
///
/// Comparison is constant-time. Returns `Ok(false)` for codes of the
/// wrong shape rather than an error.
pub fn verify_at(
    key: &[u8],
    candidate: &str,
    drift_window: u32,
    unix_seconds: u64,
    params: &OtpParams,
) -> Result<bool, OtpError> {
    if key.is_empty() {
        return Err(OtpError::EmptyKey);
    }
    params.validate()?;

    if candidate.len() != params.digits as usize
        || !candidate.chars().all(|c| c.is_ascii_digit())
    {
        return Ok(false);
    }

    let base_step = time_step_at(unix_seconds, params.period);
    let start = base_step.saturating_sub(u64::from(drift_window));
    let end = base_step + u64::from(drift_window);

    for step in start..=end {
        let generated = hotp(key, step, params)?;
        if constant_time_eq(generated.as_bytes(), candidate.as_bytes()) {
            return Ok(true);
        }
    }

    Ok(false)
}

/// Generate a random secret of `byte_length` bytes, Base32-encoded.
///
/// Intended for provisioning new credentials and for tests; enrolment
/// itself only ever accepts Base32 text.
pub fn generate_secret(byte_length: usize) -> String {
    use rand::RngCore;

    let mut buf = vec![0u8; byte_length];
    rand::thread_rng().fill_bytes(&mut buf);
    base32::encode(&buf)
}

/// Current unix timestamp in seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Compute HMAC(key, message) with the configured hash algorithm.
fn hmac_digest(key: &[u8], message: &[u8], algorithm: OtpAlgorithm) -> Vec<u8> {
    match algorithm {
        OtpAlgorithm::Sha1 => {
            let mut mac = HmacSha1::new_from_slice(key).expect("HMAC accepts any key length");
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
        OtpAlgorithm::Sha256 => {
            let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
        OtpAlgorithm::Sha512 => {
            let mut mac = HmacSha512::new_from_slice(key).expect("HMAC accepts any key length");
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
    }
}

/// Dynamic truncation per RFC 4226 §5.3.
///
/// The low 4 bits of the final digest byte select a 4-byte window; the
/// window is read as a 31-bit big-endian integer and reduced modulo
/// `10^digits`.
fn truncate(digest: &[u8], digits: u8) -> String {
    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let binary = u32::from_be_bytes([
        digest[offset] & 0x7f,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]);

    let code = u64::from(binary) % 10u64.pow(u32::from(digits));
    format!("{:0width$}", code, width = digits as usize)
}

/// Constant-time byte comparison for code verification.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
