//! Credential hashing - PBKDF2-HMAC-SHA256
//!
//! Account passwords are stored as a 48-byte blob: a fresh 16-byte salt
//! followed by the 32-byte derived key. Verification re-derives with the
//! embedded salt and compares keys in constant time. A blob of any other
//! length is malformed input and reported as such, never treated as a
//! silent mismatch.

use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Salt bytes stored at the front of the blob
pub const SALT_LEN: usize = 16;

/// Derived key bytes stored after the salt
pub const KEY_LEN: usize = 32;

/// Full credential blob length
pub const BLOB_LEN: usize = SALT_LEN + KEY_LEN;

/// PBKDF2 iteration count
pub const PBKDF2_ITERATIONS: u32 = 100_000;

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Invalid credential format: expected 48 bytes, got {0}")]
    InvalidFormat(usize),
}

/// Hash a password with a fresh random salt. The result is `salt || key`.
pub fn hash_password(password: &str) -> [u8; BLOB_LEN] {
    let mut blob = [0u8; BLOB_LEN];
    let (salt, key) = blob.split_at_mut(SALT_LEN);
    OsRng.fill_bytes(salt);
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, key);
    blob
}

/// Verify a password against a stored blob in constant time.
pub fn verify_password(password: &str, blob: &[u8]) -> Result<bool, CredentialError> {
    if blob.len() != BLOB_LEN {
        return Err(CredentialError::InvalidFormat(blob.len()));
    }
    let (salt, stored_key) = blob.split_at(SALT_LEN);
    let mut candidate = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut candidate);
    Ok(candidate[..].ct_eq(stored_key).into())
}
