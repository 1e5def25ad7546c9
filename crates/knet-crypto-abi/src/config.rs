//! Crypto configuration record handed to `CryptoBackend::init`.

use serde::{Deserialize, Serialize};

/// Upper bound on `private_key` length, matching the wire-level limit on
/// the configuration record described in the library API.
pub const MAX_KEY_LEN: usize = 4096;

/// `{ crypto_model, crypto_cipher_type, crypto_hash_type, private_key }`.
///
/// `crypto_model` selects the backend (e.g. `"nss"`, `"openssl"`);
/// `crypto_cipher_type`/`crypto_hash_type` are interpreted by that backend
/// (e.g. `"aes256"`, `"sha1"`) and may be rejected if the backend doesn't
/// support the requested pairing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CryptoConfig {
    pub crypto_model: String,
    pub crypto_cipher_type: String,
    pub crypto_hash_type: String,
    pub private_key: Vec<u8>,
}

impl CryptoConfig {
    /// Returns `Err` if `private_key` exceeds [`MAX_KEY_LEN`].
    pub fn validate(&self) -> Result<(), String> {
        if self.private_key.len() > MAX_KEY_LEN {
            return Err(format!(
                "private_key length {} exceeds MAX_KEY_LEN {}",
                self.private_key.len(),
                MAX_KEY_LEN
            ));
        }
        Ok(())
    }
}
