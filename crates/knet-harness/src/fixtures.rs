//! Fixture capture (mirrors donor's JSON fixture format, §2 ambient
//! stack note on serialization).

use serde::{Deserialize, Serialize};

/// One crypto round-trip case: install a backend, encrypt a plaintext,
/// decrypt it back, and check the result matches. Mirrors a single
/// `original_source/tests/knet_test.c` test vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureCase {
    pub name: String,
    pub spec_section: String,
    pub crypto_model: String,
    pub crypto_cipher_type: String,
    pub crypto_hash_type: String,
    pub private_key: Vec<u8>,
    pub plaintext: Vec<u8>,
    /// Whether `handle_crypto_set_config` is expected to succeed for
    /// this `(model, cipher, hash)` triple.
    pub expect_install_ok: bool,
}

/// A named collection of [`FixtureCase`]s, the unit written to/read
/// from a fixture JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureSet {
    pub cases: Vec<FixtureCase>,
}

impl FixtureSet {
    /// The built-in scenarios from `spec.md`'s end-to-end list,
    /// covering both registered backends and one deliberately unknown
    /// model.
    #[must_use]
    pub fn built_in() -> Self {
        Self {
            cases: vec![
                FixtureCase {
                    name: "nss-round-trip".into(),
                    spec_section: "scenario-1".into(),
                    crypto_model: "nss".into(),
                    crypto_cipher_type: "aes256".into(),
                    crypto_hash_type: "sha256".into(),
                    private_key: b"0123456789abcdef0123456789abcdef".to_vec(),
                    plaintext: b"the quick brown fox".to_vec(),
                    expect_install_ok: true,
                },
                FixtureCase {
                    name: "openssl-round-trip".into(),
                    spec_section: "scenario-1".into(),
                    crypto_model: "openssl".into(),
                    crypto_cipher_type: "chacha20".into(),
                    crypto_hash_type: "blake3".into(),
                    private_key: b"fedcba9876543210fedcba9876543210".to_vec(),
                    plaintext: b"jumps over the lazy dog".to_vec(),
                    expect_install_ok: true,
                },
                FixtureCase {
                    name: "unknown-model-rejected".into(),
                    spec_section: "boundary".into(),
                    crypto_model: "does-not-exist".into(),
                    crypto_cipher_type: "aes256".into(),
                    crypto_hash_type: "sha256".into(),
                    private_key: b"key".to_vec(),
                    plaintext: b"unused".to_vec(),
                    expect_install_ok: false,
                },
            ],
        }
    }
}
