//! `"openssl"` built-in backend: ChaCha20-Poly1305 with a BLAKE3-derived key.
//!
//! Pairing is fixed at `cipher=chacha20, hash=blake3`.

use std::io::IoSlice;

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use rand::RngCore;

use knet_crypto_abi::{BackendInstance, CryptoBackend, CryptoConfig, CryptoError, LogLevel};

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

struct OpensslState {
    cipher: ChaCha20Poly1305,
}

pub struct OpensslBackend;

impl OpensslBackend {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for OpensslBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CryptoBackend for OpensslBackend {
    fn abi_ver(&self) -> u32 {
        knet_crypto_abi::CRYPTO_MODEL_ABI
    }

    fn init(&self, cfg: &CryptoConfig) -> Result<BackendInstance, CryptoError> {
        cfg.validate()
            .map_err(CryptoError::InvalidConfig)?;
        if cfg.crypto_cipher_type != "chacha20" {
            return Err(CryptoError::InvalidConfig(format!(
                "openssl backend supports cipher \"chacha20\" only, got {:?}",
                cfg.crypto_cipher_type
            )));
        }
        if cfg.crypto_hash_type != "blake3" {
            return Err(CryptoError::InvalidConfig(format!(
                "openssl backend supports hash \"blake3\" only, got {:?}",
                cfg.crypto_hash_type
            )));
        }
        if cfg.private_key.is_empty() {
            return Err(CryptoError::InvalidConfig("private_key is empty".into()));
        }

        let key = blake3::hash(&cfg.private_key);
        let cipher = ChaCha20Poly1305::new_from_slice(key.as_bytes())
            .map_err(|e| CryptoError::InitFailed(e.to_string()))?;

        Ok(BackendInstance::new(
            OpensslState { cipher },
            NONCE_LEN,
            TAG_LEN,
            NONCE_LEN,
        ))
    }

    fn crypt(&self, instance: &BackendInstance, buf_in: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let state = state_of(instance)?;
        seal(&state.cipher, buf_in)
    }

    fn cryptv(
        &self,
        instance: &BackendInstance,
        iov: &[IoSlice<'_>],
    ) -> Result<Vec<u8>, CryptoError> {
        let joined: Vec<u8> = iov.iter().flat_map(|s| s.iter().copied()).collect();
        self.crypt(instance, &joined)
    }

    fn decrypt(
        &self,
        instance: &BackendInstance,
        buf_in: &[u8],
        log_level: LogLevel,
    ) -> Result<Vec<u8>, CryptoError> {
        let state = state_of(instance)?;
        open(&state.cipher, buf_in).map_err(|e| {
            let _ = log_level;
            e
        })
    }
}

fn state_of(instance: &BackendInstance) -> Result<&OpensslState, CryptoError> {
    instance.state::<OpensslState>().ok_or_else(|| {
        CryptoError::InvalidConfig("instance was not created by OpensslBackend".into())
    })
}

fn seal(cipher: &ChaCha20Poly1305, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ct = cipher
        .encrypt(nonce, Payload::from(plaintext))
        .map_err(|e| CryptoError::EncryptFailed(e.to_string()))?;

    let mut out = Vec::with_capacity(NONCE_LEN + ct.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ct);
    Ok(out)
}

fn open(cipher: &ChaCha20Poly1305, buf_in: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if buf_in.len() < NONCE_LEN + TAG_LEN {
        return Err(CryptoError::DecryptFailed);
    }
    let (nonce_bytes, ct) = buf_in.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);
    cipher
        .decrypt(nonce, Payload::from(ct))
        .map_err(|_| CryptoError::DecryptFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(key: &[u8]) -> CryptoConfig {
        CryptoConfig {
            crypto_model: "openssl".into(),
            crypto_cipher_type: "chacha20".into(),
            crypto_hash_type: "blake3".into(),
            private_key: key.to_vec(),
        }
    }

    #[test]
    fn round_trips() {
        let backend = OpensslBackend::new();
        let instance = backend.init(&cfg(b"a reasonably long shared secret")).unwrap();
        let ct = backend.crypt(&instance, b"hello link").unwrap();
        let pt = backend.decrypt(&instance, &ct, LogLevel::Err).unwrap();
        assert_eq!(pt, b"hello link");
    }

    #[test]
    fn rejects_wrong_hash() {
        let backend = OpensslBackend::new();
        let mut c = cfg(b"shared secret");
        c.crypto_hash_type = "sha256".into();
        assert!(backend.init(&c).is_err());
    }
}
