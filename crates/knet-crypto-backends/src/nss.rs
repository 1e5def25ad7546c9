//! `"nss"` built-in backend: AES-256-GCM with a SHA-256-derived key.
//!
//! Pairing is fixed at `cipher=aes256, hash=sha256`; any other
//! combination is rejected at `init` time. The historical model also
//! supported `sha1`/`md5` digests purely for HMAC framing -- this port
//! only offers `sha256`, recorded as a deliberate deviation in
//! DESIGN.md.

use std::io::IoSlice;

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;
use sha2::{Digest, Sha256};

use knet_crypto_abi::{BackendInstance, CryptoBackend, CryptoConfig, CryptoError, LogLevel};

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

struct NssState {
    cipher: Aes256Gcm,
}

pub struct NssBackend;

impl NssBackend {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for NssBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CryptoBackend for NssBackend {
    fn abi_ver(&self) -> u32 {
        knet_crypto_abi::CRYPTO_MODEL_ABI
    }

    fn init(&self, cfg: &CryptoConfig) -> Result<BackendInstance, CryptoError> {
        cfg.validate()
            .map_err(CryptoError::InvalidConfig)?;
        if cfg.crypto_cipher_type != "aes256" {
            return Err(CryptoError::InvalidConfig(format!(
                "nss backend supports cipher \"aes256\" only, got {:?}",
                cfg.crypto_cipher_type
            )));
        }
        if cfg.crypto_hash_type != "sha256" {
            return Err(CryptoError::InvalidConfig(format!(
                "nss backend supports hash \"sha256\" only, got {:?}",
                cfg.crypto_hash_type
            )));
        }
        if cfg.private_key.is_empty() {
            return Err(CryptoError::InvalidConfig("private_key is empty".into()));
        }

        let key = Sha256::digest(&cfg.private_key);
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| CryptoError::InitFailed(e.to_string()))?;

        Ok(BackendInstance::new(
            NssState { cipher },
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

fn state_of(instance: &BackendInstance) -> Result<&NssState, CryptoError> {
    instance
        .state::<NssState>()
        .ok_or_else(|| CryptoError::InvalidConfig("instance was not created by NssBackend".into()))
}

fn seal(cipher: &Aes256Gcm, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
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

fn open(cipher: &Aes256Gcm, buf_in: &[u8]) -> Result<Vec<u8>, CryptoError> {
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
            crypto_model: "nss".into(),
            crypto_cipher_type: "aes256".into(),
            crypto_hash_type: "sha256".into(),
            private_key: key.to_vec(),
        }
    }

    #[test]
    fn round_trips() {
        let backend = NssBackend::new();
        let instance = backend.init(&cfg(b"a reasonably long shared secret")).unwrap();
        let ct = backend.crypt(&instance, b"hello link").unwrap();
        let pt = backend.decrypt(&instance, &ct, LogLevel::Err).unwrap();
        assert_eq!(pt, b"hello link");
    }

    #[test]
    fn rejects_wrong_cipher() {
        let backend = NssBackend::new();
        let mut c = cfg(b"shared secret");
        c.crypto_cipher_type = "aes128".into();
        assert!(backend.init(&c).is_err());
    }

    #[test]
    fn tampered_ciphertext_fails_auth() {
        let backend = NssBackend::new();
        let instance = backend.init(&cfg(b"a reasonably long shared secret")).unwrap();
        let mut ct = backend.crypt(&instance, b"hello link").unwrap();
        let last = ct.len() - 1;
        ct[last] ^= 0xff;
        assert!(backend.decrypt(&instance, &ct, LogLevel::Debug).is_err());
    }
}
