//! Receive-path decryptor (C5, §4.5).
//!
//! Tries the `in_use` instance first; on failure, sequentially tries
//! every other installed instance; demotes log severity to `Debug` while
//! alternates remain (staged-rekey is the expected reason for a miss),
//! and reports at `Err` severity on the final attempt.

use knet_crypto_abi::{CryptoError, LogLevel as BackendLogLevel};

use crate::crypto_instance::CryptoInstanceManager;
use crate::error::KnetError;

/// Successful result of [`authenticate_and_decrypt`], carrying which
/// slot actually produced the plaintext -- §9's Open Question resolution
/// (return the last alternate's error for compatibility, but also expose
/// the slot that succeeded/failed last as structured data).
#[derive(Debug, Clone)]
pub struct DecryptOutcome {
    pub plaintext: Vec<u8>,
    pub slot: u8,
    /// Severity the attempt that produced `plaintext` was logged at.
    pub log_level: BackendLogLevel,
}

/// `authenticate_and_decrypt`, §4.5 steps 1–6.
///
/// Precondition (documented, not enforced by a panic): at least one
/// instance is installed. With none installed this returns
/// `KnetError::Configuration`, matching the "precondition violation
/// caught by caller contract" boundary case in §8.
pub fn authenticate_and_decrypt(
    mgr: &CryptoInstanceManager,
    buf_in: &[u8],
) -> Result<DecryptOutcome, KnetError> {
    let installed = mgr.installed_count();
    if installed == 0 {
        return Err(KnetError::Configuration(
            "authenticate_and_decrypt: no crypto instances installed".into(),
        ));
    }

    let log_level = if installed > 1 {
        BackendLogLevel::Debug
    } else {
        BackendLogLevel::Err
    };

    let in_use_slot = mgr.in_use();
    let mut last_err: Option<CryptoError> = None;
    let mut last_slot: u8 = in_use_slot;

    if in_use_slot != 0 {
        if let Some(instance) = mgr.get(in_use_slot) {
            match instance
                .backend()
                .decrypt(instance.backend_instance(), buf_in, log_level)
            {
                Ok(plaintext) => {
                    return Ok(DecryptOutcome {
                        plaintext,
                        slot: in_use_slot,
                        log_level,
                    });
                }
                Err(e) => last_err = Some(e),
            }
        }
    }

    for slot in mgr.occupied_slots() {
        if slot == in_use_slot {
            continue;
        }
        let Some(instance) = mgr.get(slot) else {
            continue;
        };
        match instance
            .backend()
            .decrypt(instance.backend_instance(), buf_in, BackendLogLevel::Err)
        {
            Ok(plaintext) => {
                return Ok(DecryptOutcome {
                    plaintext,
                    slot,
                    log_level: BackendLogLevel::Err,
                });
            }
            Err(e) => {
                last_err = Some(e);
                last_slot = slot;
            }
        }
    }

    Err(KnetError::DecryptExhausted {
        source: last_err.unwrap_or(CryptoError::DecryptFailed),
        failed_slot: last_slot,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::send::encrypt_and_sign;
    use knet_crypto_abi::CryptoConfig;

    fn nss(key: &[u8]) -> CryptoConfig {
        CryptoConfig {
            crypto_model: "nss".into(),
            crypto_cipher_type: "aes256".into(),
            crypto_hash_type: "sha256".into(),
            private_key: key.to_vec(),
        }
    }

    #[test]
    fn p4_round_trip_same_slot() {
        let mut mgr = CryptoInstanceManager::new();
        mgr.init(&nss(b"key-one-key-one-key-one-key-one"), 1).unwrap();
        let ct = encrypt_and_sign(&mgr, b"Hello world!").unwrap();
        let out = authenticate_and_decrypt(&mgr, &ct).unwrap();
        assert_eq!(out.plaintext, b"Hello world!");
        assert_eq!(out.slot, 1);
    }

    #[test]
    fn scenario_2_alternate_slot_succeeds_with_debug_level() {
        let mut mgr = CryptoInstanceManager::new();
        mgr.init(&nss(b"slot-one-key-slot-one-key-12345"), 1).unwrap();
        let ct_from_peer = encrypt_and_sign(&mgr, b"still on old key").unwrap();

        mgr.init(&nss(b"slot-two-key-slot-two-key-67890"), 2).unwrap();
        mgr.use_config(2).unwrap();

        let out = authenticate_and_decrypt(&mgr, &ct_from_peer).unwrap();
        assert_eq!(out.plaintext, b"still on old key");
        assert_eq!(out.slot, 1);
        assert_eq!(out.log_level, BackendLogLevel::Debug);
    }

    #[test]
    fn scenario_4_slot_torn_down_falls_through_to_remaining_slot_error() {
        let mut mgr = CryptoInstanceManager::new();
        mgr.init(&nss(b"slot-one-key-slot-one-key-12345"), 1).unwrap();
        let ct_from_slot_one = encrypt_and_sign(&mgr, b"payload").unwrap();

        mgr.init(&nss(b"slot-two-key-slot-two-key-67890"), 2).unwrap();
        mgr.use_config(2).unwrap();
        mgr.fini(1).unwrap();

        let result = authenticate_and_decrypt(&mgr, &ct_from_slot_one);
        assert!(result.is_err());
    }

    #[test]
    fn no_installed_instances_is_a_precondition_error() {
        let mgr = CryptoInstanceManager::new();
        assert!(authenticate_and_decrypt(&mgr, b"anything").is_err());
    }
}
