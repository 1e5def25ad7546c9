//! Crypto instance manager (C3, §4.3).
//!
//! Holds the dense slot table, the distinguished `in_use` slot, and the
//! handle-wide derived sizes. Every mutating operation here runs under
//! the handle's write lock (see [`crate::handle::Handle`]); readers on
//! the send/receive path take a clone of an `Arc<CryptoInstance>` under
//! a brief read lock and then do the actual crypto work lock-free, which
//! is what gives P7 (no torn reads across a same-slot reinstall) for
//! free: a reader either holds the pre-swap `Arc` or the post-swap one,
//! never a mix.

use std::sync::Arc;

use knet_crypto_abi::{CryptoBackend, CryptoConfig};

use crate::error::KnetError;

/// Upper bound on slot id. Slot 0 is reserved to mean "no slot" /
/// "all slots" depending on context (§4.3).
pub const MAX_CRYPTO_INSTANCES: usize = 8;

/// An installed, immutable-once-published crypto instance (§3).
pub struct CryptoInstance {
    pub backend_name: String,
    backend: Arc<dyn CryptoBackend>,
    instance: knet_crypto_abi::BackendInstance,
}

impl CryptoInstance {
    #[must_use]
    pub fn sec_block_size(&self) -> usize {
        self.instance.sec_block_size
    }

    #[must_use]
    pub fn sec_hash_size(&self) -> usize {
        self.instance.sec_hash_size
    }

    #[must_use]
    pub fn sec_salt_size(&self) -> usize {
        self.instance.sec_salt_size
    }

    #[must_use]
    pub fn backend(&self) -> &Arc<dyn CryptoBackend> {
        &self.backend
    }

    #[must_use]
    pub fn backend_instance(&self) -> &knet_crypto_abi::BackendInstance {
        &self.instance
    }
}

/// Handle-wide sizes derived from the `in_use` instance (zero when
/// `in_use == 0`), per I5.
#[derive(Debug, Clone, Copy, Default)]
pub struct DerivedSizes {
    pub sec_block_size: usize,
    pub sec_hash_size: usize,
    pub sec_salt_size: usize,
}

/// The slot table plus `in_use` and derived sizes (§3, §4.3).
pub struct CryptoInstanceManager {
    slots: Vec<Option<Arc<CryptoInstance>>>,
    in_use: u8,
    sizes: DerivedSizes,
}

impl Default for CryptoInstanceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl CryptoInstanceManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: vec![None; MAX_CRYPTO_INSTANCES + 1],
            in_use: 0,
            sizes: DerivedSizes::default(),
        }
    }

    #[must_use]
    pub fn in_use(&self) -> u8 {
        self.in_use
    }

    #[must_use]
    pub fn sizes(&self) -> DerivedSizes {
        self.sizes
    }

    /// Clone of the slot at `slot`, or `None` if empty. `slot == 0`
    /// always returns `None`.
    #[must_use]
    pub fn get(&self, slot: u8) -> Option<Arc<CryptoInstance>> {
        self.slots.get(slot as usize).and_then(|s| s.clone())
    }

    /// Clone of the `in_use` instance, or `None` if `in_use == 0`.
    #[must_use]
    pub fn get_in_use(&self) -> Option<Arc<CryptoInstance>> {
        self.get(self.in_use)
    }

    /// Count of occupied slots in `[1, MAX]`, used by C5 to pick the
    /// log-level demotion threshold.
    #[must_use]
    pub fn installed_count(&self) -> usize {
        self.slots[1..].iter().filter(|s| s.is_some()).count()
    }

    /// Slot ids (not `in_use`) currently occupied, in ascending order.
    #[must_use]
    pub fn occupied_slots(&self) -> Vec<u8> {
        (1..=MAX_CRYPTO_INSTANCES as u8)
            .filter(|&s| self.slots[s as usize].is_some())
            .collect()
    }

    fn validate_slot(slot: u8) -> Result<usize, KnetError> {
        if slot == 0 || slot as usize > MAX_CRYPTO_INSTANCES {
            return Err(KnetError::Configuration(format!(
                "slot {slot} out of range [1, {MAX_CRYPTO_INSTANCES}]"
            )));
        }
        Ok(slot as usize)
    }

    /// §4.3 `use_config`.
    pub fn use_config(&mut self, slot: u8) -> Result<(), KnetError> {
        let idx = Self::validate_slot(slot)?;
        if self.slots[idx].is_none() {
            return Err(KnetError::Configuration(format!("slot {slot} is empty")));
        }
        self.in_use = slot;
        self.sizes = self.derive_sizes_for(slot);
        Ok(())
    }

    fn derive_sizes_for(&self, slot: u8) -> DerivedSizes {
        match self.get(slot) {
            Some(inst) => DerivedSizes {
                sec_block_size: inst.sec_block_size(),
                sec_hash_size: inst.sec_hash_size(),
                sec_salt_size: inst.sec_salt_size(),
            },
            None => DerivedSizes::default(),
        }
    }

    /// §4.3 `init`. Caller must already hold the handle's write lock.
    pub fn init(&mut self, cfg: &CryptoConfig, slot: u8) -> Result<(), KnetError> {
        let idx = Self::validate_slot(slot)?;

        let backend = knet_crypto_registry::get_model(&cfg.crypto_model).map_err(|e| match e {
            knet_crypto_registry::RegistryError::UnknownModel(_) => {
                KnetError::UnsupportedBackend(e.to_string())
            }
            knet_crypto_registry::RegistryError::AbiMismatch { .. } => {
                KnetError::Configuration(e.to_string())
            }
        })?;

        let backend_instance = backend.init(cfg)?;
        let new_instance = Arc::new(CryptoInstance {
            backend_name: cfg.crypto_model.clone(),
            backend: Arc::clone(&backend),
            instance: backend_instance,
        });

        if let Some(mut old) = self.slots[idx].take() {
            if let Some(old_ref) = Arc::get_mut(&mut old) {
                backend.fini(&mut old_ref.instance);
            }
            // If a reader elsewhere still holds a clone, `fini` runs (if
            // ever) when that last clone is dropped. Both built-in
            // backends have a no-op `fini`, so this never currently
            // matters in practice.
        }

        self.slots[idx] = Some(new_instance);

        if self.in_use == 0 || self.in_use == slot {
            self.sizes = self.derive_sizes_for(slot);
        }
        if self.in_use == 0 {
            self.in_use = slot;
        }

        Ok(())
    }

    /// §4.3 `fini`. `slot == 0` means "all slots". Caller must already
    /// hold the handle's write lock.
    pub fn fini(&mut self, slot: u8) -> Result<(), KnetError> {
        if slot == 0 {
            for s in 1..=MAX_CRYPTO_INSTANCES as u8 {
                self.teardown_one(s);
            }
            self.in_use = 0;
            self.sizes = DerivedSizes::default();
            return Ok(());
        }

        let idx = Self::validate_slot(slot)?;
        self.teardown_one(slot);
        if self.in_use as usize == idx {
            self.in_use = 0;
            self.sizes = DerivedSizes::default();
        }
        Ok(())
    }

    fn teardown_one(&mut self, slot: u8) {
        let idx = slot as usize;
        if let Some(mut old) = self.slots[idx].take() {
            if let Some(old_ref) = Arc::get_mut(&mut old) {
                old_ref.backend.fini(&mut old_ref.instance);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(model: &str, cipher: &str, hash: &str, key: &[u8]) -> CryptoConfig {
        CryptoConfig {
            crypto_model: model.into(),
            crypto_cipher_type: cipher.into(),
            crypto_hash_type: hash.into(),
            private_key: key.to_vec(),
        }
    }

    fn nss_cfg() -> CryptoConfig {
        cfg("nss", "aes256", "sha256", &[0u8; 32])
    }

    #[test]
    fn p1_in_use_iff_occupied() {
        let mut mgr = CryptoInstanceManager::new();
        assert_eq!(mgr.in_use(), 0);
        assert_eq!(mgr.installed_count(), 0);
        mgr.init(&nss_cfg(), 1).unwrap();
        assert_ne!(mgr.in_use(), 0);
        mgr.fini(0).unwrap();
        assert_eq!(mgr.in_use(), 0);
        assert_eq!(mgr.installed_count(), 0);
    }

    #[test]
    fn i2_first_install_sets_in_use() {
        let mut mgr = CryptoInstanceManager::new();
        mgr.init(&nss_cfg(), 3).unwrap();
        assert_eq!(mgr.in_use(), 3);
    }

    #[test]
    fn i3_tearing_down_in_use_resets_sizes() {
        let mut mgr = CryptoInstanceManager::new();
        mgr.init(&nss_cfg(), 1).unwrap();
        assert!(mgr.sizes().sec_block_size > 0);
        mgr.fini(1).unwrap();
        assert_eq!(mgr.in_use(), 0);
        assert_eq!(mgr.sizes().sec_block_size, 0);
    }

    #[test]
    fn p3_failed_init_leaves_slot_and_in_use_unchanged() {
        let mut mgr = CryptoInstanceManager::new();
        mgr.init(&nss_cfg(), 1).unwrap();
        let before = mgr.in_use();

        let mut bad = nss_cfg();
        bad.crypto_cipher_type = "rc4".into();
        assert!(mgr.init(&bad, 2).is_err());

        assert_eq!(mgr.in_use(), before);
        assert!(mgr.get(2).is_none());
    }

    #[test]
    fn use_config_on_empty_slot_is_einval_equivalent() {
        let mut mgr = CryptoInstanceManager::new();
        assert!(mgr.use_config(5).is_err());
    }

    #[test]
    fn reinstall_into_in_use_slot_republishes_sizes() {
        let mut mgr = CryptoInstanceManager::new();
        mgr.init(&nss_cfg(), 1).unwrap();
        mgr.init(&cfg("openssl", "chacha20", "blake3", b"another key"), 2)
            .unwrap();
        mgr.use_config(2).unwrap();
        // Reinstalling into the current in_use slot (2) must refresh sizes
        // rather than leaving stale ones, even though 2 == in_use already.
        mgr.init(&cfg("openssl", "chacha20", "blake3", b"yet another key"), 2)
            .unwrap();
        assert_eq!(mgr.in_use(), 2);
        assert!(mgr.sizes().sec_block_size > 0);
    }

    #[test]
    fn fini_zero_is_idempotent() {
        let mut mgr = CryptoInstanceManager::new();
        mgr.init(&nss_cfg(), 1).unwrap();
        mgr.fini(0).unwrap();
        mgr.fini(0).unwrap();
        assert_eq!(mgr.in_use(), 0);
    }
}
