//! # knet-crypto-registry
//!
//! Resolves a `crypto_model` name to a loaded backend.
//!
//! The model table is a small ordered list, not a map: the original it is
//! grounded on resolves names by linear scan over a fixed-size static
//! array, and preserves that scan order when enumerating "installed"
//! models, so callers see backends in declaration order rather than
//! hash order. Each entry lazily constructs its backend exactly once;
//! since every entry here is built-in (no `dlopen`-equivalent module
//! loading -- see `SPEC_FULL.md` Non-goals), a plain `OnceLock` is
//! sufficient and avoids reimplementing the donor's dlopen-reentrancy
//! state machine for a hazard that doesn't exist in this port.

use std::sync::{Arc, OnceLock};

use knet_crypto_abi::{CryptoBackend, CRYPTO_MODEL_ABI};
use knet_crypto_backends::{NssBackend, OpensslBackend};

/// Failure resolving a `crypto_model` name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown crypto model {0:?}")]
    UnknownModel(String),
    #[error("crypto model {model:?} was built against ABI {found}, registry expects {expected}")]
    AbiMismatch {
        model: String,
        found: u32,
        expected: u32,
    },
}

struct ModelEntry {
    name: &'static str,
    built_in: bool,
    backend: OnceLock<Arc<dyn CryptoBackend>>,
    construct: fn() -> Arc<dyn CryptoBackend>,
}

/// The ordered model table. Declaration order here is enumeration order
/// for [`list_crypto`].
static MODELS: &[ModelEntry] = &[
    ModelEntry {
        name: "nss",
        built_in: true,
        backend: OnceLock::new(),
        construct: || Arc::new(NssBackend::new()),
    },
    ModelEntry {
        name: "openssl",
        built_in: true,
        backend: OnceLock::new(),
        construct: || Arc::new(OpensslBackend::new()),
    },
];

/// Resolve `name` to its backend, loading it on first use.
///
/// Linear scan mirrors the small, fixed-size table this is grounded on;
/// a `HashMap` would be the wrong shape for a table this size that also
/// needs to preserve declaration order for [`list_crypto`].
pub fn get_model(name: &str) -> Result<Arc<dyn CryptoBackend>, RegistryError> {
    let entry = MODELS
        .iter()
        .find(|e| e.name == name)
        .ok_or_else(|| RegistryError::UnknownModel(name.to_string()))?;

    let backend = entry.backend.get_or_init(|| (entry.construct)());

    let found = backend.abi_ver();
    if found != CRYPTO_MODEL_ABI {
        return Err(RegistryError::AbiMismatch {
            model: name.to_string(),
            found,
            expected: CRYPTO_MODEL_ABI,
        });
    }

    Ok(Arc::clone(backend))
}

/// Enumerate built-in model names, in declaration order.
///
/// Mirrors `knet_get_crypto_list`: only names are exposed, never whether
/// a given name has actually been loaded yet.
#[must_use]
pub fn list_crypto() -> Vec<&'static str> {
    MODELS
        .iter()
        .filter(|e| e.built_in)
        .map(|e| e.name)
        .collect()
}
