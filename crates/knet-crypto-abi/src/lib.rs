//! # knet-crypto-abi
//!
//! The contract every crypto backend (a cipher+hash pairing) must honour to
//! be installable into a handle's crypto slot table.
//!
//! A backend is a `dyn CryptoBackend` trait object behind a stable ABI
//! version ([`CRYPTO_MODEL_ABI`]). This crate defines the trait, the
//! configuration record handed to `init`, and the error/log types that
//! cross the boundary. It has no registry, no concrete backends, and no
//! instance-management policy -- those live in `knet-crypto-registry` and
//! `knet-core` respectively.

mod backend;
mod config;
mod error;

pub use backend::{BackendInstance, CryptoBackend, LogLevel};
pub use config::{CryptoConfig, MAX_KEY_LEN};
pub use error::CryptoError;

/// ABI version a backend's `abi_ver()` must match to be loaded.
///
/// Bumped whenever [`CryptoBackend`]'s method signatures change in a way
/// that is not source-compatible with existing backends.
pub const CRYPTO_MODEL_ABI: u32 = 2;
