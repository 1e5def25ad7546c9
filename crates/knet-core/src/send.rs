//! Send-path wrapper (C4, §4.4).
//!
//! Dispatches directly to the backend of the `in_use` instance. The core
//! never interprets the produced ciphertext beyond its length.

use std::io::IoSlice;

use crate::crypto_instance::CryptoInstanceManager;
use crate::error::KnetError;

/// `encrypt_and_sign`. Pre: an instance is installed and in use.
pub fn encrypt_and_sign(mgr: &CryptoInstanceManager, buf_in: &[u8]) -> Result<Vec<u8>, KnetError> {
    let instance = mgr.get_in_use().ok_or_else(|| {
        KnetError::Configuration("encrypt_and_sign: no crypto instance in use".into())
    })?;
    Ok(instance
        .backend()
        .crypt(instance.backend_instance(), buf_in)?)
}

/// `encrypt_and_signv`. Pre: an instance is installed and in use.
pub fn encrypt_and_signv(
    mgr: &CryptoInstanceManager,
    iov: &[IoSlice<'_>],
) -> Result<Vec<u8>, KnetError> {
    let instance = mgr.get_in_use().ok_or_else(|| {
        KnetError::Configuration("encrypt_and_signv: no crypto instance in use".into())
    })?;
    Ok(instance
        .backend()
        .cryptv(instance.backend_instance(), iov)?)
}
