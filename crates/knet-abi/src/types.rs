//! FFI-shaped records (§6 "Crypto configuration record").

use std::ffi::{c_char, CStr};
use std::slice;

use knet_crypto_abi::CryptoConfig;

/// `{ crypto_model, crypto_cipher_type, crypto_hash_type, private_key,
/// private_key_len }`, exactly as named in §6. Strings are borrowed,
/// NUL-terminated C strings; `private_key` is a borrowed byte buffer of
/// `private_key_len` bytes. Nothing here is retained past the call that
/// receives it.
#[repr(C)]
pub struct KnetCryptoConfig {
    pub crypto_model: *const c_char,
    pub crypto_cipher_type: *const c_char,
    pub crypto_hash_type: *const c_char,
    pub private_key: *const u8,
    pub private_key_len: u32,
}

impl KnetCryptoConfig {
    /// Copies the FFI record into an owned [`CryptoConfig`].
    ///
    /// # Safety
    /// All three string pointers must be valid, NUL-terminated, UTF-8 C
    /// strings, and `private_key` must point at `private_key_len` valid
    /// bytes (or be null when `private_key_len == 0`).
    pub unsafe fn to_owned_config(&self) -> Result<CryptoConfig, &'static str> {
        let model = unsafe { c_str_to_string(self.crypto_model) }
            .ok_or("crypto_model: invalid UTF-8/null")?;
        let cipher = unsafe { c_str_to_string(self.crypto_cipher_type) }
            .ok_or("crypto_cipher_type: invalid UTF-8/null")?;
        let hash = unsafe { c_str_to_string(self.crypto_hash_type) }
            .ok_or("crypto_hash_type: invalid UTF-8/null")?;

        let private_key = if self.private_key_len == 0 || self.private_key.is_null() {
            Vec::new()
        } else {
            unsafe { slice::from_raw_parts(self.private_key, self.private_key_len as usize) }
                .to_vec()
        };

        Ok(CryptoConfig {
            crypto_model: model,
            crypto_cipher_type: cipher,
            crypto_hash_type: hash,
            private_key,
        })
    }
}

unsafe fn c_str_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok().map(str::to_owned)
}
