//! `extern "C"` surface for handle lifecycle, crypto configuration, and
//! the send/receive data path.

use std::ffi::c_int;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use knet_core::{DataFd, Handle, HandleConfig, NullLogger, StdoutLogger};

use crate::errno::{self, KnetErrno};
use crate::types::KnetCryptoConfig;

static NEXT_HANDLE_ID: AtomicU32 = AtomicU32::new(1);

/// `handle_new(node_id, log_fd, log_level, flags)` (§6).
///
/// `log_fd < 0` selects the null logger, otherwise stdout. Per-record
/// minimum-severity filtering by `log_level` and any meaning of `flags`
/// are left to the host's log transport, an out-of-scope collaborator
/// (§1) -- this boundary only decides whether records are produced at
/// all. `handle_id` (used only to tag log records, §3) is assigned from
/// a process-wide counter since the C API has no caller-supplied slot
/// for it.
#[unsafe(no_mangle)]
pub extern "C" fn knet_handle_new(
    node_id: u16,
    log_fd: c_int,
    _log_level: c_int,
    _flags: u32,
) -> *mut Handle {
    let logger: Arc<dyn knet_core::Logger> = if log_fd < 0 {
        Arc::new(NullLogger)
    } else {
        Arc::new(StdoutLogger)
    };
    let handle = Handle::new(HandleConfig {
        node_id,
        handle_id: NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed),
        logger,
    });
    Box::into_raw(Box::new(handle))
}

/// `handle_free`.
///
/// # Safety
/// `handle` must be a pointer previously returned by
/// [`knet_handle_new`] and not already freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn knet_handle_free(handle: *mut Handle) {
    if handle.is_null() {
        return;
    }
    drop(unsafe { Box::from_raw(handle) });
}

/// # Safety
/// `handle` and `cfg` must be valid, live pointers of their documented
/// shape.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn knet_handle_crypto_set_config(
    handle: *const Handle,
    cfg: *const KnetCryptoConfig,
    slot: u8,
) -> c_int {
    let (Some(handle), Some(cfg)) = (unsafe { handle.as_ref() }, unsafe { cfg.as_ref() }) else {
        errno::set_from(&knet_core::KnetError::Configuration("null pointer".into()));
        return -1;
    };
    let owned = match unsafe { cfg.to_owned_config() } {
        Ok(owned) => owned,
        Err(msg) => {
            errno::set_from(&knet_core::KnetError::Configuration(msg.into()));
            return -1;
        }
    };
    match handle.handle_crypto_set_config(&owned, slot) {
        Ok(()) => {
            errno::clear();
            0
        }
        Err(e) => {
            errno::set_from(&e);
            -1
        }
    }
}

/// # Safety
/// `handle` must be a valid, live pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn knet_handle_crypto_use_config(handle: *const Handle, slot: u8) -> c_int {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return -1;
    };
    match handle.handle_crypto_use_config(slot) {
        Ok(()) => {
            errno::clear();
            0
        }
        Err(e) => {
            errno::set_from(&e);
            -1
        }
    }
}

/// # Safety
/// `handle` must be a valid, live pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn knet_handle_crypto_fini(handle: *const Handle, slot: u8) -> c_int {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return -1;
    };
    match handle.handle_crypto_fini(slot) {
        Ok(()) => {
            errno::clear();
            0
        }
        Err(e) => {
            errno::set_from(&e);
            -1
        }
    }
}

/// `send(handle, buf, len, channel) -> bytes`. `channel` is currently
/// advisory (demultiplexing happens at `knet-core::Handle::add_datafd`
/// registration time); `out_buf` must have room for at least
/// `out_cap` bytes, and the produced ciphertext length is written back
/// through `out_len`. Returns the byte count on success, `-1` on
/// failure.
///
/// # Safety
/// `handle`, `buf_in`, and `out_buf`/`out_len` must be valid for their
/// documented lengths.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn knet_send(
    handle: *const Handle,
    buf_in: *const u8,
    in_len: usize,
    out_buf: *mut u8,
    out_cap: usize,
    out_len: *mut usize,
) -> c_int {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return -1;
    };
    let input = unsafe { std::slice::from_raw_parts(buf_in, in_len) };

    match handle.send(input) {
        Ok(ciphertext) => {
            if ciphertext.len() > out_cap {
                errno::set_from(&knet_core::KnetError::Resource(
                    "output buffer too small".into(),
                ));
                return -1;
            }
            unsafe {
                std::ptr::copy_nonoverlapping(ciphertext.as_ptr(), out_buf, ciphertext.len());
                *out_len = ciphertext.len();
            }
            errno::clear();
            ciphertext.len() as c_int
        }
        Err(e) => {
            errno::set_from(&e);
            -1
        }
    }
}

/// `recv(handle, buf, len, channel) -> bytes`. See [`knet_send`] for the
/// buffer contract.
///
/// # Safety
/// Same pointer/length contract as [`knet_send`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn knet_recv(
    handle: *const Handle,
    buf_in: *const u8,
    in_len: usize,
    out_buf: *mut u8,
    out_cap: usize,
    out_len: *mut usize,
) -> c_int {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return -1;
    };
    let input = unsafe { std::slice::from_raw_parts(buf_in, in_len) };

    match handle.recv(input) {
        Ok(outcome) => {
            if outcome.plaintext.len() > out_cap {
                errno::set_from(&knet_core::KnetError::Resource(
                    "output buffer too small".into(),
                ));
                return -1;
            }
            unsafe {
                std::ptr::copy_nonoverlapping(
                    outcome.plaintext.as_ptr(),
                    out_buf,
                    outcome.plaintext.len(),
                );
                *out_len = outcome.plaintext.len();
            }
            errno::clear();
            outcome.plaintext.len() as c_int
        }
        Err(e) => {
            errno::set_from(&e);
            -1
        }
    }
}

/// `get_crypto_list(buf, *entries)`. When `names_out` is null, only the
/// count is written to `*entries`.
///
/// # Safety
/// `handle` must be valid; `entries` must be a valid, writable pointer;
/// when non-null, `names_out` must have room for at least `*entries`
/// (on entry) pointers, each valid for the lifetime of the process
/// (backend names are `'static`).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn knet_get_crypto_list(
    handle: *const Handle,
    names_out: *mut *const std::ffi::c_char,
    entries: *mut usize,
) -> c_int {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return -1;
    };
    let names = handle.get_crypto_list();
    if names_out.is_null() {
        unsafe { *entries = names.len() };
        return 0;
    }
    let cap = unsafe { *entries };
    for (i, name) in names.iter().take(cap).enumerate() {
        // Backend names are static `&str` with no interior NUL, safe to
        // treat as a borrowed, non-owned C string for the call's duration.
        let leaked: &'static str = name;
        unsafe {
            *names_out.add(i) = leaked.as_ptr().cast();
        }
    }
    unsafe { *entries = names.len() };
    0
}

/// # Safety
/// `handle` must be a valid, live pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn knet_handle_add_datafd(handle: *const Handle, channel: u8) -> i64 {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return -1;
    };
    match handle.add_datafd(channel) {
        Ok(DataFd(fd)) => {
            errno::clear();
            i64::from(fd)
        }
        Err(e) => {
            errno::set_from(&e);
            -1
        }
    }
}

/// # Safety
/// `handle` must be a valid, live pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn knet_handle_remove_datafd(handle: *const Handle, fd: u32) -> c_int {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return -1;
    };
    match handle.remove_datafd(DataFd(fd)) {
        Ok(()) => {
            errno::clear();
            0
        }
        Err(e) => {
            errno::set_from(&e);
            -1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_new_free_round_trip() {
        let handle = knet_handle_new(1, -1, 0, 0);
        assert!(!handle.is_null());
        unsafe { knet_handle_free(handle) };
    }

    #[test]
    fn errno_starts_ok_and_reflects_failures() {
        let handle = knet_handle_new(1, -1, 0, 0);
        let code = unsafe { knet_handle_crypto_use_config(handle, 7) };
        assert_eq!(code, -1);
        assert_eq!(crate::knet_errno(), KnetErrno::Invalid as c_int);
        unsafe { knet_handle_free(handle) };
    }

    #[test]
    fn unknown_crypto_model_reports_not_supported() {
        let handle = knet_handle_new(1, -1, 0, 0);
        let model = std::ffi::CString::new("wolfssl").unwrap();
        let cipher = std::ffi::CString::new("aes256").unwrap();
        let hash = std::ffi::CString::new("sha256").unwrap();
        let cfg = KnetCryptoConfig {
            crypto_model: model.as_ptr(),
            crypto_cipher_type: cipher.as_ptr(),
            crypto_hash_type: hash.as_ptr(),
            private_key: std::ptr::null(),
            private_key_len: 0,
        };
        let code = unsafe { knet_handle_crypto_set_config(handle, &cfg, 1) };
        assert_eq!(code, -1);
        assert_eq!(crate::knet_errno(), KnetErrno::NotSupported as c_int);
        unsafe { knet_handle_free(handle) };
    }
}
