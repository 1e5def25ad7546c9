//! errno-equivalent reporting (§6 "Error reporting", §9 "Errno discipline").
//!
//! `knet-core` returns structured `Result<_, KnetError>` end to end; this
//! module is the *only* place a `KnetError` becomes a small integer, set
//! in a thread-local the way C's `errno` is, and read back via
//! [`knet_errno`] after any API call returns `-1`.

use std::cell::Cell;
use std::ffi::c_int;

use knet_core::{ErrnoClass, KnetError};

/// Errno-equivalent codes (§6: "unsupported backend -> not-supported;
/// bad arguments -> invalid; no memory -> oom; ABI mismatch -> invalid").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum KnetErrno {
    Ok = 0,
    Invalid = 1,
    NotSupported = 2,
    NoMemory = 3,
    Backend = 4,
    Policy = 5,
    Transport = 6,
}

thread_local! {
    static LAST_ERRNO: Cell<c_int> = const { Cell::new(KnetErrno::Ok as c_int) };
}

pub(crate) fn clear() {
    LAST_ERRNO.with(|c| c.set(KnetErrno::Ok as c_int));
}

/// Maps a [`KnetError`] to its errno-equivalent code, without touching
/// the thread-local. Used both by [`set_from`] and by notify callbacks
/// that carry the code as an explicit argument instead.
pub(crate) fn class_code(err: &KnetError) -> KnetErrno {
    match err.class() {
        ErrnoClass::Configuration => KnetErrno::Invalid,
        ErrnoClass::Resource => KnetErrno::NoMemory,
        ErrnoClass::NotSupported => KnetErrno::NotSupported,
        ErrnoClass::Backend => KnetErrno::Backend,
        ErrnoClass::Policy => KnetErrno::Policy,
        ErrnoClass::Transport => KnetErrno::Transport,
    }
}

pub(crate) fn set_from(err: &KnetError) {
    LAST_ERRNO.with(|c| c.set(class_code(err) as c_int));
}

/// Reads the calling thread's last errno-equivalent code. Valid only
/// immediately after an API call returned a failure indication
/// (`-1`/`null`); unrelated to any other call on the same thread.
#[unsafe(no_mangle)]
pub extern "C" fn knet_errno() -> c_int {
    LAST_ERRNO.with(Cell::get)
}
