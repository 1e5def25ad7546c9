//! `extern "C"` surface for host registration, naming, and status
//! notification (§6 "Host API").

use std::ffi::{c_char, CStr};
use std::sync::Arc;
use std::time::Duration;

use knet_core::{Handle, Host, HostId, HostStatus, SocketId};

use crate::errno;

/// C-compatible snapshot mirroring [`knet_core::HostStatus`].
#[repr(C)]
pub struct KnetHostStatus {
    pub reachable: bool,
    pub remote: bool,
    pub external: bool,
}

impl From<HostStatus> for KnetHostStatus {
    fn from(s: HostStatus) -> Self {
        Self {
            reachable: s.reachable,
            remote: s.remote,
            external: s.external,
        }
    }
}

/// # Safety
/// `handle` must be valid and `name` (if non-null) a NUL-terminated
/// UTF-8 C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn knet_host_add(
    handle: *const Handle,
    host_id: HostId,
    name: *const c_char,
    remote: bool,
    external: bool,
) -> i32 {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return -1;
    };
    let name = if name.is_null() {
        String::new()
    } else {
        match unsafe { CStr::from_ptr(name) }.to_str() {
            Ok(s) => s.to_owned(),
            Err(_) => {
                errno::set_from(&knet_core::KnetError::Configuration(
                    "host name: invalid UTF-8".into(),
                ));
                return -1;
            }
        }
    };
    handle.host_add(Host::new(host_id, name, remote, external));
    errno::clear();
    0
}

/// # Safety
/// `handle` must be a valid, live pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn knet_host_remove(handle: *const Handle, host_id: HostId) -> i32 {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return -1;
    };
    match handle.host_remove(host_id) {
        Some(_) => {
            errno::clear();
            0
        }
        None => {
            errno::set_from(&knet_core::KnetError::Configuration(format!(
                "unknown host {host_id}"
            )));
            -1
        }
    }
}

/// Writes up to `*entries` host ids (on entry, the capacity of
/// `ids_out`) into `ids_out`, then overwrites `*entries` with the total
/// registered count.
///
/// # Safety
/// `handle` must be valid; `entries` must be a valid, writable pointer;
/// `ids_out` (when non-null) must have room for at least `*entries` (on
/// entry) elements.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn knet_host_get_list(
    handle: *const Handle,
    ids_out: *mut HostId,
    entries: *mut usize,
) -> i32 {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return -1;
    };
    let ids = handle.host_get_list();
    if !ids_out.is_null() {
        let cap = unsafe { *entries };
        for (i, id) in ids.iter().take(cap).enumerate() {
            unsafe { *ids_out.add(i) = *id };
        }
    }
    unsafe { *entries = ids.len() };
    errno::clear();
    0
}

/// # Safety
/// `handle` must be valid and `name` a NUL-terminated UTF-8 C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn knet_host_set_name(
    handle: *const Handle,
    host_id: HostId,
    name: *const c_char,
) -> i32 {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return -1;
    };
    if name.is_null() {
        errno::set_from(&knet_core::KnetError::Configuration("null name".into()));
        return -1;
    }
    let name = match unsafe { CStr::from_ptr(name) }.to_str() {
        Ok(s) => s,
        Err(_) => {
            errno::set_from(&knet_core::KnetError::Configuration(
                "host name: invalid UTF-8".into(),
            ));
            return -1;
        }
    };
    match handle.host_set_name(host_id, name) {
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
/// `handle` and `status_out` must be valid, writable pointers.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn knet_host_get_status(
    handle: *const Handle,
    host_id: HostId,
    status_out: *mut KnetHostStatus,
) -> i32 {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return -1;
    };
    match handle.host_get_status(host_id) {
        Ok(status) => {
            unsafe { *status_out = status.into() };
            errno::clear();
            0
        }
        Err(e) => {
            errno::set_from(&e);
            -1
        }
    }
}

/// Function pointer shape for `knet_host_enable_status_change_notify`.
pub type KnetHostNotifyFn = extern "C" fn(HostId, KnetHostStatus);

/// Registers a C callback invoked at most once per reachability flip
/// (§4.7). Passing `None`/a null pointer is not exposed; call this only
/// once per handle (later calls replace the previous callback, per
/// `knet-core::Handle::enable_status_change_notify`).
///
/// # Safety
/// `handle` must be valid and `callback` a valid, unwinding-safe `extern
/// "C"` function pointer that outlives every future notification.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn knet_host_enable_status_change_notify(
    handle: *const Handle,
    callback: KnetHostNotifyFn,
) -> i32 {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return -1;
    };
    handle.enable_status_change_notify(Arc::new(move |id, status| {
        callback(id, status.into());
    }));
    errno::clear();
    0
}

/// Function pointer shape for `knet_host_enable_pmtud_notify`.
pub type KnetPmtudNotifyFn = extern "C" fn(HostId, u32);

/// Registers a C callback invoked whenever a host's aggregate
/// `data_mtu` changes (§4.7 PMTUd). Later calls replace the previous
/// callback, mirroring `knet_host_enable_status_change_notify`.
///
/// # Safety
/// `handle` must be valid and `callback` a valid, unwinding-safe `extern
/// "C"` function pointer that outlives every future notification.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn knet_host_enable_pmtud_notify(
    handle: *const Handle,
    callback: KnetPmtudNotifyFn,
) -> i32 {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return -1;
    };
    handle.enable_pmtud_notify(Arc::new(move |id, mtu| {
        callback(id, mtu);
    }));
    errno::clear();
    0
}

/// Function pointer shape for `knet_host_enable_sock_notify`. The
/// second argument is the errno-equivalent code from
/// [`crate::errno::KnetErrno`], not a raw OS errno.
pub type KnetSockNotifyFn = extern "C" fn(SocketId, i32);

/// Registers a C callback invoked on data-path socket errors. Later
/// calls replace the previous callback.
///
/// # Safety
/// `handle` must be valid and `callback` a valid, unwinding-safe `extern
/// "C"` function pointer that outlives every future notification.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn knet_host_enable_sock_notify(
    handle: *const Handle,
    callback: KnetSockNotifyFn,
) -> i32 {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return -1;
    };
    handle.enable_sock_notify(Arc::new(move |sock, err| {
        callback(sock, errno::class_code(err) as i32);
    }));
    errno::clear();
    0
}

/// `pmtud_get`: writes the host's current aggregate `data_mtu` into
/// `mtu_out` and returns `1`. Returns `0` (with `mtu_out` untouched) if
/// no PMTUd sample has landed yet, `-1` on an unknown host.
///
/// # Safety
/// `handle` and `mtu_out` must be valid, writable pointers.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn knet_pmtud_get(
    handle: *const Handle,
    host_id: HostId,
    mtu_out: *mut u32,
) -> i32 {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return -1;
    };
    match handle.pmtud_get(host_id) {
        Ok(Some(mtu)) => {
            unsafe { *mtu_out = mtu };
            errno::clear();
            1
        }
        Ok(None) => {
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
pub unsafe extern "C" fn knet_pmtud_setfreq(handle: *const Handle, interval_ms: u32) -> i32 {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return -1;
    };
    handle.pmtud_setfreq(Duration::from_millis(u64::from(interval_ms)));
    errno::clear();
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle_abi::{knet_handle_free, knet_handle_new};

    #[test]
    fn add_get_status_remove_round_trip() {
        let handle = knet_handle_new(1, -1, 0, 0);
        let name = std::ffi::CString::new("peer-a").unwrap();
        assert_eq!(
            unsafe { knet_host_add(handle, 7, name.as_ptr(), false, false) },
            0
        );
        let mut status = KnetHostStatus {
            reachable: true,
            remote: true,
            external: true,
        };
        assert_eq!(unsafe { knet_host_get_status(handle, 7, &mut status) }, 0);
        assert!(!status.reachable);
        assert_eq!(unsafe { knet_host_remove(handle, 7) }, 0);
        assert_eq!(unsafe { knet_host_remove(handle, 7) }, -1);
        unsafe { knet_handle_free(handle) };
    }

    #[test]
    fn pmtud_get_is_empty_until_a_link_reports_an_mtu() {
        let handle = knet_handle_new(1, -1, 0, 0);
        assert_eq!(
            unsafe { knet_host_add(handle, 7, std::ptr::null(), false, false) },
            0
        );
        let mut mtu = 0u32;
        assert_eq!(unsafe { knet_pmtud_get(handle, 7, &mut mtu) }, 0);
        assert_eq!(unsafe { knet_pmtud_get(handle, 99, &mut mtu) }, -1);
        assert_eq!(unsafe { knet_pmtud_setfreq(handle, 2_000) }, 0);
        unsafe { knet_handle_free(handle) };
    }

    extern "C" fn record_pmtud(_id: HostId, _mtu: u32) {}
    extern "C" fn record_sock_error(_sock: i32, _code: i32) {}

    #[test]
    fn notify_registration_accepts_a_callback() {
        let handle = knet_handle_new(1, -1, 0, 0);
        assert_eq!(
            unsafe { knet_host_enable_pmtud_notify(handle, record_pmtud) },
            0
        );
        assert_eq!(
            unsafe { knet_host_enable_sock_notify(handle, record_sock_error) },
            0
        );
        unsafe { knet_handle_free(handle) };
    }
}
