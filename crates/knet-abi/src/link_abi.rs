//! `extern "C"` surface for link configuration and status (§6 "Link API").

use std::net::{SocketAddr, SocketAddrV4, SocketAddrV6};
use std::time::Duration;

use knet_core::{Handle, HostId, LinkConfig, LinkState, LinkStatus, TransportKind};

use crate::errno;

/// Wire transport tag mirroring [`knet_core::TransportKind`].
#[repr(C)]
#[derive(Clone, Copy)]
pub enum KnetTransport {
    Udp = 0,
    Sctp = 1,
}

impl From<KnetTransport> for TransportKind {
    fn from(t: KnetTransport) -> Self {
        match t {
            KnetTransport::Udp => TransportKind::Udp,
            KnetTransport::Sctp => TransportKind::Sctp,
        }
    }
}

/// An IPv4-or-IPv6 socket address in fixed C layout: `family` selects
/// which of `addr`/`addr6` and `port` is meaningful.
#[repr(C)]
pub struct KnetSockaddr {
    pub family: u8,
    pub port: u16,
    pub addr: [u8; 4],
    pub addr6: [u8; 16],
}

impl KnetSockaddr {
    fn to_socket_addr(&self) -> Result<SocketAddr, &'static str> {
        match self.family {
            4 => Ok(SocketAddr::V4(SocketAddrV4::new(
                self.addr.into(),
                self.port,
            ))),
            6 => Ok(SocketAddr::V6(SocketAddrV6::new(
                self.addr6.into(),
                self.port,
                0,
                0,
            ))),
            _ => Err("unknown address family"),
        }
    }
}

/// `link_set_config` input, C layout (§6).
#[repr(C)]
pub struct KnetLinkConfig {
    pub transport: KnetTransport,
    pub src: KnetSockaddr,
    pub dst: KnetSockaddr,
    pub timeout_interval_ms: u32,
    pub ping_interval_ms: u32,
    pub precision_window: u32,
}

impl KnetLinkConfig {
    fn to_owned_config(&self) -> Result<LinkConfig, &'static str> {
        Ok(LinkConfig {
            transport: self.transport.into(),
            src: self.src.to_socket_addr()?,
            dst: self.dst.to_socket_addr()?,
            timeout_interval: Duration::from_millis(u64::from(self.timeout_interval_ms)),
            ping_interval: Duration::from_millis(u64::from(self.ping_interval_ms)),
            precision_window: self.precision_window,
        })
    }
}

/// C-compatible snapshot mirroring [`knet_core::LinkStatus`].
#[repr(C)]
pub struct KnetLinkStatus {
    pub state: u8,
    pub enabled: bool,
    pub connected: bool,
    pub has_latency: bool,
    pub latency_us: f64,
    pub has_data_mtu: bool,
    pub data_mtu: u32,
}

impl From<LinkStatus> for KnetLinkStatus {
    fn from(s: LinkStatus) -> Self {
        Self {
            state: match s.state {
                LinkState::Disabled => 0,
                LinkState::Probing => 1,
                LinkState::Connected => 2,
                LinkState::Disconnected => 3,
            },
            enabled: s.enabled,
            connected: s.connected,
            has_latency: s.latency_us.is_some(),
            latency_us: s.latency_us.unwrap_or(0.0),
            has_data_mtu: s.data_mtu.is_some(),
            data_mtu: s.data_mtu.unwrap_or(0),
        }
    }
}

/// # Safety
/// `handle` and `cfg` must be valid, live pointers.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn knet_link_set_config(
    handle: *const Handle,
    host_id: HostId,
    index: u8,
    cfg: *const KnetLinkConfig,
) -> i32 {
    let (Some(handle), Some(cfg)) = (unsafe { handle.as_ref() }, unsafe { cfg.as_ref() }) else {
        errno::set_from(&knet_core::KnetError::Configuration("null pointer".into()));
        return -1;
    };
    let owned = match cfg.to_owned_config() {
        Ok(owned) => owned,
        Err(msg) => {
            errno::set_from(&knet_core::KnetError::Configuration(msg.into()));
            return -1;
        }
    };
    match handle.link_set_config(host_id, index, owned) {
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
pub unsafe extern "C" fn knet_link_clear_config(
    handle: *const Handle,
    host_id: HostId,
    index: u8,
) -> i32 {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return -1;
    };
    match handle.link_clear_config(host_id, index) {
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
pub unsafe extern "C" fn knet_link_set_enable(
    handle: *const Handle,
    host_id: HostId,
    index: u8,
    enabled: bool,
) -> i32 {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return -1;
    };
    match handle.link_set_enable(host_id, index, enabled) {
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
pub unsafe extern "C" fn knet_link_set_timeout(
    handle: *const Handle,
    host_id: HostId,
    index: u8,
    timeout_interval_ms: u32,
    ping_interval_ms: u32,
    precision_window: u32,
) -> i32 {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return -1;
    };
    match handle.link_set_timeout(
        host_id,
        index,
        Duration::from_millis(u64::from(timeout_interval_ms)),
        Duration::from_millis(u64::from(ping_interval_ms)),
        precision_window,
    ) {
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

/// Records a PMTUd observation on `(host_id, index)`. The probe itself
/// is sent by the out-of-scope transport/worker layer; this is where it
/// reports a result, dispatching at most one `pmtud_notify`.
///
/// # Safety
/// `handle` must be a valid, live pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn knet_link_observe_pmtu(
    handle: *const Handle,
    host_id: HostId,
    index: u8,
    mtu: u32,
) -> i32 {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return -1;
    };
    match handle.link_observe_pmtu(host_id, index, mtu) {
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
pub unsafe extern "C" fn knet_link_get_status(
    handle: *const Handle,
    host_id: HostId,
    index: u8,
    status_out: *mut KnetLinkStatus,
) -> i32 {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return -1;
    };
    match handle.link_get_status(host_id, index) {
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

/// Writes up to `*entries` (on entry, the capacity of `indices_out`)
/// link indices into `indices_out`, then overwrites `*entries` with the
/// host's actual link count.
///
/// # Safety
/// `handle` must be valid; `entries` must be a valid, writable pointer;
/// `indices_out` (when non-null) must have room for at least `*entries`
/// (on entry) elements.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn knet_link_get_list(
    handle: *const Handle,
    host_id: HostId,
    indices_out: *mut u8,
    entries: *mut usize,
) -> i32 {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return -1;
    };
    match handle.link_get_list(host_id) {
        Ok(indices) => {
            if !indices_out.is_null() {
                let cap = unsafe { *entries };
                for (i, idx) in indices.iter().take(cap).enumerate() {
                    unsafe { *indices_out.add(i) = *idx };
                }
            }
            unsafe { *entries = indices.len() };
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
    use crate::handle_abi::{knet_handle_free, knet_handle_new};
    use crate::host_abi::knet_host_add;

    fn udp_cfg() -> KnetLinkConfig {
        KnetLinkConfig {
            transport: KnetTransport::Udp,
            src: KnetSockaddr {
                family: 4,
                port: 5405,
                addr: [127, 0, 0, 1],
                addr6: [0; 16],
            },
            dst: KnetSockaddr {
                family: 4,
                port: 5406,
                addr: [127, 0, 0, 1],
                addr6: [0; 16],
            },
            timeout_interval_ms: 5000,
            ping_interval_ms: 1000,
            precision_window: 8,
        }
    }

    #[test]
    fn set_enable_get_status_round_trip() {
        let handle = knet_handle_new(1, -1, 0, 0);
        assert_eq!(
            unsafe { knet_host_add(handle, 1, std::ptr::null(), false, false) },
            0
        );
        let cfg = udp_cfg();
        assert_eq!(unsafe { knet_link_set_config(handle, 1, 0, &cfg) }, 0);
        assert_eq!(unsafe { knet_link_set_enable(handle, 1, 0, true) }, 0);

        let mut status = KnetLinkStatus {
            state: 0,
            enabled: false,
            connected: false,
            has_latency: false,
            latency_us: 0.0,
            has_data_mtu: false,
            data_mtu: 0,
        };
        assert_eq!(unsafe { knet_link_get_status(handle, 1, 0, &mut status) }, 0);
        assert_eq!(status.state, 1); // Probing
        assert!(status.enabled);

        unsafe { knet_handle_free(handle) };
    }

    #[test]
    fn set_timeout_does_not_disturb_enabled_state() {
        let handle = knet_handle_new(1, -1, 0, 0);
        assert_eq!(
            unsafe { knet_host_add(handle, 1, std::ptr::null(), false, false) },
            0
        );
        let cfg = udp_cfg();
        assert_eq!(unsafe { knet_link_set_config(handle, 1, 0, &cfg) }, 0);
        assert_eq!(unsafe { knet_link_set_enable(handle, 1, 0, true) }, 0);
        assert_eq!(unsafe { knet_link_set_timeout(handle, 1, 0, 20_000, 250, 4) }, 0);

        let mut status = KnetLinkStatus {
            state: 0,
            enabled: false,
            connected: false,
            has_latency: false,
            latency_us: 0.0,
            has_data_mtu: false,
            data_mtu: 0,
        };
        assert_eq!(unsafe { knet_link_get_status(handle, 1, 0, &mut status) }, 0);
        assert_eq!(status.state, 1); // still Probing
        assert_eq!(
            unsafe { knet_link_set_timeout(handle, 1, 5, 20_000, 250, 4) },
            -1
        );

        unsafe { knet_handle_free(handle) };
    }
}
