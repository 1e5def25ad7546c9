//! `extern "C"` surface for link ACLs (§6 "ACL API").

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use knet_core::{AclAction, AclEntry, Handle, SocketId};

use crate::errno;
use crate::link_abi::KnetTransport;

/// An ACL rule kind, C layout.
#[repr(C)]
#[derive(Clone, Copy)]
pub enum KnetAclMatchKind {
    Address = 0,
    Mask = 1,
    Range = 2,
}

/// C layout action applied on match.
#[repr(C)]
#[derive(Clone, Copy)]
pub enum KnetAclAction {
    Accept = 0,
    Reject = 1,
}

/// A fixed-size address buffer: `family` selects whether `v4` or `v6`
/// is meaningful, mirroring [`crate::link_abi::KnetSockaddr`] without
/// the port.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct KnetAddr {
    pub family: u8,
    pub v4: [u8; 4],
    pub v6: [u8; 16],
}

impl KnetAddr {
    fn to_ip_addr(self) -> Result<IpAddr, &'static str> {
        match self.family {
            4 => Ok(IpAddr::V4(Ipv4Addr::from(self.v4))),
            6 => Ok(IpAddr::V6(Ipv6Addr::from(self.v6))),
            _ => Err("unknown address family"),
        }
    }
}

/// `check_add`/`check_rm` input, C layout. `ip2` is unused for
/// [`KnetAclMatchKind::Address`].
#[repr(C)]
pub struct KnetAclEntry {
    pub kind: KnetAclMatchKind,
    pub ip1: KnetAddr,
    pub ip2: KnetAddr,
    pub action: KnetAclAction,
}

impl KnetAclEntry {
    fn to_owned_entry(&self) -> Result<AclEntry, &'static str> {
        let ip1 = self.ip1.to_ip_addr()?;
        let action = match self.action {
            KnetAclAction::Accept => AclAction::Accept,
            KnetAclAction::Reject => AclAction::Reject,
        };
        match self.kind {
            KnetAclMatchKind::Address => Ok(AclEntry::address(ip1, action)),
            KnetAclMatchKind::Mask => Ok(AclEntry::mask(ip1, self.ip2.to_ip_addr()?, action)),
            KnetAclMatchKind::Range => Ok(AclEntry::range(ip1, self.ip2.to_ip_addr()?, action)),
        }
    }
}

fn owned_entry(entry: *const KnetAclEntry) -> Result<AclEntry, i32> {
    let entry = unsafe { entry.as_ref() }.ok_or(-1)?;
    entry.to_owned_entry().map_err(|msg| {
        errno::set_from(&knet_core::KnetError::Configuration(msg.into()));
        -1
    })
}

/// # Safety
/// `handle` and `entry` must be valid, live pointers.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn knet_check_add(
    handle: *const Handle,
    sock: SocketId,
    transport: KnetTransport,
    entry: *const KnetAclEntry,
) -> i32 {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return -1;
    };
    let owned = match owned_entry(entry) {
        Ok(e) => e,
        Err(code) => return code,
    };
    handle.check_add(sock, transport.into(), owned);
    errno::clear();
    0
}

/// Returns `0` if an entry was removed, `-1` (with `NotSupported`-class
/// errno, matching "no such entry") if none matched.
///
/// # Safety
/// `handle` and `entry` must be valid, live pointers.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn knet_check_rm(
    handle: *const Handle,
    sock: SocketId,
    transport: KnetTransport,
    entry: *const KnetAclEntry,
) -> i32 {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return -1;
    };
    let owned = match owned_entry(entry) {
        Ok(e) => e,
        Err(code) => return code,
    };
    if handle.check_rm(sock, transport.into(), &owned) {
        errno::clear();
        0
    } else {
        errno::set_from(&knet_core::KnetError::Configuration(
            "no matching acl entry".into(),
        ));
        -1
    }
}

/// # Safety
/// `handle` must be a valid, live pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn knet_check_rmall(
    handle: *const Handle,
    sock: SocketId,
    transport: KnetTransport,
) -> i32 {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return -1;
    };
    handle.check_rmall(sock, transport.into());
    errno::clear();
    0
}

/// Returns `1` for accept, `0` for reject (default-reject, §4.6),
/// `-1` on a null/invalid address.
///
/// # Safety
/// `handle` and `addr` must be valid, live pointers.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn knet_check_validate(
    handle: *const Handle,
    sock: SocketId,
    transport: KnetTransport,
    addr: *const KnetAddr,
) -> i32 {
    let (Some(handle), Some(addr)) = (unsafe { handle.as_ref() }, unsafe { addr.as_ref() }) else {
        return -1;
    };
    let ip = match addr.to_ip_addr() {
        Ok(ip) => ip,
        Err(msg) => {
            errno::set_from(&knet_core::KnetError::Configuration(msg.into()));
            return -1;
        }
    };
    errno::clear();
    match handle.check_validate(sock, transport.into(), ip) {
        AclAction::Accept => 1,
        AclAction::Reject => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle_abi::{knet_handle_free, knet_handle_new};

    fn v4(a: u8, b: u8, c: u8, d: u8) -> KnetAddr {
        KnetAddr {
            family: 4,
            v4: [a, b, c, d],
            v6: [0; 16],
        }
    }

    #[test]
    fn add_validate_rm_round_trip() {
        let handle = knet_handle_new(1, -1, 0, 0);
        let entry = KnetAclEntry {
            kind: KnetAclMatchKind::Address,
            ip1: v4(10, 0, 0, 1),
            ip2: v4(0, 0, 0, 0),
            action: KnetAclAction::Accept,
        };
        assert_eq!(
            unsafe { knet_check_add(handle, 1, KnetTransport::Udp, &entry) },
            0
        );
        let addr = v4(10, 0, 0, 1);
        assert_eq!(
            unsafe { knet_check_validate(handle, 1, KnetTransport::Udp, &addr) },
            1
        );
        let other = v4(10, 0, 0, 2);
        assert_eq!(
            unsafe { knet_check_validate(handle, 1, KnetTransport::Udp, &other) },
            0
        );
        assert_eq!(unsafe { knet_check_rm(handle, 1, KnetTransport::Udp, &entry) }, 0);
        assert_eq!(
            unsafe { knet_check_validate(handle, 1, KnetTransport::Udp, &addr) },
            0
        );
        unsafe { knet_handle_free(handle) };
    }
}
