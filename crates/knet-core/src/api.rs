//! External interface (§6), as free functions 1:1 with the spec's naming.
//!
//! `Handle`'s methods already provide this surface; this module exists
//! so `knet-abi`'s `extern "C"` boundary has one function per spec name
//! to bind against, rather than reaching into method-call syntax across
//! the FFI seam.

use std::io::IoSlice;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use knet_crypto_abi::CryptoConfig;

use crate::acl::{AclAction, AclEntry};
use crate::error::KnetError;
use crate::handle::{
    DataFd, Handle, HandleConfig, HostNotifyFn, PmtudNotifyFn, RxClearTrafficPolicy, SockNotifyFn,
    SocketId,
};
use crate::host::{Host, HostId, HostStatus};
use crate::link::{LinkConfig, LinkStatus, TransportKind};
use crate::recv::DecryptOutcome;

#[must_use]
pub fn handle_new(cfg: HandleConfig) -> Arc<Handle> {
    Arc::new(Handle::new(cfg))
}

/// No-op beyond dropping the last `Arc` -- `knet-abi` owns the
/// reference-counting at the FFI boundary; this exists for naming
/// symmetry with the original API.
pub fn handle_free(_handle: Arc<Handle>) {}

pub fn handle_crypto(handle: &Handle, cfg: &CryptoConfig) -> Result<(), KnetError> {
    handle.handle_crypto(cfg)
}

pub fn handle_crypto_set_config(handle: &Handle, cfg: &CryptoConfig, slot: u8) -> Result<(), KnetError> {
    handle.handle_crypto_set_config(cfg, slot)
}

pub fn handle_crypto_use_config(handle: &Handle, slot: u8) -> Result<(), KnetError> {
    handle.handle_crypto_use_config(slot)
}

pub fn handle_crypto_rx_clear_traffic(handle: &Handle, policy: RxClearTrafficPolicy) {
    handle.handle_crypto_rx_clear_traffic(policy);
}

#[must_use]
pub fn get_crypto_list(handle: &Handle) -> Vec<&'static str> {
    handle.get_crypto_list()
}

pub fn host_add(handle: &Handle, host: Host) {
    handle.host_add(host);
}

pub fn host_remove(handle: &Handle, id: HostId) -> Option<Host> {
    handle.host_remove(id)
}

#[must_use]
pub fn host_get_list(handle: &Handle) -> Vec<HostId> {
    handle.host_get_list()
}

pub fn host_set_name(handle: &Handle, id: HostId, name: &str) -> Result<(), KnetError> {
    handle.host_set_name(id, name)
}

pub fn host_get_status(handle: &Handle, id: HostId) -> Result<HostStatus, KnetError> {
    handle.host_get_status(id)
}

pub fn link_set_config(handle: &Handle, host_id: HostId, index: u8, cfg: LinkConfig) -> Result<(), KnetError> {
    handle.link_set_config(host_id, index, cfg)
}

pub fn link_clear_config(handle: &Handle, host_id: HostId, index: u8) -> Result<(), KnetError> {
    handle.link_clear_config(host_id, index)
}

pub fn link_set_enable(handle: &Handle, host_id: HostId, index: u8, enabled: bool) -> Result<(), KnetError> {
    handle.link_set_enable(host_id, index, enabled)
}

pub fn link_get_status(handle: &Handle, host_id: HostId, index: u8) -> Result<LinkStatus, KnetError> {
    handle.link_get_status(host_id, index)
}

pub fn link_get_list(handle: &Handle, host_id: HostId) -> Result<Vec<u8>, KnetError> {
    handle.link_get_list(host_id)
}

pub fn link_observe_pmtu(handle: &Handle, host_id: HostId, index: u8, mtu: u32) -> Result<(), KnetError> {
    handle.link_observe_pmtu(host_id, index, mtu)
}

pub fn link_set_timeout(
    handle: &Handle,
    host_id: HostId,
    index: u8,
    timeout_interval: Duration,
    ping_interval: Duration,
    precision_window: u32,
) -> Result<(), KnetError> {
    handle.link_set_timeout(host_id, index, timeout_interval, ping_interval, precision_window)
}

pub fn host_enable_status_change_notify(handle: &Handle, callback: Arc<HostNotifyFn>) {
    handle.enable_status_change_notify(callback);
}

pub fn host_enable_pmtud_notify(handle: &Handle, callback: Arc<PmtudNotifyFn>) {
    handle.enable_pmtud_notify(callback);
}

pub fn host_enable_sock_notify(handle: &Handle, callback: Arc<SockNotifyFn>) {
    handle.enable_sock_notify(callback);
}

pub fn pmtud_get(handle: &Handle, id: HostId) -> Result<Option<u32>, KnetError> {
    handle.pmtud_get(id)
}

pub fn pmtud_setfreq(handle: &Handle, interval: Duration) {
    handle.pmtud_setfreq(interval);
}

#[must_use]
pub fn pmtud_getfreq(handle: &Handle) -> Duration {
    handle.pmtud_getfreq()
}

pub fn handle_add_datafd(handle: &Handle, channel: u8) -> Result<DataFd, KnetError> {
    handle.add_datafd(channel)
}

pub fn handle_remove_datafd(handle: &Handle, fd: DataFd) -> Result<(), KnetError> {
    handle.remove_datafd(fd)
}

pub fn handle_get_datafd(handle: &Handle, channel: u8) -> Option<DataFd> {
    handle.get_datafd(channel)
}

pub fn handle_get_channel(handle: &Handle, fd: DataFd) -> Option<u8> {
    handle.get_channel(fd)
}

pub fn check_add(handle: &Handle, sock: SocketId, transport: TransportKind, entry: AclEntry) {
    handle.check_add(sock, transport, entry);
}

pub fn check_rm(handle: &Handle, sock: SocketId, transport: TransportKind, entry: &AclEntry) -> bool {
    handle.check_rm(sock, transport, entry)
}

pub fn check_rmall(handle: &Handle, sock: SocketId, transport: TransportKind) {
    handle.check_rmall(sock, transport);
}

#[must_use]
pub fn check_validate(handle: &Handle, sock: SocketId, transport: TransportKind, addr: IpAddr) -> AclAction {
    handle.check_validate(sock, transport, addr)
}

pub fn send(handle: &Handle, buf: &[u8]) -> Result<Vec<u8>, KnetError> {
    handle.send(buf)
}

pub fn sendv(handle: &Handle, iov: &[IoSlice<'_>]) -> Result<Vec<u8>, KnetError> {
    handle.sendv(iov)
}

pub fn recv(handle: &Handle, buf: &[u8]) -> Result<DecryptOutcome, KnetError> {
    handle.recv(buf)
}
