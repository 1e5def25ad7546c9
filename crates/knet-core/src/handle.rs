//! Handle & notification dispatch (C8, §4.8).
//!
//! Owns every other component's state and serialises configuration
//! changes behind one write-exclusive lock per handle (§3: "the
//! handle-wide reconfiguration lock"). Data-path readers (send, recv,
//! ACL validate) take the read lock and see a consistent snapshot;
//! writers (crypto install, host/link/ACL mutation) take the write
//! lock, so C2-registry resolution and C3 slot-table mutation are
//! linearised with each other within one handle.
//!
//! This is interpreted as *handle-wide* rather than literally
//! process-wide (multiple independent handles do not serialise against
//! each other) -- see `DESIGN.md` for the reasoning.

use std::io::IoSlice;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use knet_crypto_abi::CryptoConfig;

use crate::acl::{AclAction, AclEntry, AclTable};
use crate::crypto_instance::{CryptoInstanceManager, DerivedSizes};
use crate::error::KnetError;
use crate::host::{Host, HostId, HostStatus};
use crate::link::{Link, LinkConfig, LinkStatus, TransportKind};
use crate::logger::{LogLevel, LogRecord, Logger, NullLogger};
use crate::recv::{self, DecryptOutcome};
use crate::send;

/// Socket identifier an ACL table is keyed by (`sock` in §4.6). Opaque
/// to this crate -- assigned and interpreted by the out-of-scope
/// transport layer.
pub type SocketId = i32;

/// Handle a `send`/`recv` channel was registered against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataFd(pub u32);

/// Whether clear (unencrypted) traffic is accepted during a rekey
/// window (`handle_crypto_rx_clear_traffic`, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxClearTrafficPolicy {
    Reject,
    Accept,
}

pub type HostNotifyFn = dyn Fn(HostId, HostStatus) + Send + Sync;
pub type PmtudNotifyFn = dyn Fn(HostId, u32) + Send + Sync;
pub type SockNotifyFn = dyn Fn(SocketId, &KnetError) + Send + Sync;

#[derive(Default)]
struct NotifyTable {
    host: Option<Arc<HostNotifyFn>>,
    pmtud: Option<Arc<PmtudNotifyFn>>,
    sock: Option<Arc<SockNotifyFn>>,
}

/// `handle_new` input (§6: `node_id, log_fd, log_level, flags`). The log
/// fd itself is out of scope (owned by the host's log transport); a
/// `Logger` is supplied directly instead.
pub struct HandleConfig {
    pub node_id: u16,
    pub handle_id: u32,
    pub logger: Arc<dyn Logger>,
}

impl Default for HandleConfig {
    fn default() -> Self {
        Self {
            node_id: 0,
            handle_id: 0,
            logger: Arc::new(NullLogger),
        }
    }
}

/// The root aggregate (§3).
pub struct Handle {
    pub node_id: u16,
    handle_id: u32,
    crypto: RwLock<CryptoInstanceManager>,
    hosts: RwLock<std::collections::HashMap<HostId, Host>>,
    acl: RwLock<std::collections::HashMap<(SocketId, TransportKind), AclTable>>,
    notify: RwLock<NotifyTable>,
    datafds: RwLock<std::collections::HashMap<DataFd, u8>>,
    next_datafd: AtomicU32,
    rx_clear_traffic: RwLock<RxClearTrafficPolicy>,
    pmtud_interval: RwLock<std::time::Duration>,
    logger: Arc<dyn Logger>,
}

/// Default PMTUd probe interval (`pmtud_setfreq`'s default), matching
/// the original library's default of once per second.
const DEFAULT_PMTUD_INTERVAL: std::time::Duration = std::time::Duration::from_secs(1);

impl Handle {
    /// `handle_new`.
    #[must_use]
    pub fn new(cfg: HandleConfig) -> Self {
        Self {
            node_id: cfg.node_id,
            handle_id: cfg.handle_id,
            crypto: RwLock::new(CryptoInstanceManager::new()),
            hosts: RwLock::new(std::collections::HashMap::new()),
            acl: RwLock::new(std::collections::HashMap::new()),
            notify: RwLock::new(NotifyTable::default()),
            datafds: RwLock::new(std::collections::HashMap::new()),
            next_datafd: AtomicU32::new(1),
            rx_clear_traffic: RwLock::new(RxClearTrafficPolicy::Reject),
            pmtud_interval: RwLock::new(DEFAULT_PMTUD_INTERVAL),
            logger: cfg.logger,
        }
    }

    fn log(&self, level: LogLevel, subsystem: &'static str, message: impl Into<String>) {
        self.logger.log(LogRecord {
            handle_id: self.handle_id,
            level,
            subsystem,
            message: message.into(),
        });
    }

    // ---- crypto (C2/C3) -----------------------------------------------

    /// `handle_crypto`: legacy single-slot form, `crypto_init(cfg, 1);
    /// use_config(1)`.
    pub fn handle_crypto(&self, cfg: &CryptoConfig) -> Result<(), KnetError> {
        self.handle_crypto_set_config(cfg, 1)?;
        self.handle_crypto_use_config(1)
    }

    /// `handle_crypto_set_config`.
    pub fn handle_crypto_set_config(&self, cfg: &CryptoConfig, slot: u8) -> Result<(), KnetError> {
        let mut mgr = self.crypto.write();
        let result = mgr.init(cfg, slot);
        if let Err(ref e) = result {
            self.log(LogLevel::Err, "crypto", format!("slot {slot} init failed: {e}"));
        }
        result
    }

    /// `handle_crypto_use_config`.
    pub fn handle_crypto_use_config(&self, slot: u8) -> Result<(), KnetError> {
        self.crypto.write().use_config(slot)
    }

    /// `crypto_fini` equivalent exposed for slot teardown; `slot == 0`
    /// tears down every slot.
    pub fn handle_crypto_fini(&self, slot: u8) -> Result<(), KnetError> {
        self.crypto.write().fini(slot)
    }

    /// `handle_crypto_rx_clear_traffic`.
    pub fn handle_crypto_rx_clear_traffic(&self, policy: RxClearTrafficPolicy) {
        *self.rx_clear_traffic.write() = policy;
    }

    #[must_use]
    pub fn rx_clear_traffic_policy(&self) -> RxClearTrafficPolicy {
        *self.rx_clear_traffic.read()
    }

    /// `get_crypto_list`: enumerate built-in backend names.
    #[must_use]
    pub fn get_crypto_list(&self) -> Vec<&'static str> {
        knet_crypto_registry::list_crypto()
    }

    #[must_use]
    pub fn crypto_derived_sizes(&self) -> DerivedSizes {
        self.crypto.read().sizes()
    }

    // ---- send / receive (C4/C5) ---------------------------------------

    pub fn send(&self, buf: &[u8]) -> Result<Vec<u8>, KnetError> {
        let mgr = self.crypto.read();
        send::encrypt_and_sign(&mgr, buf)
    }

    pub fn sendv(&self, iov: &[IoSlice<'_>]) -> Result<Vec<u8>, KnetError> {
        let mgr = self.crypto.read();
        send::encrypt_and_signv(&mgr, iov)
    }

    pub fn recv(&self, buf: &[u8]) -> Result<DecryptOutcome, KnetError> {
        let mgr = self.crypto.read();
        let result = recv::authenticate_and_decrypt(&mgr, buf);
        if let Err(ref e) = result {
            self.log(LogLevel::Err, "recv", e.to_string());
        }
        result
    }

    // ---- ACL (C6) -------------------------------------------------------

    pub fn check_add(&self, sock: SocketId, transport: TransportKind, entry: AclEntry) {
        self.acl
            .write()
            .entry((sock, transport))
            .or_default()
            .add(entry);
    }

    pub fn check_rm(&self, sock: SocketId, transport: TransportKind, entry: &AclEntry) -> bool {
        self.acl
            .write()
            .get_mut(&(sock, transport))
            .is_some_and(|list| list.rm(entry))
    }

    pub fn check_rmall(&self, sock: SocketId, transport: TransportKind) {
        if let Some(list) = self.acl.write().get_mut(&(sock, transport)) {
            list.rmall();
        }
    }

    #[must_use]
    pub fn check_validate(&self, sock: SocketId, transport: TransportKind, addr: IpAddr) -> AclAction {
        let action = self
            .acl
            .read()
            .get(&(sock, transport))
            .map_or(AclAction::Reject, |list| list.validate(addr));
        if action == AclAction::Reject {
            self.log(LogLevel::Debug, "acl", format!("rejected {addr}"));
        }
        action
    }

    // ---- hosts (C7) ------------------------------------------------------

    pub fn host_add(&self, host: Host) {
        self.hosts.write().insert(host.id, host);
    }

    pub fn host_remove(&self, id: HostId) -> Option<Host> {
        self.hosts.write().remove(&id)
    }

    #[must_use]
    pub fn host_get_list(&self) -> Vec<HostId> {
        let mut ids: Vec<HostId> = self.hosts.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn host_set_name(&self, id: HostId, name: impl Into<String>) -> Result<(), KnetError> {
        self.hosts
            .write()
            .get_mut(&id)
            .map(|h| h.set_name(name))
            .ok_or_else(|| KnetError::Configuration(format!("unknown host {id}")))
    }

    pub fn host_get_status(&self, id: HostId) -> Result<HostStatus, KnetError> {
        self.hosts
            .read()
            .get(&id)
            .map(Host::status)
            .ok_or_else(|| KnetError::Configuration(format!("unknown host {id}")))
    }

    pub fn enable_status_change_notify(&self, callback: Arc<HostNotifyFn>) {
        self.notify.write().host = Some(callback);
    }

    pub fn enable_pmtud_notify(&self, callback: Arc<PmtudNotifyFn>) {
        self.notify.write().pmtud = Some(callback);
    }

    /// `pmtud_get`: current aggregate `data_mtu` for a host (the
    /// minimum observed MTU across its enabled links), per §4.7.
    pub fn pmtud_get(&self, id: HostId) -> Result<Option<u32>, KnetError> {
        self.hosts
            .read()
            .get(&id)
            .map(Host::aggregate_data_mtu)
            .ok_or_else(|| KnetError::Configuration(format!("unknown host {id}")))
    }

    /// `pmtud_setfreq`: sets the handle-wide PMTUd probe interval. The
    /// actual probe emission lives in the out-of-scope transport/worker
    /// layer (§1); this is the configuration knob that layer reads.
    pub fn pmtud_setfreq(&self, interval: std::time::Duration) {
        *self.pmtud_interval.write() = interval;
    }

    /// `pmtud_getfreq`: the interval last set by `pmtud_setfreq`.
    #[must_use]
    pub fn pmtud_getfreq(&self) -> std::time::Duration {
        *self.pmtud_interval.read()
    }

    pub fn enable_sock_notify(&self, callback: Arc<SockNotifyFn>) {
        self.notify.write().sock = Some(callback);
    }

    /// Recomputes reachability/MTU for `id` and dispatches at most one
    /// notification per flip/change, per §4.7.
    pub fn recompute_host_status(&self, id: HostId) {
        let (reachability_flipped, status, mtu_changed) = {
            let mut hosts = self.hosts.write();
            let Some(host) = hosts.get_mut(&id) else {
                return;
            };
            let flipped = host.recompute_reachability();
            (flipped, host.status(), host.recompute_pmtu())
        };

        if reachability_flipped {
            if let Some(cb) = self.notify.read().host.clone() {
                cb(id, status);
            }
        }
        if let Some(mtu) = mtu_changed {
            if let Some(cb) = self.notify.read().pmtud.clone() {
                cb(id, mtu);
            }
        }
    }

    /// Records a PMTUd observation on `(host_id, index)` and dispatches
    /// exactly one `pmtud_notify` if the host's aggregate `data_mtu`
    /// actually changed as a result (§4.7, C7). This is the entry point
    /// the out-of-scope PMTU prober calls as probes complete.
    pub fn link_observe_pmtu(&self, host_id: HostId, index: u8, mtu: u32) -> Result<(), KnetError> {
        let mtu_changed = {
            let mut hosts = self.hosts.write();
            let host = hosts
                .get_mut(&host_id)
                .ok_or_else(|| KnetError::Configuration(format!("unknown host {host_id}")))?;
            let link = host
                .link_mut(index)
                .ok_or_else(|| KnetError::Configuration(format!("unknown link {index}")))?;
            link.observe_pmtu(mtu);
            host.recompute_pmtu()
        };
        if let Some(mtu) = mtu_changed {
            if let Some(cb) = self.notify.read().pmtud.clone() {
                cb(host_id, mtu);
            }
        }
        Ok(())
    }

    // ---- links (C7) ------------------------------------------------------

    pub fn link_set_config(
        &self,
        host_id: HostId,
        index: u8,
        cfg: LinkConfig,
    ) -> Result<(), KnetError> {
        let mut hosts = self.hosts.write();
        let host = hosts
            .get_mut(&host_id)
            .ok_or_else(|| KnetError::Configuration(format!("unknown host {host_id}")))?;
        host.add_link(index, Link::new(cfg));
        Ok(())
    }

    pub fn link_clear_config(&self, host_id: HostId, index: u8) -> Result<(), KnetError> {
        let mut hosts = self.hosts.write();
        let host = hosts
            .get_mut(&host_id)
            .ok_or_else(|| KnetError::Configuration(format!("unknown host {host_id}")))?;
        host.remove_link(index);
        Ok(())
    }

    pub fn link_set_enable(&self, host_id: HostId, index: u8, enabled: bool) -> Result<(), KnetError> {
        {
            let mut hosts = self.hosts.write();
            let host = hosts
                .get_mut(&host_id)
                .ok_or_else(|| KnetError::Configuration(format!("unknown host {host_id}")))?;
            let link = host
                .link_mut(index)
                .ok_or_else(|| KnetError::Configuration(format!("unknown link {index}")))?;
            if enabled {
                link.enable();
            } else {
                link.disable();
            }
        }
        self.recompute_host_status(host_id);
        Ok(())
    }

    pub fn link_set_timeout(
        &self,
        host_id: HostId,
        index: u8,
        timeout_interval: std::time::Duration,
        ping_interval: std::time::Duration,
        precision_window: u32,
    ) -> Result<(), KnetError> {
        let mut hosts = self.hosts.write();
        let host = hosts
            .get_mut(&host_id)
            .ok_or_else(|| KnetError::Configuration(format!("unknown host {host_id}")))?;
        let link = host
            .link_mut(index)
            .ok_or_else(|| KnetError::Configuration(format!("unknown link {index}")))?;
        link.set_timeout(timeout_interval, ping_interval, precision_window);
        Ok(())
    }

    pub fn link_get_status(&self, host_id: HostId, index: u8) -> Result<LinkStatus, KnetError> {
        let hosts = self.hosts.read();
        let host = hosts
            .get(&host_id)
            .ok_or_else(|| KnetError::Configuration(format!("unknown host {host_id}")))?;
        host.link(index)
            .map(Link::status)
            .ok_or_else(|| KnetError::Configuration(format!("unknown link {index}")))
    }

    pub fn link_get_list(&self, host_id: HostId) -> Result<Vec<u8>, KnetError> {
        let hosts = self.hosts.read();
        let host = hosts
            .get(&host_id)
            .ok_or_else(|| KnetError::Configuration(format!("unknown host {host_id}")))?;
        Ok(host.link_indices())
    }

    // ---- data fd / channel registration ---------------------------------

    /// `handle_add_datafd`: `channel ∈ [0, MAX_CHANNEL)`.
    pub fn add_datafd(&self, channel: u8) -> Result<DataFd, KnetError> {
        if channel >= crate::MAX_CHANNEL {
            return Err(KnetError::Configuration(format!(
                "channel {channel} out of range [0, {})",
                crate::MAX_CHANNEL
            )));
        }
        let fd = DataFd(self.next_datafd.fetch_add(1, Ordering::Relaxed));
        self.datafds.write().insert(fd, channel);
        Ok(fd)
    }

    pub fn remove_datafd(&self, fd: DataFd) -> Result<(), KnetError> {
        self.datafds
            .write()
            .remove(&fd)
            .map(|_| ())
            .ok_or_else(|| KnetError::Configuration("unknown data fd".into()))
    }

    pub fn get_datafd(&self, channel: u8) -> Option<DataFd> {
        self.datafds
            .read()
            .iter()
            .find(|(_, &c)| c == channel)
            .map(|(&fd, _)| fd)
    }

    pub fn get_channel(&self, fd: DataFd) -> Option<u8> {
        self.datafds.read().get(&fd).copied()
    }

    /// Scans every link of every host for a timed-out `CONNECTED` state
    /// and recomputes host status for any host that had a flip. Called
    /// once per tick by the ping worker (C7 "§4.7").
    pub fn tick_link_timeouts(&self, now: std::time::Instant) {
        let flipped_hosts: Vec<HostId> = {
            let mut hosts = self.hosts.write();
            hosts
                .iter_mut()
                .filter_map(|(&id, host)| {
                    let any_timed_out = host
                        .links_mut()
                        .map(|link| link.check_timeout(now))
                        .fold(false, |acc, flipped| acc || flipped);
                    any_timed_out.then_some(id)
                })
                .collect()
        };
        for id in flipped_hosts {
            self.recompute_host_status(id);
        }
    }
}
