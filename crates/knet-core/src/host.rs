//! Host registry entry (§3 "Host").
//!
//! A host aggregates the links toward one peer node id. Reachability is
//! the OR of its links' connected state (§4.7); the handle recomputes
//! and notifies on every flip.

use std::collections::HashMap;

use crate::link::{Link, LinkState};

/// A peer node id (§"GLOSSARY" Host).
pub type HostId = u16;

/// Snapshot returned by `host_get_status` (§6).
#[derive(Debug, Clone, Copy)]
pub struct HostStatus {
    pub reachable: bool,
    pub remote: bool,
    pub external: bool,
}

/// A peer identity plus its set of links (§3).
pub struct Host {
    pub id: HostId,
    pub name: String,
    pub remote: bool,
    pub external: bool,
    reachable: bool,
    last_notified_mtu: Option<u32>,
    links: HashMap<u8, Link>,
}

impl Host {
    #[must_use]
    pub fn new(id: HostId, name: impl Into<String>, remote: bool, external: bool) -> Self {
        Self {
            id,
            name: name.into(),
            remote,
            external,
            reachable: false,
            last_notified_mtu: None,
            links: HashMap::new(),
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn add_link(&mut self, index: u8, link: Link) {
        self.links.insert(index, link);
    }

    pub fn remove_link(&mut self, index: u8) -> Option<Link> {
        self.links.remove(&index)
    }

    #[must_use]
    pub fn link(&self, index: u8) -> Option<&Link> {
        self.links.get(&index)
    }

    pub fn link_mut(&mut self, index: u8) -> Option<&mut Link> {
        self.links.get_mut(&index)
    }

    #[must_use]
    pub fn link_indices(&self) -> Vec<u8> {
        let mut indices: Vec<u8> = self.links.keys().copied().collect();
        indices.sort_unstable();
        indices
    }

    #[must_use]
    pub fn links_mut(&mut self) -> impl Iterator<Item = &mut Link> {
        self.links.values_mut()
    }

    /// Host reachability is the OR of its links' `Connected` state.
    /// Returns `true` if the reachability flag flipped, so the caller
    /// can emit exactly one `host_notify` per flip.
    pub fn recompute_reachability(&mut self) -> bool {
        let now_reachable = self
            .links
            .values()
            .any(|l| l.state() == LinkState::Connected);
        let flipped = now_reachable != self.reachable;
        self.reachable = now_reachable;
        flipped
    }

    /// Aggregate `data_mtu` across this host's enabled links: the
    /// minimum observed value, since the host's effective datagram size
    /// is bounded by its worst path. `None` if no link has an
    /// observation yet.
    #[must_use]
    pub fn aggregate_data_mtu(&self) -> Option<u32> {
        self.links
            .values()
            .filter(|l| l.state() != LinkState::Disabled)
            .filter_map(|l| l.status().data_mtu)
            .min()
    }

    /// Recomputes the aggregate `data_mtu` and returns `Some(mtu)` only
    /// the first time it is observed to differ from the last value this
    /// returned `Some` for, so the caller can dispatch exactly one
    /// `pmtud_notify` per change (§4.7).
    pub fn recompute_pmtu(&mut self) -> Option<u32> {
        let mtu = self.aggregate_data_mtu();
        let changed = mtu.is_some() && mtu != self.last_notified_mtu;
        self.last_notified_mtu = mtu;
        changed.then_some(mtu).flatten()
    }

    #[must_use]
    pub fn status(&self) -> HostStatus {
        HostStatus {
            reachable: self.reachable,
            remote: self.remote,
            external: self.external,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::{LinkConfig, TransportKind};
    use std::time::{Duration, Instant};

    fn link() -> Link {
        Link::new(LinkConfig {
            transport: TransportKind::Udp,
            src: "127.0.0.1:6000".parse().unwrap(),
            dst: "127.0.0.1:6001".parse().unwrap(),
            timeout_interval: Duration::from_secs(5),
            ping_interval: Duration::from_secs(1),
            precision_window: 8,
        })
    }

    #[test]
    fn reachability_is_or_of_links() {
        let mut host = Host::new(1, "peer-a", true, false);
        host.add_link(0, link());
        host.add_link(1, link());

        assert!(!host.recompute_reachability());
        assert!(!host.status().reachable);

        host.link_mut(0).unwrap().enable();
        host.link_mut(0)
            .unwrap()
            .on_pong(Duration::from_millis(5), Instant::now());

        assert!(host.recompute_reachability());
        assert!(host.status().reachable);
        // Second recompute with no state change should not flip again.
        assert!(!host.recompute_reachability());
    }

    #[test]
    fn aggregate_mtu_is_minimum_over_enabled_links() {
        let mut host = Host::new(1, "peer-a", true, false);
        host.add_link(0, link());
        host.add_link(1, link());
        host.link_mut(0).unwrap().enable();
        host.link_mut(1).unwrap().enable();
        host.link_mut(0).unwrap().observe_pmtu(1400);
        host.link_mut(1).unwrap().observe_pmtu(1350);
        assert_eq!(host.aggregate_data_mtu(), Some(1350));
    }
}
