//! Link ACL (C6, §4.6).
//!
//! An ordered, per-`(socket, transport)` list of address-match rules.
//! Matching stops at the first matching entry; absence of any match is
//! a reject. The hot path (`validate`) is one datagram at a time under
//! a read lock, so the list stays a plain `Vec` in insertion order --
//! hashing buys nothing at this scale and would lose the ordering the
//! semantics depend on.

use std::net::IpAddr;

/// How an [`AclEntry`] matches an inbound address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AclMatchKind {
    /// Exact address equality.
    Address,
    /// `ip1` is the prefix, `ip2` is the mask: `(addr & ip2) == (ip1 & ip2)`.
    Mask,
    /// Closed interval `[ip1, ip2]`, compared lexicographically by octet.
    Range,
}

/// What to do with a datagram once an entry matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AclAction {
    Accept,
    Reject,
}

/// One rule. Identity is `(kind, ip1, ip2, action)`, per §3 -- `rm`
/// removes the first entry equal in all four components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclEntry {
    pub kind: AclMatchKind,
    pub ip1: IpAddr,
    /// Unused for [`AclMatchKind::Address`]; the mask for `Mask`; the
    /// upper bound for `Range`.
    pub ip2: Option<IpAddr>,
    pub action: AclAction,
}

impl AclEntry {
    #[must_use]
    pub fn address(ip1: IpAddr, action: AclAction) -> Self {
        Self {
            kind: AclMatchKind::Address,
            ip1,
            ip2: None,
            action,
        }
    }

    #[must_use]
    pub fn mask(prefix: IpAddr, mask: IpAddr, action: AclAction) -> Self {
        Self {
            kind: AclMatchKind::Mask,
            ip1: prefix,
            ip2: Some(mask),
            action,
        }
    }

    #[must_use]
    pub fn range(lo: IpAddr, hi: IpAddr, action: AclAction) -> Self {
        Self {
            kind: AclMatchKind::Range,
            ip1: lo,
            ip2: Some(hi),
            action,
        }
    }

    fn matches(&self, addr: IpAddr) -> bool {
        match self.kind {
            AclMatchKind::Address => same_family(self.ip1, addr) && self.ip1 == addr,
            AclMatchKind::Mask => {
                let Some(mask) = self.ip2 else { return false };
                same_family(self.ip1, addr)
                    && same_family(self.ip1, mask)
                    && mask_eq(self.ip1, addr, mask)
            }
            AclMatchKind::Range => {
                let Some(hi) = self.ip2 else { return false };
                same_family(self.ip1, addr) && same_family(self.ip1, hi) && in_range(self.ip1, hi, addr)
            }
        }
    }
}

fn same_family(a: IpAddr, b: IpAddr) -> bool {
    matches!(
        (a, b),
        (IpAddr::V4(_), IpAddr::V4(_)) | (IpAddr::V6(_), IpAddr::V6(_))
    )
}

fn octets(ip: IpAddr) -> Vec<u8> {
    match ip {
        IpAddr::V4(v4) => v4.octets().to_vec(),
        IpAddr::V6(v6) => v6.octets().to_vec(),
    }
}

fn mask_eq(ip1: IpAddr, addr: IpAddr, mask: IpAddr) -> bool {
    let (ip1, addr, mask) = (octets(ip1), octets(addr), octets(mask));
    ip1.iter()
        .zip(addr.iter())
        .zip(mask.iter())
        .all(|((p, a), m)| (p & m) == (a & m))
}

fn in_range(lo: IpAddr, hi: IpAddr, addr: IpAddr) -> bool {
    let (lo, hi, addr) = (octets(lo), octets(hi), octets(addr));
    addr >= lo && addr <= hi
}

/// The ordered per-`(socket, transport)` ACL list.
#[derive(Debug, Clone, Default)]
pub struct AclTable {
    entries: Vec<AclEntry>,
}

impl AclTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `check_add`: appends.
    pub fn add(&mut self, entry: AclEntry) {
        self.entries.push(entry);
    }

    /// `check_rm`: removes the first entry equal in all components.
    /// Returns whether an entry was removed.
    pub fn rm(&mut self, entry: &AclEntry) -> bool {
        if let Some(pos) = self.entries.iter().position(|e| e == entry) {
            self.entries.remove(pos);
            true
        } else {
            false
        }
    }

    /// `check_rmall`: drops the whole list.
    pub fn rmall(&mut self) {
        self.entries.clear();
    }

    /// `check_validate`: first-match-wins; no match is a reject (P6).
    #[must_use]
    pub fn validate(&self, addr: IpAddr) -> AclAction {
        self.entries
            .iter()
            .find(|e| e.matches(addr))
            .map_or(AclAction::Reject, |e| e.action)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
