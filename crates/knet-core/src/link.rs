//! Link state & control (C7, §4.7, "State machine — link").
//!
//! `DISABLED -> (enable) -> PROBING -> (first valid pong) -> CONNECTED <->
//! (timeout / recover) -> DISCONNECTED`; any state -> (disable or host
//! removal) -> `DISABLED`. Only `CONNECTED` and `DISCONNECTED` count
//! toward host reachability; `PROBING` is not-reachable but actively
//! ping-emitting.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Wire transport a link runs over. The concrete socket layer is an
/// out-of-scope collaborator (§1); this tag exists only so the ACL
/// table and link table can be keyed/filtered by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    Udp,
    Sctp,
}

/// The link state machine's states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disabled,
    Probing,
    Connected,
    Disconnected,
}

impl LinkState {
    /// Only `Connected`/`Disconnected` contribute to host reachability.
    #[must_use]
    pub fn is_reachability_contributing(self) -> bool {
        matches!(self, LinkState::Connected | LinkState::Disconnected)
    }

    #[must_use]
    pub fn is_connected(self) -> bool {
        matches!(self, LinkState::Connected)
    }
}

/// `link_set_config` input (§6).
#[derive(Debug, Clone)]
pub struct LinkConfig {
    pub transport: TransportKind,
    pub src: SocketAddr,
    pub dst: SocketAddr,
    pub timeout_interval: Duration,
    pub ping_interval: Duration,
    /// Number of latency samples the EWMA's effective window covers.
    pub precision_window: u32,
}

/// Point-in-time snapshot returned by `link_get_status` (§6).
#[derive(Debug, Clone, Copy)]
pub struct LinkStatus {
    pub state: LinkState,
    pub enabled: bool,
    pub connected: bool,
    pub latency_us: Option<f64>,
    pub data_mtu: Option<u32>,
}

/// Per `(host, link-index)` record (§3).
pub struct Link {
    pub transport: TransportKind,
    pub src: SocketAddr,
    pub dst: SocketAddr,
    state: LinkState,
    latency_ewma_us: Option<f64>,
    ewma_alpha: f64,
    timeout_interval: Duration,
    ping_interval: Duration,
    timeout_deadline: Option<Instant>,
    data_mtu: Option<u32>,
}

impl Link {
    #[must_use]
    pub fn new(cfg: LinkConfig) -> Self {
        let window = cfg.precision_window.max(1) as f64;
        Self {
            transport: cfg.transport,
            src: cfg.src,
            dst: cfg.dst,
            state: LinkState::Disabled,
            latency_ewma_us: None,
            // Standard EWMA weight for an N-sample effective window.
            ewma_alpha: 2.0 / (window + 1.0),
            timeout_interval: cfg.timeout_interval,
            ping_interval: cfg.ping_interval,
            timeout_deadline: None,
            data_mtu: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> LinkState {
        self.state
    }

    #[must_use]
    pub fn ping_interval(&self) -> Duration {
        self.ping_interval
    }

    #[must_use]
    pub fn status(&self) -> LinkStatus {
        LinkStatus {
            state: self.state,
            enabled: self.state != LinkState::Disabled,
            connected: self.state.is_connected(),
            latency_us: self.latency_ewma_us,
            data_mtu: self.data_mtu,
        }
    }

    /// `link_set_timeout`: updates the timeout/ping intervals and the
    /// EWMA window without disturbing the link's current state or
    /// accumulated latency sample.
    pub fn set_timeout(
        &mut self,
        timeout_interval: Duration,
        ping_interval: Duration,
        precision_window: u32,
    ) {
        let window = precision_window.max(1) as f64;
        self.timeout_interval = timeout_interval;
        self.ping_interval = ping_interval;
        self.ewma_alpha = 2.0 / (window + 1.0);
    }

    /// `link_set_enable(true)`: `DISABLED -> PROBING`. No-op if already
    /// enabled.
    pub fn enable(&mut self) {
        if self.state == LinkState::Disabled {
            self.state = LinkState::Probing;
            self.timeout_deadline = None;
        }
    }

    /// `link_set_enable(false)` / host removal: any state -> `DISABLED`.
    pub fn disable(&mut self) {
        self.state = LinkState::Disabled;
        self.timeout_deadline = None;
        self.latency_ewma_us = None;
        self.data_mtu = None;
    }

    /// A valid pong arrived with round-trip time `rtt`. First pong while
    /// `PROBING` or recovery from `DISCONNECTED` both transition to
    /// `CONNECTED`; in `DISABLED` this is a stale/ignored pong.
    pub fn on_pong(&mut self, rtt: Duration, now: Instant) {
        if self.state == LinkState::Disabled {
            return;
        }
        self.state = LinkState::Connected;
        self.timeout_deadline = Some(now + self.timeout_interval);

        let sample_us = rtt.as_secs_f64() * 1_000_000.0;
        self.latency_ewma_us = Some(match self.latency_ewma_us {
            Some(prev) => self.ewma_alpha * sample_us + (1.0 - self.ewma_alpha) * prev,
            None => sample_us,
        });
    }

    /// Called by the ping worker each tick. Returns `true` if this call
    /// flipped `CONNECTED -> DISCONNECTED` (the caller uses this to
    /// schedule exactly one host-status recomputation).
    pub fn check_timeout(&mut self, now: Instant) -> bool {
        if self.state != LinkState::Connected {
            return false;
        }
        match self.timeout_deadline {
            Some(deadline) if now > deadline => {
                self.state = LinkState::Disconnected;
                true
            }
            _ => false,
        }
    }

    /// Records a PMTUd observation. Returns `true` if `data_mtu` changed.
    pub fn observe_pmtu(&mut self, mtu: u32) -> bool {
        let changed = self.data_mtu != Some(mtu);
        self.data_mtu = Some(mtu);
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> LinkConfig {
        LinkConfig {
            transport: TransportKind::Udp,
            src: "127.0.0.1:6000".parse().unwrap(),
            dst: "127.0.0.1:6001".parse().unwrap(),
            timeout_interval: Duration::from_secs(5),
            ping_interval: Duration::from_secs(1),
            precision_window: 8,
        }
    }

    #[test]
    fn state_machine_disabled_probing_connected() {
        let mut link = Link::new(cfg());
        assert_eq!(link.state(), LinkState::Disabled);
        link.enable();
        assert_eq!(link.state(), LinkState::Probing);
        link.on_pong(Duration::from_millis(20), Instant::now());
        assert_eq!(link.state(), LinkState::Connected);
        assert!(link.status().latency_us.unwrap() > 0.0);
    }

    #[test]
    fn timeout_flips_to_disconnected() {
        let mut link = Link::new(cfg());
        link.enable();
        let t0 = Instant::now();
        link.on_pong(Duration::from_millis(10), t0);
        let past_deadline = t0 + Duration::from_secs(10);
        assert!(link.check_timeout(past_deadline));
        assert_eq!(link.state(), LinkState::Disconnected);
    }

    #[test]
    fn set_timeout_updates_ping_interval_without_resetting_state() {
        let mut link = Link::new(cfg());
        link.enable();
        link.on_pong(Duration::from_millis(10), Instant::now());
        link.set_timeout(Duration::from_secs(20), Duration::from_millis(250), 4);
        assert_eq!(link.state(), LinkState::Connected);
        assert_eq!(link.ping_interval(), Duration::from_millis(250));
        assert!(link.status().latency_us.is_some());
    }

    #[test]
    fn disable_resets_to_disabled_from_any_state() {
        let mut link = Link::new(cfg());
        link.enable();
        link.on_pong(Duration::from_millis(10), Instant::now());
        link.disable();
        assert_eq!(link.state(), LinkState::Disabled);
    }

    #[test]
    fn pmtu_change_detection() {
        let mut link = Link::new(cfg());
        assert!(link.observe_pmtu(1400));
        assert!(!link.observe_pmtu(1400));
        assert!(link.observe_pmtu(1350));
    }

    #[test]
    fn only_connected_and_disconnected_contribute_to_reachability() {
        assert!(!LinkState::Disabled.is_reachability_contributing());
        assert!(!LinkState::Probing.is_reachability_contributing());
        assert!(LinkState::Connected.is_reachability_contributing());
        assert!(LinkState::Disconnected.is_reachability_contributing());
    }
}
