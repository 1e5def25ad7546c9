//! Worker threads (§5 "Scheduling model").
//!
//! A small number of long-lived native threads rather than an async
//! runtime -- the donor workspace has no async dependency either, and
//! nothing in this spec needs one. Each worker is a plain
//! `std::thread::spawn` loop gated by a `crossbeam-channel` shutdown
//! signal, joined by [`WorkerPool::shutdown`] (the `handle_free`
//! analogue for background threads, §5 "Cancellation").

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::handle::Handle;

/// One periodic worker thread plus the signal that stops it.
struct Worker {
    shutdown: Sender<()>,
    join: Option<JoinHandle<()>>,
}

impl Worker {
    fn spawn(name: &'static str, period: Duration, mut tick: impl FnMut(Instant) + Send + 'static) -> Self {
        let (shutdown, rx): (Sender<()>, Receiver<()>) = bounded(1);
        let join = std::thread::Builder::new()
            .name(name.into())
            .spawn(move || loop {
                match rx.recv_timeout(period) {
                    Ok(()) => return,
                    Err(crossbeam_channel::RecvTimeoutError::Timeout) => tick(Instant::now()),
                    Err(crossbeam_channel::RecvTimeoutError::Disconnected) => return,
                }
            })
            .expect("failed to spawn worker thread");
        Self {
            shutdown,
            join: Some(join),
        }
    }

    fn stop(&mut self) {
        let _ = self.shutdown.send(());
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// The ping/PMTUd/heartbeat/housekeeping workers for one [`Handle`].
///
/// PMTUd and DST-cache-clean are both modeled as generic periodic
/// workers here: this redesign has no DST/NAT cache (see `DESIGN.md`),
/// so the "DST-cache-clean" worker named in §5 becomes a general
/// `Housekeeping` tick with nothing cache-specific to do yet, kept as a
/// named worker so future per-tick maintenance has an obvious home.
pub struct WorkerPool {
    ping: Worker,
    heartbeat: Worker,
    housekeeping: Worker,
}

impl WorkerPool {
    #[must_use]
    pub fn start(handle: Arc<Handle>, ping_period: Duration, heartbeat_period: Duration) -> Self {
        let ping_handle = Arc::clone(&handle);
        let ping = Worker::spawn("knet-ping", ping_period, move |now| {
            ping_handle.tick_link_timeouts(now);
        });

        let heartbeat = Worker::spawn("knet-heartbeat", heartbeat_period, move |_now| {
            // Out-of-scope: actual ping datagram emission goes through the
            // `Transport` trait, owned by the host application.
        });

        let housekeeping = Worker::spawn("knet-housekeeping", Duration::from_secs(30), move |_now| {});

        Self {
            ping,
            heartbeat,
            housekeeping,
        }
    }

    /// Signals every worker to stop and joins them. No partial-shutdown
    /// state is observable afterward (§5 "Cancellation").
    pub fn shutdown(mut self) {
        self.ping.stop();
        self.heartbeat.stop();
        self.housekeeping.stop();
    }
}
