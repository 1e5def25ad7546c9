//! Structured logging (§6 "Log message", ambient stack).
//!
//! No `log`/`tracing` dependency, by design: the donor workspace hand-rolls
//! its own structured JSONL log record rather than pulling in a facade
//! crate, and this crate keeps that shape. `LogRecord` is the Rust
//! realization of §6's `{ handle_id, msg_level, subsystem, message_text }`
//! fixed-size record; [`Logger`] is the sink contract, with
//! [`ChannelLogger`] standing in for "written to the log fd... consumed
//! by the host" without owning the out-of-scope pipe/worker-thread
//! transport itself.

use std::sync::mpsc::{Receiver, SyncSender, TrySendError};

use serde::{Deserialize, Serialize};

/// Severity of a [`LogRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Err,
}

/// One structured log record, bounded the way the C API's fixed-size
/// record is: `message` is not arbitrarily large in practice, but this
/// port does not enforce a byte cap since the out-of-scope log transport
/// (not this crate) is what would need one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub handle_id: u32,
    pub level: LogLevel,
    pub subsystem: &'static str,
    pub message: String,
}

/// Sink for [`LogRecord`]s. Implementations must not block the data path
/// for long -- `recv`/`send` call through this on every ACL reject and
/// decrypt failure.
pub trait Logger: Send + Sync {
    fn log(&self, record: LogRecord);
}

/// Discards every record. Default for handles that don't care.
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _record: LogRecord) {}
}

/// Writes each record as a JSON line to stdout. Useful for the harness
/// scenario runner and for ad-hoc debugging.
pub struct StdoutLogger;

impl Logger for StdoutLogger {
    fn log(&self, record: LogRecord) {
        if let Ok(line) = serde_json::to_string(&record) {
            println!("{line}");
        }
    }
}

/// Feeds records into a bounded channel a host-owned thread drains.
///
/// This is the Rust analogue of §6's "written to the log fd as
/// fixed-size records... consumed by the host": the pipe and its
/// draining worker thread are an out-of-scope collaborator, so this
/// logger only owns the channel, not the transport beyond it. A full
/// channel drops the record rather than blocking the caller -- logging
/// must never become a second reconfiguration lock.
pub struct ChannelLogger {
    tx: SyncSender<LogRecord>,
}

impl ChannelLogger {
    /// Returns the logger plus the receiving end the host drains.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, Receiver<LogRecord>) {
        let (tx, rx) = std::sync::mpsc::sync_channel(capacity);
        (Self { tx }, rx)
    }
}

impl Logger for ChannelLogger {
    fn log(&self, record: LogRecord) {
        match self.tx.try_send(record) {
            Ok(()) | Err(TrySendError::Disconnected(_)) => {}
            Err(TrySendError::Full(_)) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_logger_delivers() {
        let (logger, rx) = ChannelLogger::new(4);
        logger.log(LogRecord {
            handle_id: 1,
            level: LogLevel::Debug,
            subsystem: "test",
            message: "hi".into(),
        });
        let record = rx.recv().unwrap();
        assert_eq!(record.message, "hi");
    }

    #[test]
    fn channel_logger_drops_when_full_instead_of_blocking() {
        let (logger, _rx) = ChannelLogger::new(1);
        logger.log(LogRecord {
            handle_id: 1,
            level: LogLevel::Debug,
            subsystem: "test",
            message: "a".into(),
        });
        // Second send should not panic or block even though the queue is full
        // and nobody has drained it yet.
        logger.log(LogRecord {
            handle_id: 1,
            level: LogLevel::Debug,
            subsystem: "test",
            message: "b".into(),
        });
    }
}
