//! Fake transport, fixture capture/verify, and scenario runner shared
//! by `knet-core`'s integration tests and the `knet-harness` binary.
//!
//! Mirrors `original_source/libknet/tests/test-common.c` and
//! `tests/knet_test.c`'s role: a deterministic harness wrapped around
//! the real (here, out-of-scope) transport layer.

pub mod fake_transport;
pub mod fixtures;
pub mod report;
pub mod runner;
pub mod verify;

pub use fake_transport::{InMemoryNetwork, InMemoryTransport};
pub use fixtures::{FixtureCase, FixtureSet};
pub use report::ConformanceReport;
pub use runner::TestRunner;
pub use verify::{VerificationResult, VerificationSummary};
