// All extern "C" exports accept raw pointers from a C caller; per-function
// safety docs would restate the same contract on every symbol.
#![allow(clippy::missing_safety_doc)]
//! # knet-abi
//!
//! Stable `extern "C"` boundary over `knet-core`, producing `libknet.so`.
//! Thin by design: every function here validates/converts FFI inputs and
//! delegates straight to `knet-core::api`. `KnetError` is translated to
//! the errno-equivalent taxonomy of §7 *only* at this boundary (the
//! errno-discipline design note, §9) -- `knet-core` itself never deals in
//! raw integers.
//!
//! ```text
//! C caller -> ABI entry (this crate) -> knet-core::api -> Handle
//! ```

mod acl_abi;
mod errno;
mod handle_abi;
mod host_abi;
mod link_abi;
mod types;

pub use errno::{knet_errno, KnetErrno};
pub use types::KnetCryptoConfig;

pub use acl_abi::*;
pub use handle_abi::*;
pub use host_abi::*;
pub use link_abi::*;
