//! # knet-crypto-backends
//!
//! The two built-in `CryptoBackend` implementations. Names and pairing
//! rules follow the original crypto module table: each backend accepts a
//! fixed cipher/hash pairing and rejects everything else via
//! `CryptoError::InvalidConfig` rather than trying to be generic.
//!
//! Real primitives come from RustCrypto crates rather than binding an
//! external crypto library -- there is no NSS or OpenSSL underneath
//! either name, only the historical naming carried over from the model
//! table these backends are grounded on.

mod nss;
mod openssl;

pub use nss::NssBackend;
pub use openssl::OpensslBackend;
