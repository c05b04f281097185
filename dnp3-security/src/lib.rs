//! Secure authentication module for DNP3 outstations
//!
//! This crate provides the SAv5 challenge/response state machine that
//! gates application-layer requests, the crypto provider capability it
//! drives, and the single-slot deferred request buffer.

pub mod crypto;
pub mod deferred;
pub mod key_status;
pub mod provider;
pub mod statistics;

pub use crypto::{CryptoProvider, HmacSha256Provider, NullCryptoProvider, UserId, DEFAULT_USER};
pub use deferred::DeferredRequest;
pub use key_status::KeyStatus;
pub use provider::{AuthOutcome, OutstationAuthProvider, OutstationSession};
pub use statistics::SecurityStatistics;
