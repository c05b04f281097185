//! Core types for the DNP3 protocol
//!
//! This crate provides the shared value types (routes, link frames, APDU
//! headers) and the error type used by the other workspace crates.

pub mod apdu;
pub mod error;
pub mod frame;
pub mod route;

pub use apdu::{ApduHeader, FunctionCode};
pub use error::{Dnp3Error, Dnp3Result};
pub use frame::{LinkFrame, LinkHeader};
pub use route::Route;
