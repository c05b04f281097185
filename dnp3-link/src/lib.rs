//! Link layer module for the DNP3 protocol
//!
//! This crate provides the session registry and the channel multiplexer
//! that shares one physical channel among multiple logical link sessions.

pub mod iohandler;
pub mod session;
pub mod statistics;

pub use dnp3_core::{Dnp3Error, Dnp3Result, LinkFrame, LinkHeader, Route};
pub use iohandler::{ChannelListener, ChannelRole, IoHandler};
pub use session::{LinkSession, SessionHandle, SessionRegistry};
pub use statistics::LinkStatistics;
