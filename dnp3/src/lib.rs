//! Rust implementation of the DNP3 protocol
//!
//! This library provides the channel and session management layer of a
//! DNP3 stack together with Secure Authentication (SAv5) support for
//! outstations.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `dnp3-core`: Core types, addressing, and error handling
//! - `dnp3-transport`: Physical channels (TCP client/server, serial) and framing
//! - `dnp3-link`: Link-session multiplexing over a shared channel
//! - `dnp3-security`: SAv5 outstation authentication
//!
//! # Usage
//!
//! ```no_run
//! use dnp3::link::{ChannelRole, IoHandler};
//! use dnp3::transport::{TcpClientConnector, TcpSettings};
//! ```

// Re-export core types
pub use dnp3_core::{ApduHeader, Dnp3Error, Dnp3Result, FunctionCode, LinkFrame, LinkHeader, Route};

// Re-export the transport layer
pub mod transport {
    pub use dnp3_transport::*;
}

// Re-export the link multiplexer
pub mod link {
    pub use dnp3_link::*;
}

// Re-export secure authentication
pub mod security {
    pub use dnp3_security::*;
}
