//! Link frame types

use bytes::Bytes;
use std::fmt;

/// Addressing metadata of a link frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkHeader {
    source: u16,
    destination: u16,
}

impl LinkHeader {
    /// Create a new link header
    pub fn new(source: u16, destination: u16) -> Self {
        Self {
            source,
            destination,
        }
    }

    /// Get the source address
    pub fn source(&self) -> u16 {
        self.source
    }

    /// Get the destination address
    pub fn destination(&self) -> u16 {
        self.destination
    }
}

impl fmt::Display for LinkHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source, self.destination)
    }
}

/// A decoded link frame: addressing metadata plus payload bytes
///
/// Byte-level encoding (CRC, octet stuffing) is handled by the transport
/// codec; by the time a frame reaches the multiplexer it is already in
/// this form.
#[derive(Debug, Clone)]
pub struct LinkFrame {
    pub header: LinkHeader,
    pub payload: Bytes,
}

impl LinkFrame {
    /// Create a new link frame
    pub fn new(header: LinkHeader, payload: Bytes) -> Self {
        Self { header, payload }
    }
}
