//! Channel abstraction over a physical transport

use async_trait::async_trait;
use dnp3_core::{Dnp3Result, LinkFrame, LinkHeader};

/// An open channel to a remote link endpoint
///
/// A channel yields decoded link frames (payload plus addressing metadata)
/// and accepts outbound frames addressed with a link header. Failures are
/// reported through the error type so callers can distinguish an orderly
/// close (`Dnp3Error::ChannelClosed`) from an I/O error
/// (`Dnp3Error::Connection`).
#[async_trait]
pub trait Channel: Send {
    /// Read the next inbound frame
    ///
    /// Suspends until a complete frame is available, the configured read
    /// timeout elapses, or the channel fails.
    async fn read(&mut self) -> Dnp3Result<LinkFrame>;

    /// Write one outbound frame
    async fn write(&mut self, header: LinkHeader, payload: &[u8]) -> Dnp3Result<()>;

    /// Check if the channel is closed
    fn is_closed(&self) -> bool;

    /// Close the channel
    async fn close(&mut self) -> Dnp3Result<()>;
}

/// A source of fresh channels
///
/// The same interface serves both transport roles: an active (dialing)
/// connector establishes an outbound connection, a passive (listening)
/// connector waits for an inbound one. The multiplexer calls `connect`
/// whenever it needs a new channel and never cares which role it is
/// talking to.
#[async_trait]
pub trait ChannelConnector: Send {
    /// Establish a new channel
    async fn connect(&mut self) -> Dnp3Result<Box<dyn Channel>>;
}
