//! Transport layer module for the DNP3 protocol
//!
//! This crate provides the channel abstraction shared by the link-layer
//! multiplexer, a pluggable frame codec, and concrete TCP and serial
//! channel implementations.

pub mod channel;
pub mod codec;
pub mod serial;
pub mod stream;
pub mod tcp;

pub use channel::{Channel, ChannelConnector};
pub use codec::{FrameCodec, PlainCodec};
pub use dnp3_core::{Dnp3Error, Dnp3Result};
pub use serial::{SerialChannel, SerialConnector, SerialSettings};
pub use stream::StreamChannel;
pub use tcp::{TcpChannel, TcpClientConnector, TcpServerConnector, TcpSettings};
