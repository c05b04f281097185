//! Frame codec trait and the plain framing implementation

use bytes::{BufMut, Bytes, BytesMut};
use dnp3_core::{Dnp3Error, Dnp3Result, LinkFrame, LinkHeader};

/// Fixed header size of the plain framing: destination, source, length
pub const PLAIN_HEADER_LEN: usize = 6;

/// Byte-level frame codec
///
/// Converts between raw transport bytes and decoded link frames. The
/// CRC/octet-stuffed wire format of a real deployment is supplied as an
/// implementation of this trait; `PlainCodec` is the default framing used
/// when no such codec is injected.
pub trait FrameCodec: Send {
    /// Encode one frame to wire bytes
    fn encode(&mut self, header: LinkHeader, payload: &[u8]) -> Dnp3Result<Vec<u8>>;

    /// Try to decode one frame from the receive buffer
    ///
    /// Returns `Ok(None)` when the buffer does not yet hold a complete
    /// frame. Consumed bytes are removed from the buffer.
    fn decode(&mut self, buf: &mut BytesMut) -> Dnp3Result<Option<LinkFrame>>;
}

/// Plain length-delimited framing
///
/// Wire layout, all fields big-endian:
/// ```text
/// destination (2 bytes) | source (2 bytes) | length (2 bytes) | payload
/// ```
#[derive(Debug, Default)]
pub struct PlainCodec;

impl PlainCodec {
    /// Create a new plain codec
    pub fn new() -> Self {
        Self
    }
}

impl FrameCodec for PlainCodec {
    fn encode(&mut self, header: LinkHeader, payload: &[u8]) -> Dnp3Result<Vec<u8>> {
        if payload.len() > u16::MAX as usize {
            return Err(Dnp3Error::InvalidData(format!(
                "Payload of {} bytes exceeds the maximum frame size",
                payload.len()
            )));
        }

        let mut out = Vec::with_capacity(PLAIN_HEADER_LEN + payload.len());
        out.extend_from_slice(&header.destination().to_be_bytes());
        out.extend_from_slice(&header.source().to_be_bytes());
        out.extend_from_slice(&(payload.len() as u16).to_be_bytes());
        out.extend_from_slice(payload);
        Ok(out)
    }

    fn decode(&mut self, buf: &mut BytesMut) -> Dnp3Result<Option<LinkFrame>> {
        if buf.len() < PLAIN_HEADER_LEN {
            return Ok(None);
        }

        let destination = u16::from_be_bytes([buf[0], buf[1]]);
        let source = u16::from_be_bytes([buf[2], buf[3]]);
        let length = u16::from_be_bytes([buf[4], buf[5]]) as usize;

        if buf.len() < PLAIN_HEADER_LEN + length {
            return Ok(None);
        }

        let _ = buf.split_to(PLAIN_HEADER_LEN);
        let payload: Bytes = buf.split_to(length).freeze();

        Ok(Some(LinkFrame::new(
            LinkHeader::new(source, destination),
            payload,
        )))
    }
}
