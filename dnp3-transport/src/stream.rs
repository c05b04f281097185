//! Generic channel over an async byte stream

use crate::channel::Channel;
use crate::codec::{FrameCodec, PlainCodec};
use async_trait::async_trait;
use bytes::BytesMut;
use dnp3_core::{Dnp3Error, Dnp3Result, LinkFrame, LinkHeader};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const READ_CHUNK: usize = 4096;

/// Channel implementation over any async byte stream
///
/// Drives the injected frame codec against the stream: inbound bytes are
/// accumulated until the codec yields a frame, outbound frames are encoded
/// and written through in one piece. EOF surfaces as
/// `Dnp3Error::ChannelClosed`, I/O errors as `Dnp3Error::Connection`.
pub struct StreamChannel<S> {
    stream: S,
    codec: Box<dyn FrameCodec>,
    rx_buffer: BytesMut,
    read_timeout: Option<Duration>,
    closed: bool,
}

impl<S> StreamChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Create a new channel with the default plain framing
    pub fn new(stream: S, read_timeout: Option<Duration>) -> Self {
        Self::with_codec(stream, Box::new(PlainCodec::new()), read_timeout)
    }

    /// Create a new channel with a custom frame codec
    pub fn with_codec(
        stream: S,
        codec: Box<dyn FrameCodec>,
        read_timeout: Option<Duration>,
    ) -> Self {
        Self {
            stream,
            codec,
            rx_buffer: BytesMut::with_capacity(READ_CHUNK),
            read_timeout,
            closed: false,
        }
    }

    async fn fill(&mut self) -> Dnp3Result<()> {
        let mut chunk = [0u8; READ_CHUNK];

        let read = if let Some(timeout) = self.read_timeout {
            tokio::time::timeout(timeout, self.stream.read(&mut chunk))
                .await
                .map_err(|_| Dnp3Error::Timeout)?
        } else {
            self.stream.read(&mut chunk).await
        };

        match read {
            Ok(0) => {
                self.closed = true;
                Err(Dnp3Error::ChannelClosed)
            }
            Ok(n) => {
                self.rx_buffer.extend_from_slice(&chunk[..n]);
                Ok(())
            }
            Err(e) => {
                self.closed = true;
                Err(Dnp3Error::Connection(e))
            }
        }
    }
}

#[async_trait]
impl<S> Channel for StreamChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn read(&mut self) -> Dnp3Result<LinkFrame> {
        if self.closed {
            return Err(Dnp3Error::ChannelClosed);
        }

        loop {
            if let Some(frame) = self.codec.decode(&mut self.rx_buffer)? {
                return Ok(frame);
            }
            self.fill().await?;
        }
    }

    async fn write(&mut self, header: LinkHeader, payload: &[u8]) -> Dnp3Result<()> {
        if self.closed {
            return Err(Dnp3Error::ChannelClosed);
        }

        let encoded = self.codec.encode(header, payload)?;
        self.stream.write_all(&encoded).await.map_err(|e| {
            self.closed = true;
            Dnp3Error::Connection(e)
        })?;
        self.stream.flush().await.map_err(|e| {
            self.closed = true;
            Dnp3Error::Connection(e)
        })?;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    async fn close(&mut self) -> Dnp3Result<()> {
        if !self.closed {
            let _ = self.stream.shutdown().await;
            self.closed = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn test_stream_channel_frame_round_trip() {
        let (a, b) = duplex(1024);
        let mut left = StreamChannel::new(a, None);
        let mut right = StreamChannel::new(b, None);

        left.write(LinkHeader::new(1, 10), b"payload").await.unwrap();
        let frame = right.read().await.unwrap();
        assert_eq!(frame.header, LinkHeader::new(1, 10));
        assert_eq!(&frame.payload[..], b"payload");
    }

    #[tokio::test]
    async fn test_stream_channel_reports_closed_on_eof() {
        let (a, b) = duplex(1024);
        let mut right = StreamChannel::new(b, None);
        drop(a);

        match right.read().await {
            Err(Dnp3Error::ChannelClosed) => {}
            other => panic!("expected ChannelClosed, got {:?}", other.map(|_| ())),
        }
        assert!(right.is_closed());
    }
}
