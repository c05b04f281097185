//! TCP channel implementations

use crate::channel::{Channel, ChannelConnector};
use crate::codec::FrameCodec;
use crate::stream::StreamChannel;
use async_trait::async_trait;
use dnp3_core::{Dnp3Error, Dnp3Result};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};

/// TCP channel settings
#[derive(Debug, Clone)]
pub struct TcpSettings {
    pub address: SocketAddr,
    pub connect_timeout: Option<Duration>,
    pub read_timeout: Option<Duration>,
}

impl TcpSettings {
    /// Create new TCP settings
    pub fn new(address: SocketAddr) -> Self {
        Self {
            address,
            connect_timeout: Some(Duration::from_secs(30)),
            read_timeout: None,
        }
    }

    /// Create TCP settings with a read timeout
    pub fn with_read_timeout(address: SocketAddr, timeout: Duration) -> Self {
        Self {
            address,
            connect_timeout: Some(Duration::from_secs(30)),
            read_timeout: Some(timeout),
        }
    }
}

/// A channel over a connected TCP stream
pub type TcpChannel = StreamChannel<TcpStream>;

/// Codec factory used when a connector hands out more than one channel
type CodecFactory = Box<dyn Fn() -> Box<dyn FrameCodec> + Send>;

/// Active connector: dials out to a remote endpoint
pub struct TcpClientConnector {
    settings: TcpSettings,
    codec_factory: Option<CodecFactory>,
}

impl TcpClientConnector {
    /// Create a new client connector
    pub fn new(settings: TcpSettings) -> Self {
        Self {
            settings,
            codec_factory: None,
        }
    }

    /// Use a custom frame codec for every channel this connector creates
    pub fn with_codec<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn FrameCodec> + Send + 'static,
    {
        self.codec_factory = Some(Box::new(factory));
        self
    }

    fn make_channel(&self, stream: TcpStream) -> Box<dyn Channel> {
        match &self.codec_factory {
            Some(factory) => Box::new(TcpChannel::with_codec(
                stream,
                factory(),
                self.settings.read_timeout,
            )),
            None => Box::new(TcpChannel::new(stream, self.settings.read_timeout)),
        }
    }
}

#[async_trait]
impl ChannelConnector for TcpClientConnector {
    async fn connect(&mut self) -> Dnp3Result<Box<dyn Channel>> {
        let stream = if let Some(timeout) = self.settings.connect_timeout {
            tokio::time::timeout(timeout, TcpStream::connect(self.settings.address))
                .await
                .map_err(|_| Dnp3Error::Timeout)?
                .map_err(Dnp3Error::Connection)?
        } else {
            TcpStream::connect(self.settings.address)
                .await
                .map_err(Dnp3Error::Connection)?
        };

        log::debug!("TCP channel connected to {}", self.settings.address);
        Ok(self.make_channel(stream))
    }
}

/// Passive connector: listens and accepts inbound connections
pub struct TcpServerConnector {
    listener: TcpListener,
    read_timeout: Option<Duration>,
    codec_factory: Option<CodecFactory>,
}

impl TcpServerConnector {
    /// Bind a listener on the given address
    pub async fn bind(address: SocketAddr) -> Dnp3Result<Self> {
        let listener = TcpListener::bind(address)
            .await
            .map_err(Dnp3Error::Connection)?;
        log::info!("DNP3 channel listening on {}", address);
        Ok(Self {
            listener,
            read_timeout: None,
            codec_factory: None,
        })
    }

    /// Set the read timeout applied to accepted channels
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Use a custom frame codec for every accepted channel
    pub fn with_codec<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn FrameCodec> + Send + 'static,
    {
        self.codec_factory = Some(Box::new(factory));
        self
    }
}

#[async_trait]
impl ChannelConnector for TcpServerConnector {
    async fn connect(&mut self) -> Dnp3Result<Box<dyn Channel>> {
        let (stream, peer) = self.listener.accept().await.map_err(Dnp3Error::Connection)?;
        log::info!("Accepted DNP3 channel from {}", peer);

        Ok(match &self.codec_factory {
            Some(factory) => Box::new(TcpChannel::with_codec(
                stream,
                factory(),
                self.read_timeout,
            )),
            None => Box::new(TcpChannel::new(stream, self.read_timeout)),
        })
    }
}
