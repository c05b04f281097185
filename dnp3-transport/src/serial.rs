//! Serial port channel implementation

use crate::channel::{Channel, ChannelConnector};
use crate::codec::FrameCodec;
use crate::stream::StreamChannel;
use async_trait::async_trait;
use dnp3_core::{Dnp3Error, Dnp3Result};
use std::time::Duration;
use tokio_serial::SerialStream;

/// Serial port channel settings
#[derive(Debug, Clone)]
pub struct SerialSettings {
    pub port_name: String,
    pub baud_rate: u32,
    pub data_bits: tokio_serial::DataBits,
    pub stop_bits: tokio_serial::StopBits,
    pub parity: tokio_serial::Parity,
    pub flow_control: tokio_serial::FlowControl,
    pub read_timeout: Option<Duration>,
}

impl SerialSettings {
    /// Create new serial settings with default framing parameters
    pub fn new(port_name: String, baud_rate: u32) -> Self {
        Self {
            port_name,
            baud_rate,
            data_bits: tokio_serial::DataBits::Eight,
            stop_bits: tokio_serial::StopBits::One,
            parity: tokio_serial::Parity::None,
            flow_control: tokio_serial::FlowControl::None,
            read_timeout: None,
        }
    }

    /// Create serial settings with a read timeout
    pub fn with_read_timeout(port_name: String, baud_rate: u32, timeout: Duration) -> Self {
        let mut settings = Self::new(port_name, baud_rate);
        settings.read_timeout = Some(timeout);
        settings
    }
}

/// A channel over an open serial port
pub type SerialChannel = StreamChannel<SerialStream>;

/// Active connector that opens a serial port
pub struct SerialConnector {
    settings: SerialSettings,
    codec_factory: Option<Box<dyn Fn() -> Box<dyn FrameCodec> + Send>>,
}

impl SerialConnector {
    /// Create a new serial connector
    pub fn new(settings: SerialSettings) -> Self {
        Self {
            settings,
            codec_factory: None,
        }
    }

    /// Use a custom frame codec for every channel this connector opens
    pub fn with_codec<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn FrameCodec> + Send + 'static,
    {
        self.codec_factory = Some(Box::new(factory));
        self
    }
}

#[async_trait]
impl ChannelConnector for SerialConnector {
    async fn connect(&mut self) -> Dnp3Result<Box<dyn Channel>> {
        let builder = tokio_serial::new(&self.settings.port_name, self.settings.baud_rate)
            .data_bits(self.settings.data_bits)
            .stop_bits(self.settings.stop_bits)
            .parity(self.settings.parity)
            .flow_control(self.settings.flow_control);

        let stream = SerialStream::open(&builder).map_err(|e| {
            Dnp3Error::Connection(std::io::Error::other(format!(
                "Failed to open serial port {}: {}",
                self.settings.port_name, e
            )))
        })?;

        log::debug!("Serial channel opened on {}", self.settings.port_name);

        Ok(match &self.codec_factory {
            Some(factory) => Box::new(SerialChannel::with_codec(
                stream,
                factory(),
                self.settings.read_timeout,
            )),
            None => Box::new(SerialChannel::new(stream, self.settings.read_timeout)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_settings() {
        let settings = SerialSettings::new("/dev/ttyUSB0".to_string(), 9600);
        assert_eq!(settings.port_name, "/dev/ttyUSB0");
        assert_eq!(settings.baud_rate, 9600);
        assert!(settings.read_timeout.is_none());
    }
}
