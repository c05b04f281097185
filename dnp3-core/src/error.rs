use thiserror::Error;

/// Main error type for DNP3 operations
#[derive(Error, Debug)]
pub enum Dnp3Error {
    #[error("Connection error: {0}")]
    Connection(#[from] std::io::Error),

    #[error("Channel closed")]
    ChannelClosed,

    #[error("Timeout")]
    Timeout,

    #[error("Link error: {0}")]
    Link(String),

    #[error("Transmit already in flight")]
    TransmitBusy,

    #[error("Deferred request slot occupied")]
    AuthBusy,

    #[error("Security error: {0}")]
    Security(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias for DNP3 operations
pub type Dnp3Result<T> = Result<T, Dnp3Error>;
