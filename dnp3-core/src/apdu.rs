//! Application-layer header types
//!
//! Only the small slice of the application layer that the authentication
//! provider needs to classify frames lives here. Object parsing is out of
//! scope for this crate family.

/// DNP3 application-layer function code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionCode {
    Confirm,
    Read,
    Write,
    Select,
    Operate,
    DirectOperate,
    /// Secure authentication request (SAv5)
    AuthRequest,
    /// Secure authentication response (SAv5)
    AuthResponse,
    /// Any function code this crate does not model explicitly
    Other(u8),
}

impl FunctionCode {
    /// Decode a function code from its raw value
    pub fn from_raw(value: u8) -> Self {
        match value {
            0x00 => FunctionCode::Confirm,
            0x01 => FunctionCode::Read,
            0x02 => FunctionCode::Write,
            0x03 => FunctionCode::Select,
            0x04 => FunctionCode::Operate,
            0x05 => FunctionCode::DirectOperate,
            0x20 => FunctionCode::AuthRequest,
            0x21 => FunctionCode::AuthResponse,
            other => FunctionCode::Other(other),
        }
    }

    /// Get the raw value of the function code
    pub fn as_raw(&self) -> u8 {
        match self {
            FunctionCode::Confirm => 0x00,
            FunctionCode::Read => 0x01,
            FunctionCode::Write => 0x02,
            FunctionCode::Select => 0x03,
            FunctionCode::Operate => 0x04,
            FunctionCode::DirectOperate => 0x05,
            FunctionCode::AuthRequest => 0x20,
            FunctionCode::AuthResponse => 0x21,
            FunctionCode::Other(value) => *value,
        }
    }

    /// Check whether this operation is critical, i.e. may only execute for
    /// an authenticated user
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            FunctionCode::Write
                | FunctionCode::Select
                | FunctionCode::Operate
                | FunctionCode::DirectOperate
        )
    }
}

/// Application-layer request header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApduHeader {
    pub function: FunctionCode,
    pub sequence: u8,
}

impl ApduHeader {
    /// Create a new header
    pub fn new(function: FunctionCode, sequence: u8) -> Self {
        Self { function, sequence }
    }
}
