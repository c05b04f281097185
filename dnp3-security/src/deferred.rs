//! Single-slot deferred request buffer

use bytes::Bytes;
use dnp3_core::{ApduHeader, Dnp3Error, Dnp3Result};

/// Holds at most one application-layer request awaiting an authentication
/// decision
///
/// The slot is deliberately a bounded queue of size one: an occupied slot
/// rejects new requests with a busy error instead of silently overwriting,
/// acting as backpressure toward the peer.
#[derive(Debug, Default)]
pub struct DeferredRequest {
    slot: Option<(ApduHeader, Bytes)>,
}

impl DeferredRequest {
    /// Create an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Defer a request
    ///
    /// Fails with [`Dnp3Error::AuthBusy`] if a request is already pending;
    /// the occupied slot is left untouched.
    pub fn set(&mut self, header: ApduHeader, objects: Bytes) -> Dnp3Result<()> {
        if self.slot.is_some() {
            return Err(Dnp3Error::AuthBusy);
        }
        self.slot = Some((header, objects));
        Ok(())
    }

    /// Release the deferred request for processing
    ///
    /// The slot drains; a request can be released at most once.
    pub fn take(&mut self) -> Option<(ApduHeader, Bytes)> {
        self.slot.take()
    }

    /// Discard any pending request without processing it
    pub fn discard(&mut self) {
        self.slot = None;
    }

    /// Check whether a request is pending
    pub fn is_set(&self) -> bool {
        self.slot.is_some()
    }
}
