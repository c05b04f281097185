//! Security statistics collection

/// Authentication statistics
///
/// Security-relevant events are counted separately from ordinary protocol
/// errors so they can be audited. Updated automatically by the auth
/// provider during operation.
#[derive(Debug, Clone, Default)]
pub struct SecurityStatistics {
    /// Challenges issued to peers
    pub challenges_issued: u64,
    /// Successful authentications
    pub auth_successes: u64,
    /// Failed verifications (security events)
    pub auth_failures: u64,
    /// Responses discarded because no challenge was outstanding
    pub stale_responses: u64,
    /// Auth payloads rejected for exceeding the receive buffer bound
    pub oversized_rejected: u64,
    /// Requests rejected because the deferred slot was occupied
    pub busy_rejected: u64,
    /// Requests rejected while another handshake was in progress
    pub handshake_conflicts: u64,
    /// Critical operations refused for lack of a valid key
    pub not_authorized: u64,
}

impl SecurityStatistics {
    /// Create new statistics with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all statistics counters
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
