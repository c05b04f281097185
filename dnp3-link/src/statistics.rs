//! Link multiplexer statistics collection

/// Channel multiplexer statistics
///
/// Tracks routing and channel lifecycle metrics for monitoring and
/// debugging. Updated automatically by the multiplexer during operation.
#[derive(Debug, Clone, Default)]
pub struct LinkStatistics {
    /// Frames routed to a matching enabled session
    pub frames_routed: u64,
    /// Frames dropped because no enabled session matched
    pub frames_discarded: u64,
    /// Frames transmitted on behalf of sessions
    pub frames_transmitted: u64,
    /// Channel failures (disconnect or I/O error)
    pub channel_failures: u64,
    /// Failed attempts to establish a new channel
    pub connect_failures: u64,
}

impl LinkStatistics {
    /// Create new statistics with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all statistics counters
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Increment the routed frame counter
    pub fn increment_frames_routed(&mut self) {
        self.frames_routed += 1;
    }

    /// Increment the discarded frame counter
    pub fn increment_frames_discarded(&mut self) {
        self.frames_discarded += 1;
    }

    /// Increment the transmitted frame counter
    pub fn increment_frames_transmitted(&mut self) {
        self.frames_transmitted += 1;
    }

    /// Increment the channel failure counter
    pub fn increment_channel_failures(&mut self) {
        self.channel_failures += 1;
    }

    /// Increment the connect failure counter
    pub fn increment_connect_failures(&mut self) {
        self.connect_failures += 1;
    }
}
