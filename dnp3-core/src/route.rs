//! Link routes

use crate::frame::LinkHeader;
use std::fmt;

/// A link route: the (local, remote) address pair identifying one logical
/// conversation over a shared channel.
///
/// Routes are immutable once assigned to a session. Two routes are equal
/// iff both fields match. At most one enabled session may hold a given
/// route on the same channel at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Route {
    local: u16,
    remote: u16,
}

impl Route {
    /// Create a new route
    pub fn new(local: u16, remote: u16) -> Self {
        Self { local, remote }
    }

    /// Get the local address
    pub fn local(&self) -> u16 {
        self.local
    }

    /// Get the remote address
    pub fn remote(&self) -> u16 {
        self.remote
    }

    /// Check whether an inbound frame header is addressed to this route
    ///
    /// A frame matches when its destination is our local address and its
    /// source is the remote address the route is bound to.
    pub fn matches(&self, header: &LinkHeader) -> bool {
        header.destination() == self.local && header.source() == self.remote
    }

    /// Build the outbound header for this route
    pub fn outbound_header(&self) -> LinkHeader {
        LinkHeader::new(self.local, self.remote)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.local, self.remote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_equality() {
        assert_eq!(Route::new(1, 10), Route::new(1, 10));
        assert_ne!(Route::new(1, 10), Route::new(1, 11));
        assert_ne!(Route::new(1, 10), Route::new(2, 10));
    }

    #[test]
    fn test_route_matches_inbound_header() {
        let route = Route::new(1, 10);
        // Inbound frames travel remote -> local
        assert!(route.matches(&LinkHeader::new(10, 1)));
        assert!(!route.matches(&LinkHeader::new(1, 10)));
        assert!(!route.matches(&LinkHeader::new(10, 2)));
    }
}
