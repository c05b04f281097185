//! Session key state

/// Authentication handshake state for one user identity
///
/// Exactly one value exists per identity at a time; transitions happen
/// only through the auth provider's message handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyStatus {
    /// No session key established (initial state, and the state after any
    /// authentication failure or reset)
    #[default]
    Default,
    /// A challenge has been issued and the provider is waiting for the
    /// peer's response
    ChallengeSent,
    /// A valid key is present; the identity is authenticated
    Ok,
}

impl KeyStatus {
    /// Check whether this state authorizes critical operations
    pub fn is_authorized(&self) -> bool {
        matches!(self, KeyStatus::Ok)
    }
}
