//! Crypto provider capability

use async_trait::async_trait;
use dnp3_core::{Dnp3Error, Dnp3Result};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use std::collections::HashMap;

#[cfg(test)]
use mockall::automock;

type HmacSha256 = Hmac<Sha256>;

/// DNP3 user number
pub type UserId = u16;

/// The default user number every outstation knows about
pub const DEFAULT_USER: UserId = 1;

/// Challenge/response crypto operations keyed by user identity
///
/// Implementations may complete synchronously or suspend; callers must not
/// assume a synchronous return. The provider is passed as an explicit
/// constructor dependency, never looked up ambiently.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CryptoProvider: Send + Sync {
    /// Generate a fresh challenge for the user
    async fn generate_challenge(&self, user: UserId) -> Dnp3Result<Vec<u8>>;

    /// Verify the peer's response to a previously issued challenge
    async fn verify_response(
        &self,
        user: UserId,
        challenge: &[u8],
        response: &[u8],
    ) -> Dnp3Result<bool>;
}

/// HMAC-SHA256 crypto provider with per-user update keys
///
/// The expected response to a challenge is `HMAC(key, challenge)`;
/// verification is constant-time via the `hmac` crate.
pub struct HmacSha256Provider {
    keys: HashMap<UserId, Vec<u8>>,
    challenge_length: usize,
}

impl HmacSha256Provider {
    /// Create a provider with no keys installed
    pub fn new() -> Self {
        Self {
            keys: HashMap::new(),
            challenge_length: 16,
        }
    }

    /// Install a key for a user
    pub fn with_key(mut self, user: UserId, key: &[u8]) -> Self {
        self.keys.insert(user, key.to_vec());
        self
    }

    /// Set the challenge length in bytes
    pub fn with_challenge_length(mut self, length: usize) -> Self {
        self.challenge_length = length;
        self
    }

    fn mac_for(&self, user: UserId) -> Dnp3Result<HmacSha256> {
        let key = self
            .keys
            .get(&user)
            .ok_or_else(|| Dnp3Error::Security(format!("No key installed for user {}", user)))?;
        HmacSha256::new_from_slice(key)
            .map_err(|e| Dnp3Error::Security(format!("Failed to create HMAC: {}", e)))
    }

    /// Compute the expected response for a challenge
    ///
    /// Exposed so the master side of a test harness can answer challenges.
    pub fn expected_response(&self, user: UserId, challenge: &[u8]) -> Dnp3Result<Vec<u8>> {
        let mut mac = self.mac_for(user)?;
        mac.update(challenge);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

impl Default for HmacSha256Provider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CryptoProvider for HmacSha256Provider {
    async fn generate_challenge(&self, user: UserId) -> Dnp3Result<Vec<u8>> {
        // The user must be known before any challenge is spent on them
        let _ = self.mac_for(user)?;
        let mut challenge = vec![0u8; self.challenge_length];
        rand::thread_rng().fill_bytes(&mut challenge);
        Ok(challenge)
    }

    async fn verify_response(
        &self,
        user: UserId,
        challenge: &[u8],
        response: &[u8],
    ) -> Dnp3Result<bool> {
        let mut mac = self.mac_for(user)?;
        mac.update(challenge);
        Ok(mac.verify_slice(response).is_ok())
    }
}

/// Baseline provider that never truly challenges
///
/// Accepts every response, preserving the state-machine shape so a real
/// cryptographic provider is a drop-in replacement.
#[derive(Debug, Default)]
pub struct NullCryptoProvider;

impl NullCryptoProvider {
    /// Create a new null provider
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CryptoProvider for NullCryptoProvider {
    async fn generate_challenge(&self, _user: UserId) -> Dnp3Result<Vec<u8>> {
        let mut challenge = vec![0u8; 4];
        rand::thread_rng().fill_bytes(&mut challenge);
        Ok(challenge)
    }

    async fn verify_response(
        &self,
        _user: UserId,
        _challenge: &[u8],
        _response: &[u8],
    ) -> Dnp3Result<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hmac_provider_accepts_expected_response() {
        let provider = HmacSha256Provider::new().with_key(DEFAULT_USER, b"update key");
        let challenge = provider.generate_challenge(DEFAULT_USER).await.unwrap();
        assert_eq!(challenge.len(), 16);

        let response = provider
            .expected_response(DEFAULT_USER, &challenge)
            .unwrap();
        assert!(provider
            .verify_response(DEFAULT_USER, &challenge, &response)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_hmac_provider_rejects_wrong_response() {
        let provider = HmacSha256Provider::new().with_key(DEFAULT_USER, b"update key");
        let challenge = provider.generate_challenge(DEFAULT_USER).await.unwrap();
        assert!(!provider
            .verify_response(DEFAULT_USER, &challenge, b"wrong")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_hmac_provider_requires_installed_key() {
        let provider = HmacSha256Provider::new();
        assert!(provider.generate_challenge(7).await.is_err());
    }

    #[tokio::test]
    async fn test_null_provider_accepts_everything() {
        let provider = NullCryptoProvider::new();
        let challenge = provider.generate_challenge(DEFAULT_USER).await.unwrap();
        assert!(provider
            .verify_response(DEFAULT_USER, &challenge, b"anything")
            .await
            .unwrap());
    }
}
