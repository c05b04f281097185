//! SAv5 outstation authentication provider

use crate::crypto::{CryptoProvider, UserId};
use crate::deferred::DeferredRequest;
use crate::key_status::KeyStatus;
use crate::statistics::SecurityStatistics;
use bytes::Bytes;
use dnp3_core::{ApduHeader, Dnp3Error, Dnp3Result, FunctionCode};
use std::collections::HashMap;
use std::sync::Arc;

/// The outstation's normal request-processing path
///
/// The auth provider hands requests to this interface once (and only
/// once) they are cleared to execute.
pub trait OutstationSession: Send {
    /// Execute a request that passed the authentication gate
    fn process_request(&mut self, header: &ApduHeader, objects: &[u8]);
}

/// Result of feeding one inbound frame through the authentication gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// A challenge was issued; the bytes must be transmitted to the peer
    ChallengeIssued(Vec<u8>),
    /// The response verified; the deferred request was released
    Authenticated,
    /// Verification failed; key state reset, deferred request discarded
    AuthFailure,
    /// A response arrived with no outstanding challenge; ignored
    Stale,
    /// An ordinary request was passed through to normal processing
    Processed,
    /// A critical operation was refused for lack of a valid key
    NotAuthorized,
    /// A crypto completion arrived after a reset and was discarded
    Discarded,
}

enum AuthClass {
    Request,
    Response,
    Ordinary,
}

fn classify(function: FunctionCode) -> AuthClass {
    match function {
        FunctionCode::AuthRequest => AuthClass::Request,
        FunctionCode::AuthResponse => AuthClass::Response,
        _ => AuthClass::Ordinary,
    }
}

struct OutstandingChallenge {
    user: UserId,
    challenge: Vec<u8>,
}

/// Authentication state machine gating an outstation's request processing
///
/// Tracks one key status per user identity, holds at most one deferred
/// request, and drives the injected [`CryptoProvider`]. Crypto operations
/// may suspend; completions are checked against an epoch counter bumped by
/// [`reset`](Self::reset) so a stale completion cannot resurrect a
/// discarded request.
pub struct OutstationAuthProvider {
    crypto: Arc<dyn CryptoProvider>,
    key_status: HashMap<UserId, KeyStatus>,
    deferred: DeferredRequest,
    outstanding: Option<OutstandingChallenge>,
    epoch: u64,
    max_rx_size: usize,
    statistics: SecurityStatistics,
}

impl OutstationAuthProvider {
    /// Create a new provider
    ///
    /// `max_rx_size` bounds how large an authentication object payload may
    /// be before it is rejected as malformed, keeping attacker-controlled
    /// buffers out of signature verification.
    pub fn new(max_rx_size: usize, crypto: Arc<dyn CryptoProvider>) -> Self {
        Self {
            crypto,
            key_status: HashMap::new(),
            deferred: DeferredRequest::new(),
            outstanding: None,
            epoch: 0,
            max_rx_size,
            statistics: SecurityStatistics::new(),
        }
    }

    /// Clear all authentication state
    ///
    /// Invoked on link reset or channel loss: key statuses drop back to
    /// `Default`, any deferred request is abandoned, and in-flight crypto
    /// completions are invalidated via the epoch counter.
    pub fn reset(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        self.key_status.clear();
        self.deferred.discard();
        self.outstanding = None;
        log::debug!("Authentication state reset");
    }

    /// Get the key status for a user
    pub fn key_status(&self, user: UserId) -> KeyStatus {
        self.key_status.get(&user).copied().unwrap_or_default()
    }

    /// Check whether a request is pending authentication
    pub fn has_deferred_request(&self) -> bool {
        self.deferred.is_set()
    }

    /// Get authentication statistics
    pub fn statistics(&self) -> &SecurityStatistics {
        &self.statistics
    }

    /// Feed one inbound application frame through the gate
    ///
    /// Classifies the frame as an authentication request, an
    /// authentication response, or an ordinary request, and dispatches to
    /// the matching handler.
    pub async fn on_receive(
        &mut self,
        session: &mut dyn OutstationSession,
        header: ApduHeader,
        objects: Bytes,
    ) -> Dnp3Result<AuthOutcome> {
        match classify(header.function) {
            AuthClass::Request => self.on_auth_request(header, objects).await,
            AuthClass::Response => self.on_auth_response(session, header, objects).await,
            AuthClass::Ordinary => self.on_unknown_request(session, header, objects),
        }
    }

    async fn on_auth_request(
        &mut self,
        header: ApduHeader,
        objects: Bytes,
    ) -> Dnp3Result<AuthOutcome> {
        self.check_rx_size(&objects)?;
        let (user, _) = parse_auth_payload(&objects)?;

        // Only one handshake per session at a time
        if self.outstanding.is_some() {
            self.statistics.handshake_conflicts += 1;
            log::warn!(
                "Security: auth request from user {} rejected, handshake already in progress",
                user
            );
            return Err(Dnp3Error::Security(
                "challenge already outstanding".to_string(),
            ));
        }

        if let Err(e) = self.deferred.set(header, objects) {
            self.statistics.busy_rejected += 1;
            log::warn!("Security: deferred request slot occupied, rejecting");
            return Err(e);
        }

        let epoch = self.epoch;
        let challenge = match self.crypto.generate_challenge(user).await {
            Ok(challenge) => challenge,
            Err(e) => {
                // Undo the deferral so the peer can retry
                self.deferred.discard();
                return Err(e);
            }
        };
        if self.epoch != epoch {
            // Reset raced the crypto completion; state is already clean
            return Ok(AuthOutcome::Discarded);
        }

        self.outstanding = Some(OutstandingChallenge {
            user,
            challenge: challenge.clone(),
        });
        self.key_status.insert(user, KeyStatus::ChallengeSent);
        self.statistics.challenges_issued += 1;
        log::debug!("Issued challenge to user {}", user);

        Ok(AuthOutcome::ChallengeIssued(challenge))
    }

    async fn on_auth_response(
        &mut self,
        session: &mut dyn OutstationSession,
        _header: ApduHeader,
        objects: Bytes,
    ) -> Dnp3Result<AuthOutcome> {
        self.check_rx_size(&objects)?;

        let (user, challenge) = match self.outstanding.as_ref() {
            Some(outstanding) => (outstanding.user, outstanding.challenge.clone()),
            None => {
                self.statistics.stale_responses += 1;
                log::debug!("Discarding auth response with no outstanding challenge");
                return Ok(AuthOutcome::Stale);
            }
        };

        let (response_user, response) = parse_auth_payload(&objects)?;
        if response_user != user {
            self.statistics.stale_responses += 1;
            log::debug!(
                "Discarding auth response for user {} while challenging user {}",
                response_user,
                user
            );
            return Ok(AuthOutcome::Stale);
        }

        let epoch = self.epoch;
        let verified = self.crypto.verify_response(user, &challenge, response).await?;
        if self.epoch != epoch {
            return Ok(AuthOutcome::Discarded);
        }

        self.outstanding = None;

        if verified {
            self.key_status.insert(user, KeyStatus::Ok);
            self.statistics.auth_successes += 1;
            log::info!("User {} authenticated", user);

            if let Some((header, objects)) = self.deferred.take() {
                session.process_request(&header, &objects);
            }
            Ok(AuthOutcome::Authenticated)
        } else {
            self.key_status.insert(user, KeyStatus::Default);
            self.deferred.discard();
            self.statistics.auth_failures += 1;
            log::warn!("Security: authentication failure for user {}", user);
            Ok(AuthOutcome::AuthFailure)
        }
    }

    fn on_unknown_request(
        &mut self,
        session: &mut dyn OutstationSession,
        header: ApduHeader,
        objects: Bytes,
    ) -> Dnp3Result<AuthOutcome> {
        if header.function.is_critical() && !self.any_user_authorized() {
            self.statistics.not_authorized += 1;
            log::warn!(
                "Security: refused critical operation {:?} without a valid key",
                header.function
            );
            return Ok(AuthOutcome::NotAuthorized);
        }

        session.process_request(&header, &objects);
        Ok(AuthOutcome::Processed)
    }

    fn any_user_authorized(&self) -> bool {
        self.key_status.values().any(|status| status.is_authorized())
    }

    fn check_rx_size(&mut self, objects: &Bytes) -> Dnp3Result<()> {
        if objects.len() > self.max_rx_size {
            self.statistics.oversized_rejected += 1;
            log::warn!(
                "Security: auth payload of {} bytes exceeds the {} byte receive bound",
                objects.len(),
                self.max_rx_size
            );
            return Err(Dnp3Error::Security(format!(
                "auth payload of {} bytes exceeds the receive bound",
                objects.len()
            )));
        }
        Ok(())
    }
}

/// Split an auth object payload into its user number and body
///
/// Object-group parsing is out of scope for this crate family; auth
/// payloads carry the big-endian user number followed by the object body.
fn parse_auth_payload(objects: &[u8]) -> Dnp3Result<(UserId, &[u8])> {
    if objects.len() < 2 {
        return Err(Dnp3Error::InvalidData(
            "auth payload too short for a user number".to_string(),
        ));
    }
    let user = u16::from_be_bytes([objects[0], objects[1]]);
    Ok((user, &objects[2..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{
        HmacSha256Provider, MockCryptoProvider, NullCryptoProvider, DEFAULT_USER,
    };

    #[derive(Default)]
    struct RecordingOutstation {
        processed: Vec<(ApduHeader, Vec<u8>)>,
    }

    impl OutstationSession for RecordingOutstation {
        fn process_request(&mut self, header: &ApduHeader, objects: &[u8]) {
            self.processed.push((*header, objects.to_vec()));
        }
    }

    fn auth_request_header() -> ApduHeader {
        ApduHeader::new(FunctionCode::AuthRequest, 0)
    }

    fn auth_response_header() -> ApduHeader {
        ApduHeader::new(FunctionCode::AuthResponse, 1)
    }

    /// Payload convention: big-endian user number followed by the body
    fn payload(user: UserId, body: &[u8]) -> Bytes {
        let mut data = user.to_be_bytes().to_vec();
        data.extend_from_slice(body);
        Bytes::from(data)
    }

    #[tokio::test]
    async fn test_auth_request_issues_challenge_and_defers() {
        let crypto = Arc::new(HmacSha256Provider::new().with_key(DEFAULT_USER, b"key"));
        let mut provider = OutstationAuthProvider::new(1024, crypto);
        let mut outstation = RecordingOutstation::default();

        let outcome = provider
            .on_receive(
                &mut outstation,
                auth_request_header(),
                payload(DEFAULT_USER, b"operate point 3"),
            )
            .await
            .unwrap();

        match outcome {
            AuthOutcome::ChallengeIssued(challenge) => assert!(!challenge.is_empty()),
            other => panic!("expected challenge, got {:?}", other),
        }
        assert_eq!(provider.key_status(DEFAULT_USER), KeyStatus::ChallengeSent);
        assert!(provider.has_deferred_request());
        // Nothing executes until the handshake completes
        assert!(outstation.processed.is_empty());
    }

    #[tokio::test]
    async fn test_second_auth_request_rejected_while_handshake_pending() {
        let crypto = Arc::new(HmacSha256Provider::new().with_key(DEFAULT_USER, b"key"));
        let mut provider = OutstationAuthProvider::new(1024, crypto);
        let mut outstation = RecordingOutstation::default();

        provider
            .on_receive(
                &mut outstation,
                auth_request_header(),
                payload(DEFAULT_USER, b"first"),
            )
            .await
            .unwrap();

        let second = provider
            .on_receive(
                &mut outstation,
                auth_request_header(),
                payload(DEFAULT_USER, b"second"),
            )
            .await;
        assert!(second.is_err());

        // The original deferral is untouched
        assert!(provider.has_deferred_request());
        assert_eq!(provider.statistics().handshake_conflicts, 1);
    }

    #[tokio::test]
    async fn test_correct_response_releases_deferred_request_once() {
        let hmac = HmacSha256Provider::new().with_key(DEFAULT_USER, b"key");
        let crypto = Arc::new(HmacSha256Provider::new().with_key(DEFAULT_USER, b"key"));
        let mut provider = OutstationAuthProvider::new(1024, crypto);
        let mut outstation = RecordingOutstation::default();

        let request_payload = payload(DEFAULT_USER, b"operate point 3");
        let challenge = match provider
            .on_receive(
                &mut outstation,
                auth_request_header(),
                request_payload.clone(),
            )
            .await
            .unwrap()
        {
            AuthOutcome::ChallengeIssued(challenge) => challenge,
            other => panic!("expected challenge, got {:?}", other),
        };

        let response = hmac.expected_response(DEFAULT_USER, &challenge).unwrap();
        let outcome = provider
            .on_receive(
                &mut outstation,
                auth_response_header(),
                payload(DEFAULT_USER, &response),
            )
            .await
            .unwrap();

        assert_eq!(outcome, AuthOutcome::Authenticated);
        assert_eq!(provider.key_status(DEFAULT_USER), KeyStatus::Ok);
        assert!(!provider.has_deferred_request());

        // The original request executed exactly once, unmodified
        assert_eq!(outstation.processed.len(), 1);
        assert_eq!(outstation.processed[0].0, auth_request_header());
        assert_eq!(outstation.processed[0].1, request_payload.to_vec());
    }

    #[tokio::test]
    async fn test_wrong_response_resets_and_discards() {
        let crypto = Arc::new(HmacSha256Provider::new().with_key(DEFAULT_USER, b"key"));
        let mut provider = OutstationAuthProvider::new(1024, crypto);
        let mut outstation = RecordingOutstation::default();

        provider
            .on_receive(
                &mut outstation,
                auth_request_header(),
                payload(DEFAULT_USER, b"operate"),
            )
            .await
            .unwrap();

        let outcome = provider
            .on_receive(
                &mut outstation,
                auth_response_header(),
                payload(DEFAULT_USER, b"not the mac"),
            )
            .await
            .unwrap();

        assert_eq!(outcome, AuthOutcome::AuthFailure);
        assert_eq!(provider.key_status(DEFAULT_USER), KeyStatus::Default);
        assert!(!provider.has_deferred_request());
        assert!(outstation.processed.is_empty());
        assert_eq!(provider.statistics().auth_failures, 1);
    }

    #[tokio::test]
    async fn test_response_without_challenge_is_stale() {
        let crypto = Arc::new(NullCryptoProvider::new());
        let mut provider = OutstationAuthProvider::new(1024, crypto);
        let mut outstation = RecordingOutstation::default();

        let outcome = provider
            .on_receive(
                &mut outstation,
                auth_response_header(),
                payload(DEFAULT_USER, b"unexpected"),
            )
            .await
            .unwrap();

        assert_eq!(outcome, AuthOutcome::Stale);
        assert_eq!(provider.key_status(DEFAULT_USER), KeyStatus::Default);
        assert_eq!(provider.statistics().stale_responses, 1);
    }

    #[tokio::test]
    async fn test_reset_clears_key_status_and_deferred_request() {
        let crypto = Arc::new(NullCryptoProvider::new());
        let mut provider = OutstationAuthProvider::new(1024, crypto);
        let mut outstation = RecordingOutstation::default();

        provider
            .on_receive(
                &mut outstation,
                auth_request_header(),
                payload(DEFAULT_USER, b"operate"),
            )
            .await
            .unwrap();
        assert!(provider.has_deferred_request());

        provider.reset();
        assert_eq!(provider.key_status(DEFAULT_USER), KeyStatus::Default);
        assert!(!provider.has_deferred_request());

        // An abandoned handshake's response is now stale
        let outcome = provider
            .on_receive(
                &mut outstation,
                auth_response_header(),
                payload(DEFAULT_USER, b"late"),
            )
            .await
            .unwrap();
        assert_eq!(outcome, AuthOutcome::Stale);
        assert!(outstation.processed.is_empty());
    }

    #[tokio::test]
    async fn test_ordinary_request_passes_through() {
        let crypto = Arc::new(NullCryptoProvider::new());
        let mut provider = OutstationAuthProvider::new(1024, crypto);
        let mut outstation = RecordingOutstation::default();

        let header = ApduHeader::new(FunctionCode::Read, 2);
        let outcome = provider
            .on_receive(&mut outstation, header, Bytes::from_static(b"class 0"))
            .await
            .unwrap();

        assert_eq!(outcome, AuthOutcome::Processed);
        assert_eq!(outstation.processed.len(), 1);
    }

    #[tokio::test]
    async fn test_critical_request_requires_authenticated_user() {
        let crypto = Arc::new(NullCryptoProvider::new());
        let mut provider = OutstationAuthProvider::new(1024, crypto);
        let mut outstation = RecordingOutstation::default();

        let header = ApduHeader::new(FunctionCode::DirectOperate, 3);
        let outcome = provider
            .on_receive(&mut outstation, header, Bytes::from_static(b"crob"))
            .await
            .unwrap();
        assert_eq!(outcome, AuthOutcome::NotAuthorized);
        assert!(outstation.processed.is_empty());

        // Complete a handshake, then the same operation is allowed
        provider
            .on_receive(
                &mut outstation,
                auth_request_header(),
                payload(DEFAULT_USER, b"operate"),
            )
            .await
            .unwrap();
        provider
            .on_receive(
                &mut outstation,
                auth_response_header(),
                payload(DEFAULT_USER, b"anything"),
            )
            .await
            .unwrap();

        let outcome = provider
            .on_receive(&mut outstation, header, Bytes::from_static(b"crob"))
            .await
            .unwrap();
        assert_eq!(outcome, AuthOutcome::Processed);
    }

    #[tokio::test]
    async fn test_oversized_payload_rejected_before_crypto() {
        let mut crypto = MockCryptoProvider::new();
        // The crypto provider must never see an oversized payload
        crypto.expect_generate_challenge().never();
        crypto.expect_verify_response().never();
        let mut provider = OutstationAuthProvider::new(8, Arc::new(crypto));
        let mut outstation = RecordingOutstation::default();

        let result = provider
            .on_receive(
                &mut outstation,
                auth_request_header(),
                payload(DEFAULT_USER, &[0u8; 64]),
            )
            .await;

        assert!(result.is_err());
        assert_eq!(provider.statistics().oversized_rejected, 1);
        assert!(!provider.has_deferred_request());
    }

    #[tokio::test]
    async fn test_crypto_error_releases_deferred_slot() {
        let mut crypto = MockCryptoProvider::new();
        crypto
            .expect_generate_challenge()
            .returning(|_| Err(Dnp3Error::Security("hsm offline".to_string())));
        let mut provider = OutstationAuthProvider::new(1024, Arc::new(crypto));
        let mut outstation = RecordingOutstation::default();

        let result = provider
            .on_receive(
                &mut outstation,
                auth_request_header(),
                payload(DEFAULT_USER, b"operate"),
            )
            .await;

        assert!(result.is_err());
        // The slot drained, so the peer can retry
        assert!(!provider.has_deferred_request());
        assert_eq!(provider.key_status(DEFAULT_USER), KeyStatus::Default);
    }
}
