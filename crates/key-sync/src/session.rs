//! Leader and follower session drivers
//!
//! A session is a strictly linear pass over the three-message transcript:
//! `Init`, await the peer's next message, and either install/complete or
//! abort.  There is no retry inside a session, no state is shared between
//! sessions, and the only blocking points are the three receives.  The
//! dependencies of a session (the attestation device, the document verifier,
//! and the authorization source) are injected at construction.
//!
//! ## Authors
//!
//! The Cofre Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.md` file in the Cofre root directory for
//! information on licensing and copyright.

use crate::{
    envelope,
    error::KeySyncError,
    message::{Message1, Message2, Message3},
    store::SecretStore,
};
use committee::CommitteeRegistry;
use io_utils::fd::{receive_buffer, send_buffer, DEFAULT_MAX_MESSAGE_LENGTH};
use log::{info, warn};
use nitro_attestation::{
    debug_code_measurement, AttestationError, AttestationVerifier, Attestor, VerifiedAttestation,
};
use serde_bytes::ByteBuf;
use std::io::{Read, Write};
use zeroize::Zeroizing;

/// How the measurements of a verified peer are authorized.
#[derive(Clone, Copy)]
pub enum Authorization<'a> {
    /// Admit only debug-mode images, and only when this enclave is itself a
    /// debug-mode image.  For development deployments.
    TestingOnly,
    /// Consult the governance committee's registry.  For production pools.
    Committee(&'a dyn CommitteeRegistry),
}

/// The injected dependencies of a key-synchronization session, shared by the
/// leader and follower drivers.
pub struct SyncContext<'a, A: Attestor + ?Sized> {
    attestor: &'a A,
    verifier: &'a AttestationVerifier,
    authorization: Authorization<'a>,
    max_message_length: usize,
}

impl<'a, A: Attestor + ?Sized> SyncContext<'a, A> {
    /// Creates a session context with the default frame limit.
    pub fn new(
        attestor: &'a A,
        verifier: &'a AttestationVerifier,
        authorization: Authorization<'a>,
    ) -> Self {
        Self {
            attestor,
            verifier,
            authorization,
            max_message_length: DEFAULT_MAX_MESSAGE_LENGTH,
        }
    }

    /// Overrides the upper bound on the length of a single framed message.
    pub fn with_max_message_length(mut self, max_message_length: usize) -> Self {
        self.max_message_length = max_message_length;
        self
    }

    /// Drives the leader side of one session: issue a challenge, verify and
    /// authorize the candidate, then release the secret state sealed to the
    /// candidate's ephemeral key.
    ///
    /// Any error is terminal for the session; the caller closes the stream.
    pub fn serve_leader<T>(&self, store: &SecretStore, stream: &mut T) -> Result<(), KeySyncError>
    where
        T: Read + Write,
    {
        info!("leader: key-sync session started");

        let leader_nonce = random_nonce()?;
        let message1 = encode(&Message1 { leader_nonce })?;
        send_buffer(&mut *stream, &message1, self.max_message_length)?;

        let message2_bytes = receive_buffer(&mut *stream, self.max_message_length)?;
        let message2: Message2 =
            bincode::deserialize(&message2_bytes).map_err(|_| KeySyncError::MalformedMessage("M2"))?;

        let follower_attestation =
            self.verifier
                .verify(&message2.attestation_document, &leader_nonce, None)?;
        info!("leader: candidate attestation verified");

        let follower_nonce = match follower_attestation.user_data() {
            Some(user_data) if user_data.len() == 32 => user_data.to_vec(),
            _ => return Err(AttestationError::MalformedField("user_data").into()),
        };
        let follower_public_key = follower_attestation
            .public_key()
            .ok_or(AttestationError::MalformedField("public_key"))?;

        self.authorize_peer(&follower_attestation)?;
        info!("leader: candidate authorized");

        let state = store.read()?;
        let sealed = envelope::seal(&state, follower_public_key)?;
        let sealed_digest = envelope::digest(&sealed);
        info!("leader: secret state sealed");

        let leader_attestation = self.attestor.attest(
            Some(ByteBuf::from(follower_nonce)),
            None,
            Some(ByteBuf::from(sealed_digest.to_vec())),
        )?;

        let message3 = encode(&Message3 {
            envelope: ByteBuf::from(sealed),
            attestation_document: ByteBuf::from(leader_attestation),
        })?;
        send_buffer(&mut *stream, &message3, self.max_message_length)?;

        info!("leader: key-sync session complete");
        Ok(())
    }

    /// Drives the follower side of one session: answer the leader's
    /// challenge with a fresh attestation and ephemeral key, verify and
    /// authorize the leader's answer, then install the received state.
    ///
    /// The ephemeral secret lives only within this call and is erased on
    /// every exit path.
    pub fn serve_follower<T>(
        &self,
        store: &SecretStore,
        stream: &mut T,
    ) -> Result<(), KeySyncError>
    where
        T: Read + Write,
    {
        info!("follower: key-sync session started");

        let follower_nonce = random_nonce()?;
        let ephemeral_secret = k256::SecretKey::random(&mut rand::rngs::OsRng);
        let ephemeral_public = ephemeral_secret.public_key().to_sec1_bytes();

        let message1_bytes = receive_buffer(&mut *stream, self.max_message_length)?;
        let message1: Message1 =
            bincode::deserialize(&message1_bytes).map_err(|_| KeySyncError::MalformedMessage("M1"))?;

        let follower_attestation = self.attestor.attest(
            Some(ByteBuf::from(message1.leader_nonce)),
            Some(ByteBuf::from(ephemeral_public.to_vec())),
            Some(ByteBuf::from(follower_nonce)),
        )?;
        let message2 = encode(&Message2 {
            attestation_document: ByteBuf::from(follower_attestation),
        })?;
        send_buffer(&mut *stream, &message2, self.max_message_length)?;

        let message3_bytes = receive_buffer(&mut *stream, self.max_message_length)?;
        let message3: Message3 =
            bincode::deserialize(&message3_bytes).map_err(|_| KeySyncError::MalformedMessage("M3"))?;

        // The digest check binds the ciphertext we received to the one the
        // leader attested to; nothing is decrypted until it passes.
        let sealed_digest = envelope::digest(&message3.envelope);
        let leader_attestation = self.verifier.verify(
            &message3.attestation_document,
            &follower_nonce,
            Some(&sealed_digest),
        )?;
        if leader_attestation.public_key().is_some() {
            return Err(AttestationError::MalformedField("public_key").into());
        }
        info!("follower: leader attestation verified");

        self.authorize_peer(&leader_attestation)?;
        info!("follower: leader authorized");

        let state = {
            let mut secret_bytes = Zeroizing::new([0u8; 32]);
            secret_bytes.copy_from_slice(&ephemeral_secret.to_bytes());
            envelope::open(&message3.envelope, &secret_bytes[..])?
        };
        store.install(state)?;

        info!("follower: secret state installed");
        Ok(())
    }

    /// Checks that a verified peer may hold the pool secret.  Under
    /// committee governance both of the peer's measurement strings must be
    /// authorized; under testing-only governance both the peer and this
    /// enclave must be debug-mode images.
    fn authorize_peer(&self, attestation: &VerifiedAttestation) -> Result<(), KeySyncError> {
        match self.authorization {
            Authorization::TestingOnly => {
                let debug = debug_code_measurement();
                if attestation.code_measurement() != debug {
                    return Err(KeySyncError::NotDebugImage);
                }
                // Inspect our own attestation to confirm this enclave is
                // also a debug image before handling secrets under the
                // relaxed rules.
                let nonce = random_nonce()?;
                let own_document = self.attestor.attest(Some(ByteBuf::from(nonce)), None, None)?;
                let own_attestation = self.verifier.verify(&own_document, &nonce, None)?;
                if own_attestation.code_measurement() != debug {
                    return Err(KeySyncError::NotDebugImage);
                }
                warn!("authorizing measurements in testing-only mode");
                Ok(())
            }
            Authorization::Committee(registry) => {
                committee::authorize_attestation(registry, attestation)?;
                Ok(())
            }
        }
    }
}

/// Draws a fresh 32-byte challenge from the platform's trusted entropy
/// source.
fn random_nonce() -> Result<[u8; 32], KeySyncError> {
    let mut nonce = [0u8; 32];
    match platform_services::getrandom(&mut nonce) {
        platform_services::result::Result::Success(()) => Ok(nonce),
        _ => Err(KeySyncError::EntropyUnavailable),
    }
}

fn encode<M: serde::Serialize>(message: &M) -> Result<Vec<u8>, KeySyncError> {
    bincode::serialize(message).map_err(|_| KeySyncError::InternalError("message serialization"))
}
