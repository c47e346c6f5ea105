//! Key-synchronization protocol tests
//!
//! Full sessions between a leader and a follower over OS socket pairs,
//! including the adversarial cases: a man-in-the-middle tampering with the
//! sealed state, replays of captured messages into fresh sessions, registry
//! outages and revocations, and a leader that violates the transcript
//! binding rules.
//!
//! ## Authors
//!
//! The Cofre Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.md` file in the Cofre root directory for
//! information on licensing and copyright.

use committee::{CommitteeError, MockRegistry};
use io_utils::{
    error::SocketError,
    fd::{receive_buffer, send_buffer, DEFAULT_MAX_MESSAGE_LENGTH},
};
use key_sync::{
    envelope,
    message::{Message1, Message2, Message3},
    Authorization, KeySyncError, SecretStore, SyncContext,
};
use nitro_attestation::{
    test::{test_root_certificate_pem, TestAttestor},
    AttestationError, AttestationVerifier, Attestor,
};
use serde_bytes::ByteBuf;
use std::{
    io::Write,
    os::unix::net::UnixStream,
    thread,
    time::Duration,
};

const MAX_AGE: Duration = Duration::from_secs(3600);
const MAX_LENGTH: usize = DEFAULT_MAX_MESSAGE_LENGTH;

fn verifier() -> AttestationVerifier {
    AttestationVerifier::new(test_root_certificate_pem(), MAX_AGE).unwrap()
}

/// The measurements the default test attestor presents, extracted by
/// verifying a probe document.
fn default_measurements() -> (String, String) {
    let attestor = TestAttestor::new();
    let document = attestor
        .attest(Some(ByteBuf::from(b"probe".to_vec())), None, None)
        .unwrap();
    let attestation = verifier().verify(&document, b"probe", None).unwrap();
    (
        attestation.code_measurement().to_string(),
        attestation.instance_measurement().to_string(),
    )
}

/// A registry approving both default measurements.
fn approving_registry() -> MockRegistry {
    let (code, instance) = default_measurements();
    let mut registry = MockRegistry::new();
    registry.approve(&code);
    registry.approve(&instance);
    registry
}

/// Runs a leader session on its own thread, exporting `state`.
fn spawn_leader(
    mut stream: UnixStream,
    state: Vec<u8>,
    registry: MockRegistry,
) -> thread::JoinHandle<Result<(), KeySyncError>> {
    thread::spawn(move || {
        let attestor = TestAttestor::new();
        let verifier = verifier();
        let context = SyncContext::new(&attestor, &verifier, Authorization::Committee(&registry));
        let store = SecretStore::from_initial(state);
        context.serve_leader(&store, &mut stream)
    })
}

/// Runs a follower session on the calling thread and returns its outcome
/// together with the store it would have installed into.
fn run_follower(
    stream: &mut UnixStream,
    registry: &MockRegistry,
) -> (Result<(), KeySyncError>, SecretStore) {
    let attestor = TestAttestor::new();
    let verifier = verifier();
    let context = SyncContext::new(&attestor, &verifier, Authorization::Committee(registry));
    let store = SecretStore::empty();
    let result = context.serve_follower(&store, stream);
    (result, store)
}

#[test]
/// A fresh enclave joins a pool: after the three messages the follower's
/// store holds exactly the leader's state.
fn happy_path_installs_state() {
    let (leader_stream, mut follower_stream) = UnixStream::pair().unwrap();
    let leader = spawn_leader(leader_stream, vec![0x41, 0x42, 0x43], approving_registry());

    let registry = approving_registry();
    let (result, store) = run_follower(&mut follower_stream, &registry);

    leader.join().unwrap().unwrap();
    result.unwrap();
    assert_eq!(store.read().unwrap(), vec![0x41, 0x42, 0x43]);
}

#[test]
/// An empty pool secret still synchronizes: the follower installs an empty
/// state, not nothing.
fn empty_state_synchronizes() {
    let (leader_stream, mut follower_stream) = UnixStream::pair().unwrap();
    let leader = spawn_leader(leader_stream, Vec::new(), approving_registry());

    let registry = approving_registry();
    let (result, store) = run_follower(&mut follower_stream, &registry);

    leader.join().unwrap().unwrap();
    result.unwrap();
    assert_eq!(store.read().unwrap(), Vec::<u8>::new());
}

#[test]
/// The committee has revoked the candidate's code measurement: the leader
/// aborts before sending the sealed state, and the candidate never installs.
fn revoked_code_aborts_before_release() {
    let (code, instance) = default_measurements();
    let mut registry = MockRegistry::new();
    registry.approve(&code);
    registry.approve(&instance);
    registry.revoke(&code);

    let (leader_stream, mut follower_stream) = UnixStream::pair().unwrap();
    let leader = spawn_leader(leader_stream, vec![1, 2, 3], registry);

    let follower_registry = approving_registry();
    let (result, store) = run_follower(&mut follower_stream, &follower_registry);

    assert!(matches!(
        leader.join().unwrap(),
        Err(KeySyncError::AuthorizationError(
            CommitteeError::CodeNotAuthorized
        ))
    ));
    // The leader closed the stream without sending the third message.
    assert!(matches!(result, Err(KeySyncError::SocketError(_))));
    assert!(matches!(store.read(), Err(KeySyncError::StateUnavailable)));
}

#[test]
/// The candidate's code is approved but its hardware instance is not.
fn unauthorized_instance_aborts() {
    let (code, _) = default_measurements();
    let mut registry = MockRegistry::new();
    registry.approve(&code);

    let (leader_stream, mut follower_stream) = UnixStream::pair().unwrap();
    let leader = spawn_leader(leader_stream, vec![1, 2, 3], registry);

    let follower_registry = approving_registry();
    let (result, _store) = run_follower(&mut follower_stream, &follower_registry);

    assert!(matches!(
        leader.join().unwrap(),
        Err(KeySyncError::AuthorizationError(
            CommitteeError::InstanceNotAuthorized
        ))
    ));
    assert!(result.is_err());
}

#[test]
/// The registry cannot be reached: the leader fails closed and releases
/// nothing.
fn oracle_outage_fails_closed() {
    let mut registry = approving_registry();
    registry.set_unavailable();

    let (leader_stream, mut follower_stream) = UnixStream::pair().unwrap();
    let leader = spawn_leader(leader_stream, vec![1, 2, 3], registry);

    let follower_registry = approving_registry();
    let (result, store) = run_follower(&mut follower_stream, &follower_registry);

    assert!(matches!(
        leader.join().unwrap(),
        Err(KeySyncError::AuthorizationError(
            CommitteeError::OracleUnavailable(_)
        ))
    ));
    assert!(result.is_err());
    assert!(matches!(store.read(), Err(KeySyncError::StateUnavailable)));
}

#[test]
/// A man in the middle flips one byte of the sealed state: the follower
/// detects the binding mismatch before attempting any decryption.
fn tampered_envelope_is_detected() {
    let (leader_stream, mut attacker_leader_side) = UnixStream::pair().unwrap();
    let (mut attacker_follower_side, mut follower_stream) = UnixStream::pair().unwrap();

    let leader = spawn_leader(leader_stream, vec![1, 2, 3], approving_registry());

    let attacker = thread::spawn(move || -> Result<(), SocketError> {
        let message1 = receive_buffer(&mut attacker_leader_side, MAX_LENGTH)?;
        send_buffer(&mut attacker_follower_side, &message1, MAX_LENGTH)?;

        let message2 = receive_buffer(&mut attacker_follower_side, MAX_LENGTH)?;
        send_buffer(&mut attacker_leader_side, &message2, MAX_LENGTH)?;

        let message3 = receive_buffer(&mut attacker_leader_side, MAX_LENGTH)?;
        let mut message3: Message3 = bincode::deserialize(&message3).unwrap();
        message3.envelope[0] ^= 0x01;
        let tampered = bincode::serialize(&message3).unwrap();
        send_buffer(&mut attacker_follower_side, &tampered, MAX_LENGTH)?;
        Ok(())
    });

    let registry = approving_registry();
    let (result, store) = run_follower(&mut follower_stream, &registry);

    leader.join().unwrap().unwrap();
    attacker.join().unwrap().unwrap();

    assert!(matches!(
        result,
        Err(KeySyncError::AttestationError(
            AttestationError::UserDataMismatch
        ))
    ));
    assert!(matches!(store.read(), Err(KeySyncError::StateUnavailable)));
}

#[test]
/// A captured third message replayed into a fresh session fails the
/// challenge check: the follower's new nonce is not the one bound into the
/// stale attestation.
fn replayed_m3_is_rejected() {
    // First, a recorded session: relay every message and keep the third.
    let (leader_stream, mut relay_leader_side) = UnixStream::pair().unwrap();
    let (mut relay_follower_side, mut follower_stream) = UnixStream::pair().unwrap();

    let leader = spawn_leader(leader_stream, vec![1, 2, 3], approving_registry());

    let relay = thread::spawn(move || -> Result<Vec<u8>, SocketError> {
        let message1 = receive_buffer(&mut relay_leader_side, MAX_LENGTH)?;
        send_buffer(&mut relay_follower_side, &message1, MAX_LENGTH)?;
        let message2 = receive_buffer(&mut relay_follower_side, MAX_LENGTH)?;
        send_buffer(&mut relay_leader_side, &message2, MAX_LENGTH)?;
        let message3 = receive_buffer(&mut relay_leader_side, MAX_LENGTH)?;
        send_buffer(&mut relay_follower_side, &message3, MAX_LENGTH)?;
        Ok(message3)
    });

    let registry = approving_registry();
    let (first_result, _) = run_follower(&mut follower_stream, &registry);
    first_result.unwrap();
    leader.join().unwrap().unwrap();
    let recorded_message3 = relay.join().unwrap().unwrap();

    // Then a fresh session in which the attacker answers with the recording.
    let (mut attacker_end, mut victim_stream) = UnixStream::pair().unwrap();
    let attacker = thread::spawn(move || -> Result<(), SocketError> {
        let message1 = bincode::serialize(&Message1 {
            leader_nonce: [7u8; 32],
        })
        .unwrap();
        send_buffer(&mut attacker_end, &message1, MAX_LENGTH)?;
        let _message2 = receive_buffer(&mut attacker_end, MAX_LENGTH)?;
        send_buffer(&mut attacker_end, &recorded_message3, MAX_LENGTH)?;
        Ok(())
    });

    let (result, store) = run_follower(&mut victim_stream, &registry);
    attacker.join().unwrap().unwrap();

    assert!(matches!(
        result,
        Err(KeySyncError::AttestationError(
            AttestationError::NonceMismatch
        ))
    ));
    assert!(matches!(store.read(), Err(KeySyncError::StateUnavailable)));
}

#[test]
/// A captured second message replayed against a fresh leader fails the
/// challenge check: the leader's new nonce is not the one bound into the
/// stale attestation.
fn replayed_m2_is_rejected() {
    // First, a recorded session.
    let (leader_stream, mut relay_leader_side) = UnixStream::pair().unwrap();
    let (mut relay_follower_side, mut follower_stream) = UnixStream::pair().unwrap();

    let leader = spawn_leader(leader_stream, vec![1, 2, 3], approving_registry());

    let relay = thread::spawn(move || -> Result<Vec<u8>, SocketError> {
        let message1 = receive_buffer(&mut relay_leader_side, MAX_LENGTH)?;
        send_buffer(&mut relay_follower_side, &message1, MAX_LENGTH)?;
        let message2 = receive_buffer(&mut relay_follower_side, MAX_LENGTH)?;
        send_buffer(&mut relay_leader_side, &message2, MAX_LENGTH)?;
        let message3 = receive_buffer(&mut relay_leader_side, MAX_LENGTH)?;
        send_buffer(&mut relay_follower_side, &message3, MAX_LENGTH)?;
        Ok(message2)
    });

    let registry = approving_registry();
    let (first_result, _) = run_follower(&mut follower_stream, &registry);
    first_result.unwrap();
    leader.join().unwrap().unwrap();
    let recorded_message2 = relay.join().unwrap().unwrap();

    // Then a fresh leader session answered with the recording.
    let (leader_stream, mut attacker_stream) = UnixStream::pair().unwrap();
    let fresh_leader = spawn_leader(leader_stream, vec![1, 2, 3], approving_registry());

    let _message1 = receive_buffer(&mut attacker_stream, MAX_LENGTH).unwrap();
    send_buffer(&mut attacker_stream, &recorded_message2, MAX_LENGTH).unwrap();

    assert!(matches!(
        fresh_leader.join().unwrap(),
        Err(KeySyncError::AttestationError(
            AttestationError::NonceMismatch
        ))
    ));
}

#[test]
/// A leader that binds a public key into its final attestation violates the
/// transcript rules and is rejected, even though everything else checks out.
fn leader_public_key_is_rejected() {
    let (mut dishonest_end, mut follower_stream) = UnixStream::pair().unwrap();

    let dishonest_leader = thread::spawn(move || {
        let attestor = TestAttestor::new();
        let verifier = verifier();

        let leader_nonce = [9u8; 32];
        let message1 = bincode::serialize(&Message1 { leader_nonce }).unwrap();
        send_buffer(&mut dishonest_end, &message1, MAX_LENGTH).unwrap();

        let message2 = receive_buffer(&mut dishonest_end, MAX_LENGTH).unwrap();
        let message2: Message2 = bincode::deserialize(&message2).unwrap();
        let candidate = verifier
            .verify(&message2.attestation_document, &leader_nonce, None)
            .unwrap();
        let follower_nonce = candidate.user_data().unwrap().to_vec();
        let follower_public_key = candidate.public_key().unwrap();

        let sealed = envelope::seal(b"secret", follower_public_key).unwrap();
        let digest = envelope::digest(&sealed);

        // A well-formed but forbidden public key in the final attestation.
        let stray_key = k256::SecretKey::random(&mut rand::rngs::OsRng);
        let document = attestor
            .attest(
                Some(ByteBuf::from(follower_nonce)),
                Some(ByteBuf::from(
                    stray_key.public_key().to_sec1_bytes().to_vec(),
                )),
                Some(ByteBuf::from(digest.to_vec())),
            )
            .unwrap();

        let message3 = bincode::serialize(&Message3 {
            envelope: ByteBuf::from(sealed),
            attestation_document: ByteBuf::from(document),
        })
        .unwrap();
        send_buffer(&mut dishonest_end, &message3, MAX_LENGTH).unwrap();
    });

    let registry = approving_registry();
    let (result, store) = run_follower(&mut follower_stream, &registry);
    dishonest_leader.join().unwrap();

    assert!(matches!(
        result,
        Err(KeySyncError::AttestationError(
            AttestationError::MalformedField("public_key")
        ))
    ));
    assert!(matches!(store.read(), Err(KeySyncError::StateUnavailable)));
}

#[test]
/// A silent leader trips the follower's receive deadline.
fn silent_leader_times_out() {
    let (leader_end, mut follower_stream) = UnixStream::pair().unwrap();
    follower_stream
        .set_read_timeout(Some(Duration::from_millis(200)))
        .unwrap();

    let registry = approving_registry();
    let (result, store) = run_follower(&mut follower_stream, &registry);

    assert!(matches!(
        result,
        Err(KeySyncError::SocketError(SocketError::Timeout))
    ));
    assert!(matches!(store.read(), Err(KeySyncError::StateUnavailable)));
    drop(leader_end);
}

#[test]
/// A frame declaring a length beyond the limit is rejected from its prefix
/// alone.
fn oversized_frame_is_rejected() {
    let (mut attacker_end, mut follower_stream) = UnixStream::pair().unwrap();

    let oversized = ((MAX_LENGTH + 1) as u32).to_be_bytes();
    attacker_end.write_all(&oversized).unwrap();

    let registry = approving_registry();
    let (result, _store) = run_follower(&mut follower_stream, &registry);

    assert!(matches!(
        result,
        Err(KeySyncError::SocketError(SocketError::FrameTooLarge(_, _)))
    ));
    drop(attacker_end);
}
