//! The leader and follower runners
//!
//! The leader binds the key-synchronization endpoint and serves sessions
//! sequentially: one failed candidate does not take the server down.  The
//! follower runs a single session against a leader, installs the received
//! state, and exits.  Session dependencies are assembled here, once, from
//! the pool policy.
//!
//! ## Authors
//!
//! The Cofre Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.md` file in the Cofre root directory for
//! information on licensing and copyright.

use anyhow::{Context, Result};
use committee::SafeRegistry;
use key_sync::{Authorization, SecretStore, SyncContext};
use log::{error, info};
use nitro_attestation::{AttestationVerifier, Attestor};
use policy_utils::{
    policy::{Governance, Policy},
    Platform,
};
use std::{
    fs,
    net::{TcpListener, TcpStream},
    path::Path,
    time::Duration,
};

/// Binds the key-synchronization endpoint and serves sessions until the
/// process is stopped.
pub fn run_leader(policy: &Policy, state_path: &Path) -> Result<()> {
    let state = fs::read(state_path)
        .with_context(|| format!("failed to read secret state from {:?}", state_path))?;
    let store = SecretStore::from_initial(state);

    let attestor = build_attestor(policy)?;
    let verifier = build_verifier(policy)?;
    let registry = build_registry(policy)?;

    let listener = TcpListener::bind(policy.key_sync_url())
        .with_context(|| format!("failed to bind {}", policy.key_sync_url()))?;
    info!("serving key-sync sessions on {}", policy.key_sync_url());

    for stream in listener.incoming() {
        let mut stream = match stream {
            Ok(stream) => stream,
            Err(err) => {
                error!("accept failed: {}", err);
                continue;
            }
        };
        if let Err(err) = configure_stream(&mut stream, policy) {
            error!("failed to configure stream: {}", err);
            continue;
        }

        let context = build_context(policy, attestor.as_ref(), &verifier, &registry);
        match context.serve_leader(&store, &mut stream) {
            Ok(()) => info!("key-sync session complete"),
            Err(err) => error!("key-sync session aborted: {}", err),
        }
        // Dropping the stream closes it; the next candidate starts a fresh
        // session with fresh challenges.
    }

    Ok(())
}

/// Runs a single follower session against the configured leader, then
/// persists the installed state.
pub fn run_follower(policy: &Policy, state_path: &Path) -> Result<()> {
    let attestor = build_attestor(policy)?;
    let verifier = build_verifier(policy)?;
    let registry = build_registry(policy)?;

    let mut stream = TcpStream::connect(policy.key_sync_url())
        .with_context(|| format!("failed to connect to {}", policy.key_sync_url()))?;
    configure_stream(&mut stream, policy)?;

    let store = SecretStore::empty();
    let context = build_context(policy, attestor.as_ref(), &verifier, &registry);
    context.serve_follower(&store, &mut stream)?;

    let state = store.read()?;
    fs::write(state_path, state)
        .with_context(|| format!("failed to write secret state to {:?}", state_path))?;
    info!("secret state installed at {:?}", state_path);

    Ok(())
}

/// Applies the policy's receive deadline to a connected stream.
fn configure_stream(stream: &mut TcpStream, policy: &Policy) -> Result<()> {
    stream
        .set_read_timeout(Some(policy.receive_timeout()))
        .context("failed to set read deadline")?;
    Ok(())
}

/// Builds the attestation device for the configured platform profile.
fn build_attestor(policy: &Policy) -> Result<Box<dyn Attestor>> {
    match policy.platform() {
        Platform::Nitro => nitro_attestor(),
        Platform::Mock => mock_attestor(),
    }
}

#[cfg(feature = "nitro")]
fn nitro_attestor() -> Result<Box<dyn Attestor>> {
    Ok(Box::new(nitro_attestation::NsmAttestor::new()?))
}

#[cfg(not(feature = "nitro"))]
fn nitro_attestor() -> Result<Box<dyn Attestor>> {
    Err(anyhow::anyhow!("this build does not include Nitro support"))
}

#[cfg(feature = "mock")]
fn mock_attestor() -> Result<Box<dyn Attestor>> {
    Ok(Box::new(nitro_attestation::test::TestAttestor::new()))
}

#[cfg(not(feature = "mock"))]
fn mock_attestor() -> Result<Box<dyn Attestor>> {
    Err(anyhow::anyhow!("this build does not include the mock platform"))
}

/// Builds the document verifier pinned to the platform root, or to the
/// policy's root override when one is configured.
fn build_verifier(policy: &Policy) -> Result<AttestationVerifier> {
    let max_age = policy.max_attestation_age();
    if let Some(pem) = policy.root_certificate() {
        return Ok(AttestationVerifier::new(pem.as_bytes(), max_age)?);
    }
    match policy.platform() {
        Platform::Nitro => Ok(AttestationVerifier::aws_nitro(max_age)?),
        Platform::Mock => mock_verifier(max_age),
    }
}

#[cfg(feature = "mock")]
fn mock_verifier(max_age: Duration) -> Result<AttestationVerifier> {
    Ok(AttestationVerifier::new(
        nitro_attestation::test::test_root_certificate_pem(),
        max_age,
    )?)
}

#[cfg(not(feature = "mock"))]
fn mock_verifier(_max_age: Duration) -> Result<AttestationVerifier> {
    Err(anyhow::anyhow!("this build does not include the mock platform"))
}

/// Builds the committee registry client when the policy requires one.
fn build_registry(policy: &Policy) -> Result<Option<SafeRegistry>> {
    match policy.governance() {
        Governance::Committee(config) => Ok(Some(SafeRegistry::new(config)?)),
        Governance::TestingOnly => Ok(None),
    }
}

/// Assembles the session context from the policy and the built dependencies.
fn build_context<'a>(
    policy: &Policy,
    attestor: &'a dyn Attestor,
    verifier: &'a AttestationVerifier,
    registry: &'a Option<SafeRegistry>,
) -> SyncContext<'a, dyn Attestor + 'a> {
    let authorization = match registry {
        Some(registry) => Authorization::Committee(registry),
        None => Authorization::TestingOnly,
    };
    SyncContext::new(attestor, verifier, authorization)
        .with_max_message_length(policy.max_message_length())
}
