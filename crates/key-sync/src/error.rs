//! Key-synchronization errors
//!
//! Every way a session can abort, as a closed enumeration.  Nothing is
//! retried inside a session; all of these surface to the session supervisor,
//! which closes the stream and disposes the session.  Only `Timeout` and an
//! unavailable authorization oracle are "try again later" signals to the
//! operator; every other kind is a hard protocol failure.
//!
//! ## Authors
//!
//! The Cofre Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.md` file in the Cofre root directory for
//! information on licensing and copyright.

use committee::CommitteeError;
use err_derive::Error;
use io_utils::error::SocketError;
use nitro_attestation::AttestationError;

/// The various error modes of a key-synchronization session.
#[derive(Debug, Error)]
pub enum KeySyncError {
    /// The byte stream failed: closed, framing invalid, message too large,
    /// or a receive deadline expired.
    #[error(display = "KeySync: socket error: {:?}.", _0)]
    SocketError(#[error(source)] SocketError),
    /// A well-framed message did not decode to the expected body.
    #[error(display = "KeySync: malformed {} message.", _0)]
    MalformedMessage(&'static str),
    /// The peer's attestation document failed verification.
    #[error(display = "KeySync: attestation error: {:?}.", _0)]
    AttestationError(#[error(source)] AttestationError),
    /// The governance committee denied the peer, or could not be consulted.
    #[error(display = "KeySync: authorization error: {:?}.", _0)]
    AuthorizationError(#[error(source)] CommitteeError),
    /// Testing-only governance admitted a peer that is not a debug image,
    /// or this enclave is itself not a debug image.
    #[error(display = "KeySync: enclave is not running a debug image.")]
    NotDebugImage,
    /// The trusted entropy source refused to produce challenge bytes.
    #[error(display = "KeySync: no trusted entropy source is available.")]
    EntropyUnavailable,
    /// The secret state could not be sealed to the peer's ephemeral key.
    #[error(display = "KeySync: failed to seal the secret state to the peer's key.")]
    SealFailed,
    /// The envelope did not decrypt under the ephemeral secret; it was
    /// tampered with or sealed to a different key.
    #[error(display = "KeySync: failed to open the secret state envelope.")]
    DecryptionFailed,
    /// The envelope declares an algorithm this implementation does not
    /// recognise.
    #[error(display = "KeySync: unrecognised envelope algorithm {}.", _0)]
    UnknownAlgorithm(u32),
    /// This enclave holds no secret state to export.
    #[error(display = "KeySync: secret state is not available for export.")]
    StateUnavailable,
    /// Secret state has already been installed in this enclave's lifetime.
    #[error(display = "KeySync: secret state has already been installed.")]
    AlreadyInstalled,
    /// An internal invariant was violated; the process should exit.
    #[error(display = "KeySync: internal invariant violated: {}.", _0)]
    InternalError(&'static str),
}
