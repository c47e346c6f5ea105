//! The sealed transport of the pool secret
//!
//! The secret state crosses the wire exactly once per handshake, as an
//! authenticated hybrid ciphertext: an ECIES key-encapsulation against the
//! follower's ephemeral secp256k1 key, with an AEAD over the plaintext.
//! The ciphertext is wrapped in a self-describing header carrying an
//! algorithm identifier so that a future scheme change is recognised rather
//! than misinterpreted.
//!
//! ## Authors
//!
//! The Cofre Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.md` file in the Cofre root directory for
//! information on licensing and copyright.

use crate::error::KeySyncError;
use serde::{Deserialize, Serialize};
use serde_bytes::ByteBuf;
use sha2::{Digest, Sha256};

/// The algorithm identifier of the only scheme currently in use: ECIES over
/// secp256k1 with an AES-256-GCM payload.
pub const ALGORITHM_ECIES_SECP256K1_AES_GCM: u32 = 1;

/// The envelope as it appears on the wire: an algorithm identifier followed
/// by the opaque ciphertext.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    algorithm: u32,
    ciphertext: ByteBuf,
}

/// Seals `plaintext` to the holder of the secret key matching
/// `recipient_public_key` (a SEC1-encoded secp256k1 point).
pub fn seal(plaintext: &[u8], recipient_public_key: &[u8]) -> Result<Vec<u8>, KeySyncError> {
    let ciphertext =
        ecies::encrypt(recipient_public_key, plaintext).map_err(|_| KeySyncError::SealFailed)?;
    bincode::serialize(&Envelope {
        algorithm: ALGORITHM_ECIES_SECP256K1_AES_GCM,
        ciphertext: ByteBuf::from(ciphertext),
    })
    .map_err(|_| KeySyncError::InternalError("envelope serialization"))
}

/// Opens an envelope with the recipient's secret key.  Fails when the
/// envelope was tampered with, was sealed to a different key, or declares an
/// algorithm this implementation does not recognise.  Callers must abort the
/// session and zeroize the secret on failure.
pub fn open(envelope: &[u8], recipient_secret_key: &[u8]) -> Result<Vec<u8>, KeySyncError> {
    let envelope: Envelope =
        bincode::deserialize(envelope).map_err(|_| KeySyncError::MalformedMessage("envelope"))?;
    if envelope.algorithm != ALGORITHM_ECIES_SECP256K1_AES_GCM {
        return Err(KeySyncError::UnknownAlgorithm(envelope.algorithm));
    }
    ecies::decrypt(recipient_secret_key, &envelope.ciphertext)
        .map_err(|_| KeySyncError::DecryptionFailed)
}

/// The transcript-binding digest of an envelope: SHA-256 over the exact
/// bytes that travel on the wire.
pub fn digest(envelope: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(envelope);
    hasher.finalize().into()
}
