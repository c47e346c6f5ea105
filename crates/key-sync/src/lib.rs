//! The key-synchronization protocol
//!
//! A pool of enclaves shares long-lived secret state.  A freshly started
//! enclave (the follower) obtains that state from an existing member (the
//! leader) over an untrusted byte stream, in a two-round handshake of
//! exactly three framed messages:
//!
//! 1. the leader issues a random challenge,
//! 2. the follower answers with an attestation document binding the
//!    challenge, an ephemeral public key, and its own challenge,
//! 3. the leader answers with the secret state sealed to the ephemeral key,
//!    plus an attestation binding the follower's challenge and the
//!    ciphertext digest.
//!
//! Each side releases nothing until it has verified the other side's
//! attestation against the pinned platform root and obtained a governance
//! authorization for both of the peer's measurements.  Every failure is
//! terminal: the session aborts, the stream is closed, and a new session
//! starts from scratch with fresh challenges and a fresh ephemeral key.
//!
//! ## Authors
//!
//! The Cofre Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.md` file in the Cofre root directory for
//! information on licensing and copyright.

/// The sealed transport of the pool secret.
pub mod envelope;
/// Protocol error taxonomy.
pub mod error;
/// Wire message bodies.
pub mod message;
/// Leader and follower session drivers.
pub mod session;
/// The secret state store.
pub mod store;

pub use error::KeySyncError;
pub use session::{Authorization, SyncContext};
pub use store::SecretStore;
