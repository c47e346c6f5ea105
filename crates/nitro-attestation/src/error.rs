//! Attestation errors
//!
//! ## Authors
//!
//! The Cofre Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.md` file in the Cofre root directory for
//! information on licensing and copyright.

use err_derive::Error;

/// The various error modes associated with producing and verifying
/// attestation documents.
#[derive(Debug, Error)]
pub enum AttestationError {
    /// The attestation device refused to produce a document.
    #[error(display = "AttestationError: the attestation device refused to produce a document.")]
    AttestationUnavailable,
    /// A field of the document could not be parsed, or held a value of an
    /// unexpected shape.
    #[error(display = "AttestationError: malformed attestation document: bad {}.", _0)]
    MalformedField(&'static str),
    /// The certificate chain carried by the document does not terminate at
    /// the pinned platform root.
    #[error(display = "AttestationError: certificate chain does not terminate at the pinned root.")]
    ChainUntrusted,
    /// The COSE signature does not verify under the leaf certificate's key.
    #[error(display = "AttestationError: document signature does not verify.")]
    BadSignature,
    /// The document timestamp falls outside the acceptable validity window.
    #[error(display = "AttestationError: document timestamp is outside the validity window.")]
    Expired,
    /// The document's nonce field does not match the expected challenge.
    #[error(display = "AttestationError: document nonce does not match the expected challenge.")]
    NonceMismatch,
    /// The document's user-data field does not match the expected binding.
    #[error(
        display = "AttestationError: document user-data does not match the expected binding."
    )]
    UserDataMismatch,
}
