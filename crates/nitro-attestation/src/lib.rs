//! AWS Nitro attestation material
//!
//! Production and verification of hardware-signed attestation documents for
//! the Nitro platform profile.  A document binds three caller-controlled
//! fields (a challenge nonce, a public key, and a user-data blob) into a
//! COSE-signed payload together with the enclave's PCR measurements; the
//! verifier checks the signature chain against a pinned platform root before
//! exposing any field.
//!
//! ## Authors
//!
//! The Cofre Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.md` file in the Cofre root directory for
//! information on licensing and copyright.

/// The attestation device seam and its NSM-backed implementation.
pub mod attestor;
/// Attestation document parsing and verification.
pub mod document;
/// Attestation-related error type.
pub mod error;

pub use attestor::Attestor;
#[cfg(feature = "nitro")]
pub use attestor::NsmAttestor;
pub use document::{
    debug_code_measurement, instance_measurement_for, AttestationDocument, AttestationVerifier,
    VerifiedAttestation, AWS_NITRO_ROOT_CA_PEM,
};
pub use error::AttestationError;
