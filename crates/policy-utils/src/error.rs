//! Error types associated with the pool policy.
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

////////////////////////////////////////////////////////////////////////////////
// Policy-related errors.
////////////////////////////////////////////////////////////////////////////////

/// A generic catch-all error type for functionality related to platforms.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error(display = "PlatformError: Enclave platform not supported: {:?}.", _0)]
    InvalidPlatform(String),
}

/// A generic catch-all error type for functionality related to policies.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error(display = "PolicyError: JSON error: {:?}.", _0)]
    JSONError(#[error(source)] serde_json::Error),
    #[error(display = "PolicyError: invalid policy: {}.", _0)]
    InvalidPolicy(&'static str),
}
