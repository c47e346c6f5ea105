//! Committee authorization errors
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

/// The various error modes associated with committee authorization.
#[derive(Debug, Error)]
pub enum CommitteeError {
    /// The committee has not authorized the peer's code measurement, or has
    /// revoked it.
    #[error(display = "CommitteeError: code measurement is not authorized.")]
    CodeNotAuthorized,
    /// The committee has not authorized the peer's instance measurement, or
    /// has revoked it.
    #[error(display = "CommitteeError: instance measurement is not authorized.")]
    InstanceNotAuthorized,
    /// The registry could not be consulted.  Callers must treat this as
    /// non-authorization.
    #[error(display = "CommitteeError: authorization registry unavailable: {}.", _0)]
    OracleUnavailable(String),
    /// The configured wallet address could not be interpreted.
    #[error(display = "CommitteeError: malformed wallet address: {}.", _0)]
    MalformedAddress(String),
}
