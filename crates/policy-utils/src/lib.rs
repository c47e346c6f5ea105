//! Types and definitions relating to the Cofre pool policy.
//!
//! The pool policy captures everything an enclave operator fixes before a
//! pool member starts: the attestation platform profile, the governance
//! committee that authorizes measurements, the attestation validity window,
//! and the transport parameters of the key-synchronization endpoint.  Every
//! member of a pool is expected to run with the same policy.
//!
//! ## Authors
//!
//! The Cofre Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.md` file in the Cofre root directory for
//! information on licensing and copyright.

use error::PlatformError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Error types related to the handling of policies.
pub mod error;
/// Types for working with policies themselves.
pub mod policy;

////////////////////////////////////////////////////////////////////////////
// Platforms supported by Cofre.
////////////////////////////////////////////////////////////////////////////

/// A type capturing the attestation platform the enclave is running on.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// The enclave is running under AWS Nitro enclaves.
    Nitro,
    /// The mock platform for unit and integration testing.
    Mock,
}

impl FromStr for Platform {
    type Err = PlatformError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nitro" => Ok(Platform::Nitro),
            "mock" => Ok(Platform::Mock),
            _ => Err(PlatformError::InvalidPlatform(String::from(s))),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Platform::Nitro => write!(f, "nitro"),
            Platform::Mock => write!(f, "mock"),
        }
    }
}
