//! Committee authorization
//!
//! A pool admits an enclave only when the governance committee has published
//! a signed authorization for both of the enclave's canonical measurement
//! strings: the code measurement (`AWS-CODE:...`) and the hardware instance
//! measurement (`AWS-INSTANCE:...`).  The committee can also publish a
//! revocation, which wins over any prior authorization.  The registry itself
//! lives on-chain behind a multi-signature wallet; this crate only reads it.
//!
//! Registry lookups that fail (network down, chain unreachable) are not
//! authorization failures but they must never admit a peer: callers treat
//! `OracleUnavailable` exactly like a denial.
//!
//! ## Authors
//!
//! The Cofre Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.md` file in the Cofre root directory for
//! information on licensing and copyright.

use log::info;
use nitro_attestation::VerifiedAttestation;

/// Committee-related error type.
pub mod error;
/// An in-memory registry for tests.
#[cfg(any(test, feature = "mock"))]
pub mod mock;
/// The Safe multi-signature registry client.
pub mod safe;

pub use error::CommitteeError;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockRegistry;
pub use safe::SafeRegistry;

////////////////////////////////////////////////////////////////////////////////
// The registry seam.
////////////////////////////////////////////////////////////////////////////////

/// The two kinds of measurement the committee signs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MeasurementKind {
    /// A measurement of the enclave image (PCR-0, PCR-1 and PCR-2).
    Code,
    /// A measurement of the hardware instance hosting the enclave (PCR-4).
    Instance,
}

/// A read-only view of the committee's authorization registry.
/// Implementations are injected at construction.
pub trait CommitteeRegistry {
    /// Returns true iff a committee-signed approval for `measurement` exists
    /// and no committee-signed revocation of it exists.
    fn is_authorized(
        &self,
        kind: MeasurementKind,
        measurement: &str,
    ) -> Result<bool, CommitteeError>;
}

/// Checks that both of an attestation's canonical measurement strings are
/// authorized by the committee.  Both lookups are completed before either
/// verdict is inspected, so a denial does not reveal which lookup ran first.
pub fn authorize_attestation(
    registry: &dyn CommitteeRegistry,
    attestation: &VerifiedAttestation,
) -> Result<(), CommitteeError> {
    let code_authorized =
        registry.is_authorized(MeasurementKind::Code, attestation.code_measurement())?;
    let instance_authorized =
        registry.is_authorized(MeasurementKind::Instance, attestation.instance_measurement())?;

    if !code_authorized {
        return Err(CommitteeError::CodeNotAuthorized);
    }
    if !instance_authorized {
        return Err(CommitteeError::InstanceNotAuthorized);
    }

    info!("committee authorized code and instance measurements");
    Ok(())
}
