//! An in-memory committee registry for tests
//!
//! Not secure, but good for exercising authorization outcomes without a
//! chain: approvals and revocations are plain string sets, and the whole
//! registry can be switched off to simulate an outage.
//!
//! ## Authors
//!
//! The Cofre Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.md` file in the Cofre root directory for
//! information on licensing and copyright.

use crate::{error::CommitteeError, CommitteeRegistry, MeasurementKind};
use std::collections::HashSet;

/// An in-memory registry of approved and revoked measurement strings.
#[derive(Debug, Default)]
pub struct MockRegistry {
    approved: HashSet<String>,
    revoked: HashSet<String>,
    unavailable: bool,
}

impl MockRegistry {
    /// An empty registry: nothing is authorized.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a committee approval of `measurement`.
    pub fn approve(&mut self, measurement: &str) {
        self.approved.insert(measurement.to_string());
    }

    /// Records a committee revocation of `measurement`.
    pub fn revoke(&mut self, measurement: &str) {
        self.revoked.insert(measurement.to_string());
    }

    /// Simulates a registry outage: every lookup fails.
    pub fn set_unavailable(&mut self) {
        self.unavailable = true;
    }
}

impl CommitteeRegistry for MockRegistry {
    fn is_authorized(
        &self,
        _kind: MeasurementKind,
        measurement: &str,
    ) -> Result<bool, CommitteeError> {
        if self.unavailable {
            return Err(CommitteeError::OracleUnavailable(
                "mock registry offline".to_string(),
            ));
        }
        Ok(self.approved.contains(measurement) && !self.revoked.contains(measurement))
    }
}
