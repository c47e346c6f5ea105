//! The Cofre pool policy.
//!
//! The pool policy is public information shared by every member of a TEE
//! pool and by the operators that start new members.  It fixes:
//!
//! - The attestation platform profile new members must present,
//! - The governance configuration: how remote attestations are authorized,
//!   either against the on-chain committee registry or, for development
//!   deployments only, by checking for debug-mode images,
//! - The validity window applied to attestation document timestamps,
//! - The address of the key-synchronization endpoint, the per-receive
//!   deadline, and the frame limit applied to every message.
//!
//! ## Authors
//!
//! The Cofre Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.md` file in the Cofre root directory for
//! information on licensing and copyright.

use crate::{error::PolicyError, Platform};
use serde::{Deserialize, Serialize};
use std::time::Duration;

////////////////////////////////////////////////////////////////////////////////
// Governance.
////////////////////////////////////////////////////////////////////////////////

/// Configuration which instructs a pool member how to query the governance
/// committee's multi-signature registry when authorizing measurements.
#[derive(PartialEq, Clone, Debug, Serialize, Deserialize)]
pub struct CommitteeConfig {
    /// The address of the committee's multi-signature wallet contract.
    #[serde(rename = "wallet-address")]
    pub wallet_address: String,
    /// The minimum number of committee signatures an authorization or a
    /// revocation must carry before it is honoured.
    #[serde(rename = "threshold")]
    pub threshold: usize,
    /// The base URL of the transaction service that indexes the registry.
    #[serde(rename = "http-endpoint")]
    pub http_endpoint: String,
    /// The chain on which the wallet contract is deployed.
    #[serde(rename = "chain-id")]
    pub chain_id: u64,
}

/// A TEE pool is governed by a multi-signature committee.  Alternatively, a
/// testing deployment can forgo committee authorization, but only for
/// enclaves that are running in debug mode.
#[derive(PartialEq, Default, Debug, Clone, Serialize, Deserialize)]
pub enum Governance {
    /// This governance version is only available in debug mode.  It simply
    /// checks that the local and remote attestation documents are showing
    /// enclaves running debug images.
    #[default]
    #[serde(rename = "testing-only")]
    TestingOnly,
    /// A production pool should use this configuration option.
    #[serde(rename = "committee")]
    Committee(CommitteeConfig),
}

////////////////////////////////////////////////////////////////////////////////
// Pool policies, proper.
////////////////////////////////////////////////////////////////////////////////

fn default_max_message_length() -> usize {
    1 << 20
}

/// A type representing the data stored in a Cofre pool policy.  The policy is
/// loaded from a JSON file at startup and validated before any session is
/// served; all pool members of a given pool are expected to run with an
/// identical policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    /// The attestation platform profile of the pool.
    #[serde(rename = "platform")]
    platform: Platform,
    /// Governance configuration: how to authorize remote attestations.
    #[serde(rename = "governance")]
    governance: Governance,
    /// The address (`host:port`) of the key-synchronization endpoint.  The
    /// leader binds it; followers connect to it.
    #[serde(rename = "key-sync-url")]
    key_sync_url: String,
    /// The deadline, in seconds, applied to every receive on the byte stream.
    #[serde(rename = "receive-timeout-secs")]
    receive_timeout_secs: u64,
    /// The maximum acceptable age, in seconds, of a peer's attestation
    /// document timestamp.
    #[serde(rename = "max-attestation-age-secs")]
    max_attestation_age_secs: u64,
    /// The upper bound on the length of a single framed message.
    #[serde(rename = "max-message-length", default = "default_max_message_length")]
    max_message_length: usize,
    /// An optional PEM-encoded root certificate overriding the pinned
    /// platform root for attestation chain validation.  Intended for test
    /// deployments running against a mock attestation authority.
    #[serde(rename = "root-certificate", default)]
    root_certificate: Option<String>,
}

impl Policy {
    /// Constructs a new pool policy, validating the well-formedness of the
    /// resulting policy in the process.  Returns `Ok(policy)` iff these
    /// well-formedness checks pass.
    pub fn new(
        platform: Platform,
        governance: Governance,
        key_sync_url: String,
        receive_timeout_secs: u64,
        max_attestation_age_secs: u64,
        max_message_length: usize,
        root_certificate: Option<String>,
    ) -> Result<Self, PolicyError> {
        let policy = Self {
            platform,
            governance,
            key_sync_url,
            receive_timeout_secs,
            max_attestation_age_secs,
            max_message_length,
            root_certificate,
        };

        policy.assert_valid()?;
        Ok(policy)
    }

    /// Parses a pool policy from its JSON representation, validating the
    /// well-formedness of the resulting policy in the process.
    pub fn from_json(json: &str) -> Result<Self, PolicyError> {
        let policy: Self = serde_json::from_str(json)?;
        policy.assert_valid()?;
        Ok(policy)
    }

    /// Checks that the policy is well-formed.
    pub fn assert_valid(&self) -> Result<(), PolicyError> {
        if self.key_sync_url.is_empty() {
            return Err(PolicyError::InvalidPolicy("empty key-sync URL"));
        }
        if self.receive_timeout_secs == 0 {
            return Err(PolicyError::InvalidPolicy("zero receive timeout"));
        }
        if self.max_attestation_age_secs == 0 {
            return Err(PolicyError::InvalidPolicy("zero attestation age window"));
        }
        if self.max_message_length == 0 {
            return Err(PolicyError::InvalidPolicy("zero frame limit"));
        }
        if let Governance::Committee(committee) = &self.governance {
            if committee.threshold == 0 {
                return Err(PolicyError::InvalidPolicy("zero committee threshold"));
            }
            if committee.http_endpoint.is_empty() {
                return Err(PolicyError::InvalidPolicy("empty registry endpoint"));
            }
            let address = committee.wallet_address.as_str();
            if !address.starts_with("0x")
                || address.len() != 42
                || !address[2..].chars().all(|c| c.is_ascii_hexdigit())
            {
                return Err(PolicyError::InvalidPolicy("malformed wallet address"));
            }
        }
        Ok(())
    }

    /// Returns the attestation platform profile of the pool.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Returns the governance configuration.
    pub fn governance(&self) -> &Governance {
        &self.governance
    }

    /// Returns the address of the key-synchronization endpoint.
    pub fn key_sync_url(&self) -> &str {
        &self.key_sync_url
    }

    /// Returns the deadline applied to every receive on the byte stream.
    pub fn receive_timeout(&self) -> Duration {
        Duration::from_secs(self.receive_timeout_secs)
    }

    /// Returns the maximum acceptable age of an attestation document.
    pub fn max_attestation_age(&self) -> Duration {
        Duration::from_secs(self.max_attestation_age_secs)
    }

    /// Returns the upper bound on the length of a single framed message.
    pub fn max_message_length(&self) -> usize {
        self.max_message_length
    }

    /// Returns the PEM-encoded root certificate override, if any.
    pub fn root_certificate(&self) -> Option<&str> {
        self.root_certificate.as_deref()
    }
}
