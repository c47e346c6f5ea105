//! The Safe multi-signature registry client
//!
//! The committee records decisions by co-signing messages on a Safe wallet
//! contract.  An authorization is the canonical measurement string itself; a
//! revocation is the same string prefixed with `"REVOKE: "`.  Off-chain, the
//! Safe transaction service indexes signed messages by their EIP-712
//! `SafeMessage` hash, so a lookup is: hash the string the way Safe does,
//! fetch the message record, and count confirmations.
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
use log::debug;
use policy_utils::policy::CommitteeConfig;
use serde::Deserialize;
use std::time::Duration;
use tiny_keccak::{Hasher, Keccak};

/// Deadline applied to each transaction-service request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

////////////////////////////////////////////////////////////////////////////////
// EIP-712 message hashing.
////////////////////////////////////////////////////////////////////////////////

fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut output = [0u8; 32];
    let mut hasher = Keccak::v256();
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}

/// The EIP-191 "personal sign" hash of a message, as produced by wallets
/// when the committee members sign the measurement string.
fn personal_message_hash(message: &str) -> [u8; 32] {
    let prefix = format!("\x19Ethereum Signed Message:\n{}", message.len());
    keccak256(&[prefix.as_bytes(), message.as_bytes()].concat())
}

/// A `u64` left-padded to an ABI word.
fn abi_word_uint(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// A 20-byte address left-padded to an ABI word.
fn abi_word_address(address: &str) -> Result<[u8; 32], CommitteeError> {
    let stripped = address.strip_prefix("0x").unwrap_or(address);
    let bytes =
        hex::decode(stripped).map_err(|_| CommitteeError::MalformedAddress(address.into()))?;
    if bytes.len() != 20 {
        return Err(CommitteeError::MalformedAddress(address.into()));
    }
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(&bytes);
    Ok(word)
}

/// Computes the EIP-712 hash under which the Safe transaction service
/// indexes a signed `SafeMessage`, rendered as a `0x`-prefixed hex string.
///
/// The structure is `keccak256(0x1901 || domainSeparator || structHash)`
/// with `domainSeparator` over `(chainId, verifyingContract)` and the
/// `SafeMessage` struct holding the EIP-191 hash of the raw message.
pub fn safe_message_hash(
    chain_id: u64,
    safe_address: &str,
    message: &str,
) -> Result<String, CommitteeError> {
    let domain_typehash = keccak256(b"EIP712Domain(uint256 chainId,address verifyingContract)");
    let domain_separator = keccak256(
        &[
            &domain_typehash[..],
            &abi_word_uint(chain_id)[..],
            &abi_word_address(safe_address)?[..],
        ]
        .concat(),
    );

    let message_typehash = keccak256(b"SafeMessage(bytes message)");
    let struct_hash = keccak256(
        &[
            &message_typehash[..],
            &keccak256(&personal_message_hash(message))[..],
        ]
        .concat(),
    );

    let digest = keccak256(
        &[
            &[0x19u8, 0x01u8][..],
            &domain_separator[..],
            &struct_hash[..],
        ]
        .concat(),
    );
    Ok(format!("0x{}", hex::encode(digest)))
}

////////////////////////////////////////////////////////////////////////////////
// Transaction-service payloads.
////////////////////////////////////////////////////////////////////////////////

/// One committee member's confirmation of a signed message.
#[derive(Debug, Deserialize)]
struct SafeMessageConfirmation {
    #[allow(dead_code)]
    owner: String,
    #[allow(dead_code)]
    signature: String,
}

/// A signed message record as returned by the transaction service.  Fields
/// the oracle does not consult are left out; serde ignores them.
#[derive(Debug, Deserialize)]
struct SafeMessage {
    safe: String,
    #[serde(rename = "messageHash")]
    #[allow(dead_code)]
    message_hash: String,
    confirmations: Vec<SafeMessageConfirmation>,
}

////////////////////////////////////////////////////////////////////////////////
// The registry client.
////////////////////////////////////////////////////////////////////////////////

/// A committee registry backed by a Safe wallet and its transaction service.
pub struct SafeRegistry {
    config: CommitteeConfig,
    client: reqwest::blocking::Client,
}

impl SafeRegistry {
    /// Creates a registry client for the given committee configuration.
    pub fn new(config: &CommitteeConfig) -> Result<Self, CommitteeError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| CommitteeError::OracleUnavailable(err.to_string()))?;
        Ok(Self {
            config: config.clone(),
            client,
        })
    }

    /// Fetches the signed-message record stored under `message_hash`, if one
    /// exists.  Any transport failure or unexpected status is a registry
    /// outage, never an implicit "not found".
    fn fetch_message(&self, message_hash: &str) -> Result<Option<SafeMessage>, CommitteeError> {
        let url = format!("{}/{}/", self.config.http_endpoint, message_hash);
        debug!("fetching committee message record from {}", url);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .map_err(|err| CommitteeError::OracleUnavailable(err.to_string()))?;

        match response.status() {
            reqwest::StatusCode::OK => {
                let message = response
                    .json::<SafeMessage>()
                    .map_err(|err| CommitteeError::OracleUnavailable(err.to_string()))?;
                Ok(Some(message))
            }
            reqwest::StatusCode::NOT_FOUND => Ok(None),
            status => Err(CommitteeError::OracleUnavailable(format!(
                "registry returned status {}",
                status
            ))),
        }
    }

    /// Returns true iff `message` has been recorded against the configured
    /// wallet with at least the threshold number of confirmations.
    fn recorded_with_quorum(&self, message: &str) -> Result<bool, CommitteeError> {
        let hash = safe_message_hash(self.config.chain_id, &self.config.wallet_address, message)?;
        match self.fetch_message(&hash)? {
            None => Ok(false),
            Some(record) => Ok(record.safe == self.config.wallet_address
                && record.confirmations.len() >= self.config.threshold),
        }
    }
}

impl CommitteeRegistry for SafeRegistry {
    fn is_authorized(
        &self,
        _kind: MeasurementKind,
        measurement: &str,
    ) -> Result<bool, CommitteeError> {
        let approved = self.recorded_with_quorum(measurement)?;
        let revoked = self.recorded_with_quorum(&format!("REVOKE: {}", measurement))?;
        Ok(approved && !revoked)
    }
}
