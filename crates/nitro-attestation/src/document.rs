//! Attestation document parsing and verification
//!
//! A Nitro attestation document is a CBOR payload carried inside a COSE
//! Sign1 envelope.  The design is unfortunately non-layered: the CBOR
//! payload must be decoded before the COSE signature can be checked, because
//! the signing certificate and its chain travel inside the payload itself.
//! The verifier here is strict: every check must pass before any field of
//! the document is exposed to the caller, and binding fields are compared
//! byte-for-byte in constant time.
//!
//! ## Authors
//!
//! The Cofre Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.md` file in the Cofre root directory for
//! information on licensing and copyright.

use crate::error::AttestationError;
use aws_nitro_enclaves_cose::{crypto::Openssl, CoseSign1};
use log::error;
use openssl::{
    stack::Stack,
    x509::{store::X509StoreBuilder, X509StoreContext, X509},
};
use serde::{Deserialize, Serialize};
use serde_bytes::ByteBuf;
use std::{
    collections::BTreeMap,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

/// The root certificate of the AWS Nitro Enclaves attestation PKI, as
/// published by Amazon.  Every production attestation document must chain up
/// to this certificate.
pub const AWS_NITRO_ROOT_CA_PEM: &[u8] = b"-----BEGIN CERTIFICATE-----
MIICETCCAZagAwIBAgIRAPkxdWgbkK/hHUbMtOTn+FYwCgYIKoZIzj0EAwMwSTEL
MAkGA1UEBhMCVVMxDzANBgNVBAoMBkFtYXpvbjEMMAoGA1UECwwDQVdTMRswGQYD
VQQDDBJhd3Mubml0cm8tZW5jbGF2ZXMwHhcNMTkxMDI4MTMyODA1WhcNNDkxMDI4
MTQyODA1WjBJMQswCQYDVQQGEwJVUzEPMA0GA1UECgwGQW1hem9uMQwwCgYDVQQL
DANBV1MxGzAZBgNVBAMMEmF3cy5uaXRyby1lbmNsYXZlczB2MBAGByqGSM49AgEG
BSuBBAAiA2IABPwCVOumCMHzaHDimtqQvkY4MpJzbolL//Zy2YlES1BR5TSksfbb
48C8WBoyt7F2Bw7eEtaaP+ohG2bnUs990d0JX28TcPQXCEPZ3BABIeTPYwEoCWZE
h8l5YoQwTcU/9KNCMEAwDwYDVR0TAQH/BAUwAwEB/zAdBgNVHQ4EFgQUkCW1DdkF
R+eWw5b6cp3PmanfS5YwDgYDVR0PAQH/BAQDAgGGMAoGCCqGSM49BAMDA2kAMGYC
MQCjfy+Rocm9Xue4YnwWmNJVA44fA0P5W2OpYow9OYCVRaEevL8uO1XYru5xtMPW
rfMCMQCi85sWBbJwKKXdS6BptQFuZbT73o/gBh1qUxl/nNr12UO8Yfwr6wPLb+6N
IwLz3/Y=
-----END CERTIFICATE-----";

////////////////////////////////////////////////////////////////////////////////
// The document payload.
////////////////////////////////////////////////////////////////////////////////

/// The CBOR payload of a Nitro attestation document.
/// See [AWS Attestation](https://docs.aws.amazon.com/enclaves/latest/user/set-up-attestation.html).
#[derive(Debug, Serialize, Deserialize)]
pub struct AttestationDocument {
    /// The issuing NSM's module identifier.
    pub module_id: String,
    /// The digest algorithm used for the PCR values.
    pub digest: String,
    /// Document creation time, in milliseconds since the UNIX epoch.
    pub timestamp: u64,
    /// The platform configuration registers at the time of attestation.
    pub pcrs: BTreeMap<u8, ByteBuf>,
    /// The DER-encoded certificate that signed this document.
    pub certificate: ByteBuf,
    /// The DER-encoded issuing chain, up to but excluding the root.
    pub cabundle: Vec<ByteBuf>,
    /// Caller-supplied public key, carried verbatim.
    pub public_key: Option<ByteBuf>,
    /// Caller-supplied user data, carried verbatim.
    pub user_data: Option<ByteBuf>,
    /// Caller-supplied challenge nonce, carried verbatim.
    pub nonce: Option<ByteBuf>,
}

/// Returns the canonical code-measurement string for a document whose PCR-0,
/// PCR-1 and PCR-2 hold the given values.  Missing registers render as the
/// empty string.
fn code_measurement(pcrs: &BTreeMap<u8, ByteBuf>) -> String {
    let pcr0 = pcrs.get(&0).map(hex::encode).unwrap_or_default();
    let pcr1 = pcrs.get(&1).map(hex::encode).unwrap_or_default();
    let pcr2 = pcrs.get(&2).map(hex::encode).unwrap_or_default();
    format!("AWS-CODE:{}:{}:{}", pcr0, pcr1, pcr2)
}

/// Returns the canonical instance-measurement string for a document whose
/// PCR-4 holds the given value.
fn instance_measurement(pcrs: &BTreeMap<u8, ByteBuf>) -> String {
    let pcr4 = pcrs.get(&4).map(hex::encode).unwrap_or_default();
    format!("AWS-INSTANCE:{}", pcr4)
}

/// The canonical code-measurement string of a debug-mode enclave.  Nitro
/// zeroes PCR-0 through PCR-2 when an enclave is started in debug mode; each
/// register is 48 zero bytes, or 96 zero digits in hex.
pub fn debug_code_measurement() -> String {
    let zeroes = "0".repeat(48 * 2);
    format!("AWS-CODE:{}:{}:{}", zeroes, zeroes, zeroes)
}

/// Computes the canonical instance-measurement string for a given EC2
/// instance ID (e.g. "i-1234567890abcdef0").  Nitro computes
/// `PCR4 = SHA384([0u8; 48] || instance_id)`, so the expected string can be
/// derived off-enclave and submitted to the committee for signature.
pub fn instance_measurement_for(instance_id: &str) -> String {
    use sha2::Digest;
    let mut hasher = sha2::Sha384::new();
    hasher.update([0u8; 48]);
    hasher.update(instance_id.as_bytes());
    format!("AWS-INSTANCE:{}", hex::encode(hasher.finalize()))
}

////////////////////////////////////////////////////////////////////////////////
// Verification.
////////////////////////////////////////////////////////////////////////////////

/// Compares two byte strings without leaking the position of the first
/// difference.  Lengths are public.
fn bytes_equal(left: &[u8], right: &[u8]) -> bool {
    left.len() == right.len() && openssl::memcmp::eq(left, right)
}

/// A verified view over an attestation document.  Only the measurement
/// strings and the binding fields survive verification; certificates and raw
/// PCR values stay behind this type.
#[derive(Debug)]
pub struct VerifiedAttestation {
    code_measurement: String,
    instance_measurement: String,
    public_key: Option<Vec<u8>>,
    user_data: Option<Vec<u8>>,
}

impl VerifiedAttestation {
    /// The canonical code-measurement string, `AWS-CODE:pcr0:pcr1:pcr2`.
    pub fn code_measurement(&self) -> &str {
        &self.code_measurement
    }

    /// The canonical instance-measurement string, `AWS-INSTANCE:pcr4`.
    pub fn instance_measurement(&self) -> &str {
        &self.instance_measurement
    }

    /// The public key the peer bound into the document, if any.
    pub fn public_key(&self) -> Option<&[u8]> {
        self.public_key.as_deref()
    }

    /// The user data the peer bound into the document, if any.
    pub fn user_data(&self) -> Option<&[u8]> {
        self.user_data.as_deref()
    }
}

/// A verifier for COSE-signed Nitro attestation documents, configured with
/// the platform root of trust and the acceptable document age.
pub struct AttestationVerifier {
    root_certificate: X509,
    max_document_age: Duration,
}

impl AttestationVerifier {
    /// Creates a verifier trusting the given PEM-encoded root certificate.
    pub fn new(root_certificate_pem: &[u8], max_document_age: Duration) -> Result<Self, AttestationError> {
        let root_certificate = X509::from_pem(root_certificate_pem)
            .map_err(|_| AttestationError::MalformedField("root certificate"))?;
        Ok(Self {
            root_certificate,
            max_document_age,
        })
    }

    /// Creates a verifier pinned to the published AWS Nitro Enclaves root.
    pub fn aws_nitro(max_document_age: Duration) -> Result<Self, AttestationError> {
        Self::new(AWS_NITRO_ROOT_CA_PEM, max_document_age)
    }

    /// Verifies a COSE-signed attestation document.
    ///
    /// The checks run in a fixed order: certificate chain against the pinned
    /// root, COSE signature under the leaf key, timestamp within the
    /// validity window, `nonce` byte-equal to `expected_nonce`, `user_data`
    /// byte-equal to `expected_user_data` when one is supplied, and
    /// well-formedness of the `public_key` field when present.  Only when
    /// every check passes is a view over the document returned.
    pub fn verify(
        &self,
        document: &[u8],
        expected_nonce: &[u8],
        expected_user_data: Option<&[u8]>,
    ) -> Result<VerifiedAttestation, AttestationError> {
        let cose = CoseSign1::from_bytes(document)
            .map_err(|_| AttestationError::MalformedField("cose envelope"))?;
        // The payload must be decoded before signature verification to reach
        // the certificate chain it carries.
        let payload = cose
            .get_payload::<Openssl>(None)
            .map_err(|_| AttestationError::MalformedField("payload"))?;
        let doc: AttestationDocument = serde_cbor::from_slice(&payload)
            .map_err(|_| AttestationError::MalformedField("payload"))?;

        let leaf_certificate = X509::from_der(&doc.certificate)
            .map_err(|_| AttestationError::MalformedField("certificate"))?;
        let ca_certificates: Vec<X509> = doc
            .cabundle
            .iter()
            .map(|der| X509::from_der(der))
            .collect::<Result<_, _>>()
            .map_err(|_| AttestationError::MalformedField("cabundle"))?;

        self.verify_certificate_chain(&leaf_certificate, &ca_certificates)?;

        let signing_key = leaf_certificate
            .public_key()
            .map_err(|_| AttestationError::MalformedField("certificate"))?;
        match cose.verify_signature::<Openssl>(&signing_key) {
            Ok(true) => (),
            _ => return Err(AttestationError::BadSignature),
        }

        self.check_document_age(doc.timestamp)?;

        match doc.nonce.as_ref() {
            Some(nonce) if bytes_equal(nonce, expected_nonce) => (),
            _ => return Err(AttestationError::NonceMismatch),
        }

        if let Some(expected) = expected_user_data {
            match doc.user_data.as_ref() {
                Some(user_data) if bytes_equal(user_data, expected) => (),
                _ => return Err(AttestationError::UserDataMismatch),
            }
        }

        if let Some(public_key) = doc.public_key.as_ref() {
            if k256::PublicKey::from_sec1_bytes(public_key).is_err() {
                return Err(AttestationError::MalformedField("public_key"));
            }
        }

        Ok(VerifiedAttestation {
            code_measurement: code_measurement(&doc.pcrs),
            instance_measurement: instance_measurement(&doc.pcrs),
            public_key: doc.public_key.map(|buf| buf.into_vec()),
            user_data: doc.user_data.map(|buf| buf.into_vec()),
        })
    }

    /// Verifies that the leaf certificate chains up to the pinned root
    /// through the document's CA bundle.
    fn verify_certificate_chain(
        &self,
        leaf_certificate: &X509,
        ca_certificates: &[X509],
    ) -> Result<(), AttestationError> {
        let chain_check = || -> Result<bool, openssl::error::ErrorStack> {
            let mut store = X509StoreBuilder::new()?;
            store.add_cert(self.root_certificate.clone())?;
            let store = store.build();

            let mut untrusted = Stack::new()?;
            for certificate in ca_certificates {
                untrusted.push(certificate.clone())?;
            }

            let mut context = X509StoreContext::new()?;
            context.init(&store, leaf_certificate, &untrusted, |context| {
                let ok = context.verify_cert()?;
                if !ok {
                    error!(
                        "certificate error '{}' at depth {}",
                        context.error(),
                        context.error_depth()
                    );
                }
                Ok(ok)
            })
        };
        match chain_check() {
            Ok(true) => Ok(()),
            _ => Err(AttestationError::ChainUntrusted),
        }
    }

    /// Rejects documents whose creation timestamp is older than the
    /// configured window.  Timestamps from the future are treated as having
    /// age zero rather than trusted as fresh.
    fn check_document_age(&self, timestamp_millis: u64) -> Result<(), AttestationError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        let age_millis = now.as_millis().saturating_sub(timestamp_millis as u128);
        if age_millis > self.max_document_age.as_millis() {
            return Err(AttestationError::Expired);
        }
        Ok(())
    }
}
