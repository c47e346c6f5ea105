//! The attestation device seam
//!
//! An `Attestor` asks the platform to produce a signed attestation document
//! whose binding fields carry the caller's inputs verbatim.  The production
//! implementation talks to the Nitro Security Module; tests inject a
//! software authority instead.
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
use serde_bytes::ByteBuf;

/// The capability of producing hardware-signed attestation documents.
/// Implementations are injected at construction; each call is independent.
pub trait Attestor {
    /// Requests a signed attestation document whose `nonce`, `public_key`
    /// and `user_data` fields carry the given values verbatim.  A field may
    /// be absent if unused.
    fn attest(
        &self,
        nonce: Option<ByteBuf>,
        public_key: Option<ByteBuf>,
        user_data: Option<ByteBuf>,
    ) -> Result<Vec<u8>, AttestationError>;
}

#[cfg(feature = "nitro")]
pub use nsm::NsmAttestor;

#[cfg(feature = "nitro")]
mod nsm {
    use super::{AttestationError, Attestor, ByteBuf};
    use log::info;
    use nsm_api::{
        api::{Request, Response},
        driver::{nsm_exit, nsm_init, nsm_process_request},
    };

    /// An attestor backed by the Nitro Security Module device.
    pub struct NsmAttestor {
        nsm_fd: i32,
    }

    impl NsmAttestor {
        /// Opens the NSM device.  Fails when running outside a Nitro
        /// enclave.
        pub fn new() -> Result<Self, AttestationError> {
            info!("initializing NSM");
            let nsm_fd = nsm_init();
            if nsm_fd < 0 {
                return Err(AttestationError::AttestationUnavailable);
            }
            Ok(Self { nsm_fd })
        }
    }

    impl Attestor for NsmAttestor {
        fn attest(
            &self,
            nonce: Option<ByteBuf>,
            public_key: Option<ByteBuf>,
            user_data: Option<ByteBuf>,
        ) -> Result<Vec<u8>, AttestationError> {
            let request = Request::Attestation {
                user_data,
                nonce,
                public_key,
            };
            match nsm_process_request(self.nsm_fd, request) {
                Response::Attestation { document } => Ok(document),
                _ => Err(AttestationError::AttestationUnavailable),
            }
        }
    }

    impl Drop for NsmAttestor {
        fn drop(&mut self) {
            nsm_exit(self.nsm_fd);
        }
    }
}
