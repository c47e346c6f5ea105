//! The secret state store
//!
//! Holds the pool's secret state: an opaque byte sequence containing private
//! keys and pool configuration.  The leader side reads a snapshot for
//! export; the follower side installs exactly once in its enclave lifetime.
//! The contents never leave the enclave in plaintext form.
//!
//! ## Authors
//!
//! The Cofre Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.md` file in the Cofre root directory for
//! information on licensing and copyright.

use crate::error::KeySyncError;
use std::sync::Mutex;

struct Inner {
    state: Option<Vec<u8>>,
    installed: bool,
}

/// The pool-wide secret state held by this enclave.  Installs are serialized
/// so that exactly one can succeed.
pub struct SecretStore {
    inner: Mutex<Inner>,
}

impl SecretStore {
    /// A store holding state this enclave already possesses (pool genesis,
    /// or state restored by the surrounding runtime).
    pub fn from_initial(state: Vec<u8>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: Some(state),
                installed: false,
            }),
        }
    }

    /// An empty store awaiting a single install.
    pub fn empty() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: None,
                installed: false,
            }),
        }
    }

    /// Reads a snapshot of the secret state for export.
    pub fn read(&self) -> Result<Vec<u8>, KeySyncError> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| KeySyncError::InternalError("secret store lock"))?;
        inner.state.clone().ok_or(KeySyncError::StateUnavailable)
    }

    /// Installs the secret state received from a leader.  At most one
    /// install can succeed per enclave lifetime.
    pub fn install(&self, state: Vec<u8>) -> Result<(), KeySyncError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| KeySyncError::InternalError("secret store lock"))?;
        if inner.installed {
            return Err(KeySyncError::AlreadyInstalled);
        }
        inner.state = Some(state);
        inner.installed = true;
        Ok(())
    }
}
