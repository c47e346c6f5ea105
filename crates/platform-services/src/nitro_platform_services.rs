//! AWS Nitro enclave-specific platform services
//!
//! Implements the `getrandom` service using the trusted entropy source
//! provided by the Nitro Security Module.
//!
//! ## Authors
//!
//! The Cofre Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.md` file in the Cofre root directory for
//! information on licensing and copyright.

use super::result;
use nsm_api::{
    api::{Request, Response},
    driver::{nsm_exit, nsm_init, nsm_process_request},
};

/// Fills a buffer, `buffer`, with random bytes sampled from the NSM's
/// hardware entropy source.  The NSM returns at most a few hundred bytes per
/// request, so large buffers are filled over repeated requests.
pub fn platform_getrandom(buffer: &mut [u8]) -> result::Result<()> {
    let nsm_fd = nsm_init();
    if nsm_fd < 0 {
        return result::Result::Unavailable;
    }

    let mut filled = 0;

    while filled < buffer.len() {
        match nsm_process_request(nsm_fd, Request::GetRandom) {
            Response::GetRandom { random } if !random.is_empty() => {
                let taken = core::cmp::min(random.len(), buffer.len() - filled);
                buffer[filled..filled + taken].copy_from_slice(&random[..taken]);
                filled += taken;
            }
            _ => {
                nsm_exit(nsm_fd);
                return result::Result::UnknownError;
            }
        }
    }

    nsm_exit(nsm_fd);
    result::Result::Success(())
}
