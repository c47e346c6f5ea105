//! Rust standard library-specific platform services
//!
//! Implements the `getrandom` platform service using the Rust
//! `getrandom::getrandom()` function.
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

/// Fills a buffer, `buffer`, with random bytes sampled from the random number
/// source provided by the host operating system, as provided by `getrandom`.
pub fn platform_getrandom(buffer: &mut [u8]) -> result::Result<()> {
    if getrandom::getrandom(buffer).is_ok() {
        return result::Result::Success(());
    }
    result::Result::UnknownError
}
