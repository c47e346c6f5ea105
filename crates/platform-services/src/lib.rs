//! Platform services
//!
//! A thin abstraction-layer over trusted services provided by individual
//! trusted execution environments and the Rust standard library (for tests
//! and unenclaved deployments).
//!
//! Services provided by this library:
//! - A random number source taken from a platform-specific trusted source of
//!   entropy (if within a TEE).  Note that for `std` targets the random
//!   source is assumed to be the random number generator of the host
//!   operating system.
//!
//! ## Authors
//!
//! The Cofre Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.md` file in the Cofre root directory for
//! information on licensing and copyright.

use cfg_if::cfg_if;

pub mod result;

cfg_if! {
    if #[cfg(feature = "nitro")] {
        #[path = "nitro_platform_services.rs"]
        mod imp;
    } else if #[cfg(feature = "std")] {
        #[path = "std_platform_services.rs"]
        mod imp;
    } else {
        compile_error!("Unrecognised feature: platforms supported are Nitro and std.");
    }
}

////////////////////////////////////////////////////////////////////////////////
// Platform services
////////////////////////////////////////////////////////////////////////////////

/// Fills a `buffer` with random bytes taken from a trusted entropy source.
///
/// Returns:
///     - `result::Result::Success` if the random number generation
///       successfully completed.  In which case, `buffer` is correctly filled
///       with random bytes to completion.
///     - `result::Result::Unavailable` if a trusted source of entropy is not
///       available on this platform.  In which case, the contents of `buffer`
///       can be trusted not to have been modified by this function.
///     - `result::Result::UnknownError` if a runtime error occurred during
///       generation of the random numbers.  In which case, the contents of
///       `buffer` are undefined.
pub fn getrandom(buffer: &mut [u8]) -> result::Result<()> {
    if buffer.is_empty() {
        result::Result::Success(())
    } else {
        imp::platform_getrandom(buffer)
    }
}
