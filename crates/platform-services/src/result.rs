//! Error codes for platform services
//!
//! A platform service can end in one of three ways:
//!
//! 1. *Success*, in which the platform service successfully executed,
//! 2. *Unavailable*, in which the service in question is not available on
//!    the current platform,
//! 3. *UnknownError*: the service is available, but there was some error
//!    raised during service execution.
//!
//! ## Authors
//!
//! The Cofre Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.md` file in the Cofre root directory for
//! information on licensing and copyright.

/// Error codes describing the result of a platform service function.
#[derive(Debug)]
pub enum Result<T> {
    /// The operation completed successfully.
    Success(T),
    /// The operation is unavailable on this platform.
    Unavailable,
    /// An unknown error occurred during the execution of the operation.
    UnknownError,
}
