//! IO-related functionality
//!
//! This is input/output-related functionality that is useful in many places
//! across the Cofre codebase.  The material consists of the framed message
//! reader and writer used on every inter-enclave byte stream, and the
//! associated error type.
//!
//! ## Authors
//!
//! The Cofre Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.md` file in the Cofre root directory for
//! information on licensing and copyright.

/// IO-related error type.
pub mod error;
/// Framed message material.
pub mod fd;
