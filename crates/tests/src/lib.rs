//! End-to-end tests of the key-synchronization protocol
//!
//! The tests themselves live under `tests/`; this crate exists only to
//! anchor them in the workspace.
//!
//! ## Authors
//!
//! The Cofre Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.md` file in the Cofre root directory for
//! information on licensing and copyright.
