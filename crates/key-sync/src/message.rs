//! Wire message bodies
//!
//! Exactly three messages make up a full handshake.  Each travels inside a
//! length-prefixed frame (see `io-utils`); the bodies themselves are
//! serialized with bincode, whose encoding is deterministic: struct fields
//! in declaration order, byte strings behind a fixed-width length header.
//! Changing a field, or the order of fields, is a wire-format break.
//!
//! ## Authors
//!
//! The Cofre Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.md` file in the Cofre root directory for
//! information on licensing and copyright.

use serde::{Deserialize, Serialize};
use serde_bytes::ByteBuf;

/// First message, leader to follower: the leader's challenge.  Encodes as
/// exactly 32 bytes on the wire.
#[derive(Debug, Serialize, Deserialize)]
pub struct Message1 {
    pub leader_nonce: [u8; 32],
}

/// Second message, follower to leader: an attestation document binding
/// `nonce = leader_nonce`, `public_key = ephemeral_pub` and
/// `user_data = follower_nonce`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Message2 {
    pub attestation_document: ByteBuf,
}

/// Third message, leader to follower: the sealed secret state, then an
/// attestation document binding `nonce = follower_nonce` and
/// `user_data = digest(envelope)`.  The envelope field precedes the
/// attestation field; the order of this struct's fields is part of the wire
/// contract.
#[derive(Debug, Serialize, Deserialize)]
pub struct Message3 {
    pub envelope: ByteBuf,
    pub attestation_document: ByteBuf,
}
