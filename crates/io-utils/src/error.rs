//! IO-related errors
//!
//! ## Authors
//!
//! The Cofre Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.md` file in the Cofre root directory for
//! information on licensing and copyright.

use err_derive::Error;

////////////////////////////////////////////////////////////////////////////////
// Socket-related error types.
////////////////////////////////////////////////////////////////////////////////

/// An enumerated type for Cofre-specific IO errors.
#[derive(Debug, Error)]
pub enum SocketError {
    /// A message declared a length beyond the configured frame limit.
    #[error(
        display = "SocketError: message of {} bytes exceeds the frame limit of {} bytes.",
        _0,
        _1
    )]
    FrameTooLarge(usize, usize),
    /// The peer closed the stream before a complete message was read.
    #[error(display = "SocketError: the peer closed the stream mid-message.")]
    StreamClosed,
    /// No complete message arrived within the stream's read deadline.
    #[error(display = "SocketError: timed out waiting for the peer.")]
    Timeout,
    /// Any other error returned by the underlying stream.
    #[error(display = "SocketError: an I/O error occurred: {:?}.", _0)]
    IOError(#[error(source)] std::io::Error),
}
