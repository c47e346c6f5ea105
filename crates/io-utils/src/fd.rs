//! Common file descriptor-related material
//!
//! All messages on a Cofre byte stream are framed: a 32-bit unsigned
//! big-endian length prefix, followed by that many payload bytes.  No
//! out-of-band framing is trusted.
//!
//! ## Authors
//!
//! The Cofre Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.md` file in the Cofre root directory for
//! information on licensing and copyright.

use crate::error::SocketError;
use byteorder::{BigEndian, ByteOrder};
use std::io::{ErrorKind, Read, Write};

/// The default upper bound on the length of a single framed message.
pub const DEFAULT_MAX_MESSAGE_LENGTH: usize = 1 << 20;

/// Sends a `buffer` of data (by first transmitting an encoded length followed
/// by the data proper) to the file descriptor `fd`.  Refuses to send messages
/// longer than `max_length` bytes.
pub fn send_buffer<T>(mut fd: T, buffer: &[u8], max_length: usize) -> Result<(), SocketError>
where
    T: Write,
{
    let length = buffer.len();

    if length > max_length {
        return Err(SocketError::FrameTooLarge(length, max_length));
    }

    // 1. Encode the data length and send it.
    {
        let mut prefix = [0u8; 4];
        BigEndian::write_u32(&mut prefix, length as u32);
        fd.write_all(&prefix).map_err(stream_error)?;
    }

    // 2. Send the data proper.
    fd.write_all(buffer).map_err(stream_error)?;
    fd.flush().map_err(stream_error)?;

    Ok(())
}

/// Reads a buffer of data from a file descriptor `fd` by first reading a
/// length of data, followed by the data proper.  Messages declaring a length
/// beyond `max_length` are rejected before any payload byte is read.
pub fn receive_buffer<T>(mut fd: T, max_length: usize) -> Result<Vec<u8>, SocketError>
where
    T: Read,
{
    // 1. First read and decode the length of the data proper.
    let length = {
        let mut prefix = [0u8; 4];
        fd.read_exact(&mut prefix).map_err(stream_error)?;
        BigEndian::read_u32(&prefix) as usize
    };

    if length > max_length {
        return Err(SocketError::FrameTooLarge(length, max_length));
    }

    // 2. Next, read the data proper.
    let mut buffer = vec![0u8; length];
    fd.read_exact(&mut buffer).map_err(stream_error)?;

    Ok(buffer)
}

/// Maps low-level stream errors onto the socket error type.  Read deadlines
/// surface as `WouldBlock` or `TimedOut` depending on the platform; both mean
/// the peer did not produce a complete message in time.
fn stream_error(err: std::io::Error) -> SocketError {
    match err.kind() {
        ErrorKind::WouldBlock | ErrorKind::TimedOut => SocketError::Timeout,
        ErrorKind::UnexpectedEof => SocketError::StreamClosed,
        _ => SocketError::IOError(err),
    }
}
