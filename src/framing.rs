//! Exact-bytes I/O helpers and length-prefixed plaintext framing.
//!
//! These operate on anything implementing [`std::io::Read`] /
//! [`std::io::Write`] — the byte-stream abstraction itself (a blocking,
//! reliable, bidirectional connection) is an external collaborator and not
//! part of this crate.

use std::io::{Read, Write};

use crate::error::{Error, Result};

/// Largest plaintext payload a length-prefixed frame may carry.
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Repeatedly writes until every byte of `data` has been accepted by the
/// stream. A zero-length write is treated as fatal (the conventional
/// "stream can no longer make progress" signal).
pub fn send_exact<W: Write>(stream: &mut W, data: &[u8]) -> Result<()> {
    let mut sent = 0;
    while sent < data.len() {
        let n = stream.write(&data[sent..])?;
        if n == 0 {
            return Err(Error::IoClosed);
        }
        sent += n;
    }
    Ok(())
}

/// Repeatedly reads until exactly `buf.len()` bytes have been accumulated.
/// Never returns a short read: a zero-length read is treated as fatal
/// (orderly close or reset).
pub fn recv_exact<R: Read>(stream: &mut R, buf: &mut [u8]) -> Result<()> {
    let mut received = 0;
    while received < buf.len() {
        let n = stream.read(&mut buf[received..])?;
        if n == 0 {
            return Err(Error::IoClosed);
        }
        received += n;
    }
    Ok(())
}

/// Sends `payload` as a length-prefixed plaintext frame: a big-endian
/// 4-byte length followed by the payload itself.
///
/// `payload` must be non-empty and no larger than [`MAX_MESSAGE_SIZE`].
pub fn send_frame<W: Write>(stream: &mut W, payload: &[u8]) -> Result<()> {
    if payload.is_empty() || payload.len() > MAX_MESSAGE_SIZE {
        return Err(Error::BadFrame(format!(
            "refusing to send frame of length {}",
            payload.len()
        )));
    }
    let len = payload.len() as u32;
    send_exact(stream, &len.to_be_bytes())?;
    send_exact(stream, payload)
}

/// Receives a length-prefixed plaintext frame: reads the 4-byte big-endian
/// length, validates it against `(0, MAX_MESSAGE_SIZE]`, then reads exactly
/// that many bytes.
///
/// A zero length or a length exceeding the cap is a fatal framing error.
pub fn recv_frame<R: Read>(stream: &mut R) -> Result<Vec<u8>> {
    let mut len_bytes = [0u8; 4];
    recv_exact(stream, &mut len_bytes)?;
    let len = u32::from_be_bytes(len_bytes) as usize;

    if len == 0 || len > MAX_MESSAGE_SIZE {
        return Err(Error::BadFrame(format!("frame length {} out of bounds", len)));
    }

    let mut payload = vec![0u8; len];
    recv_exact(stream, &mut payload)?;
    Ok(payload)
}
