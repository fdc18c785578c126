//! Byte I/O primitives shared by the container, frame, and block codecs.
//!
//! These are thin wrappers around [`std::io::Read`]/[`std::io::Write`] that
//! turn a short read into a [`ReiaError::TruncatedInput`] instead of
//! returning a partially-filled buffer, and that fix the wire's little-endian
//! byte order in one place.

use std::io::{self, Read, Write};

use crate::error::{ReiaError, Result};

/// Reads exactly 4 bytes and interprets them as a little-endian `u32`.
pub fn read_u32_le<R: Read>(reader: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    read_exact(reader, &mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Writes a `u32` to the sink in little-endian order.
pub fn write_u32_le<W: Write>(writer: &mut W, value: u32) -> Result<()> {
    writer.write_all(&value.to_le_bytes())?;
    Ok(())
}

/// Reads exactly `n` bytes, returning `Ok(vec![])` if the stream was already
/// at EOF (used by the frame loop to detect end-of-stream without treating a
/// clean EOF as an error).
pub fn read_tag<R: Read>(reader: &mut R, n: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; n];
    let mut filled = 0;
    while filled < n {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(read) => filled += read,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ReiaError::Io(e)),
        }
    }
    if filled == 0 {
        return Ok(Vec::new());
    }
    if filled != n {
        return Err(ReiaError::TruncatedInput {
            expected: n,
            actual: filled,
        });
    }
    Ok(buf)
}

/// Writes the given bytes verbatim.
pub fn write_bytes<W: Write>(writer: &mut W, bytes: &[u8]) -> Result<()> {
    writer.write_all(bytes)?;
    Ok(())
}

/// Reads exactly `buf.len()` bytes, treating any short read (including an
/// immediate EOF) as [`ReiaError::TruncatedInput`].
fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(read) => filled += read,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ReiaError::Io(e)),
        }
    }
    if filled != buf.len() {
        return Err(ReiaError::TruncatedInput {
            expected: buf.len(),
            actual: filled,
        });
    }
    Ok(())
}
