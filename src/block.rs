// Copyright 2025 Dustin McAfee
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Block codec: signed-byte run-length encoding of a single 32x32 tile.
//!
//! A block payload is a sequence of runs over the tile's 1024 pixels in BGR
//! wire order. Each run starts with a signed tag byte:
//! - `tag < 0`: the next 3 bytes are one pixel, repeated `(-tag) + 1` times
//!   (an *identical run*, maximum 129 repeats).
//! - `tag >= 0`: the next `(tag + 1) * 3` bytes are `tag + 1` distinct pixels,
//!   emitted verbatim (a *unique run*, maximum 128 pixels).

use std::io::Read;

use bytes::{BufMut, BytesMut};

use crate::error::{ReiaError, Result};
use crate::io::write_bytes;
use crate::pixels::{Tile, TILE_PIXELS};

/// Maximum number of pixels an identical run can repeat (tag = -128).
const MAX_IDENTICAL_RUN: usize = 129;

/// Maximum number of pixels a unique run can carry (tag = 127).
const MAX_UNIQUE_RUN: usize = 128;

/// Decodes a single block payload from `reader`.
///
/// The returned tile holds the *raw* decoded pixel values — if the caller is
/// working with an inter-frame delta, reconstructing the absolute tile by
/// adding the previous frame's tile is the caller's responsibility (this
/// mirrors the frame codec's reconstruction step, which knows whether a
/// previous frame exists and this function does not).
pub fn decode_block<R: Read>(reader: &mut R) -> Result<Tile> {
    let mut bgr = BytesMut::with_capacity(TILE_PIXELS * 3);
    let mut emitted = 0usize;

    while emitted < TILE_PIXELS {
        let tag = read_tag_byte(reader)?;

        if tag < 0 {
            let mut pixel = [0u8; 3];
            read_exact_pixels(reader, &mut pixel)?;
            let repeat = (-i16::from(tag) + 1) as usize;
            if emitted + repeat > TILE_PIXELS {
                return Err(ReiaError::MalformedBlock {
                    emitted: emitted + repeat,
                });
            }
            for _ in 0..repeat {
                bgr.put_slice(&pixel);
            }
            emitted += repeat;
        } else {
            let count = (tag as usize) + 1;
            if emitted + count > TILE_PIXELS {
                return Err(ReiaError::MalformedBlock {
                    emitted: emitted + count,
                });
            }
            let mut chunk = vec![0u8; count * 3];
            read_exact_pixels(reader, &mut chunk)?;
            bgr.put_slice(&chunk);
            emitted += count;
        }
    }

    Ok(Tile::from_bgr_bytes(&bgr))
}

/// Encodes `tile` as a block payload, writing the RLE run sequence to
/// `writer`. `tile` should already be the value to be put on the wire — the
/// frame codec is responsible for substituting the inter-frame delta before
/// calling this function.
pub fn encode_block<W: std::io::Write>(writer: &mut W, tile: &Tile) -> Result<()> {
    let bgr = tile.to_bgr_bytes();
    debug_assert_eq!(bgr.len(), TILE_PIXELS * 3);

    let pixels: Vec<[u8; 3]> = bgr
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect();
    debug_assert_eq!(pixels.len(), TILE_PIXELS);

    let mut emitted = 0usize;
    let mut unique_buf: Vec<[u8; 3]> = Vec::new();
    let mut i = 0usize;

    while i < pixels.len() {
        let run_len = identical_run_len(&pixels, i);
        if run_len >= 2 {
            flush_unique(writer, &mut unique_buf)?;
            emit_identical_run(writer, pixels[i], run_len)?;
            emitted += run_len;
            i += run_len;
        } else {
            unique_buf.push(pixels[i]);
            emitted += 1;
            i += 1;
        }
    }
    flush_unique(writer, &mut unique_buf)?;

    debug_assert_eq!(emitted, TILE_PIXELS);
    Ok(())
}

/// Length of the maximal run of identical pixels starting at `start`
/// (0 or 1 if the pixel does not repeat).
fn identical_run_len(pixels: &[[u8; 3]], start: usize) -> usize {
    let color = pixels[start];
    let mut len = 1;
    while start + len < pixels.len() && pixels[start + len] == color {
        len += 1;
    }
    len
}

/// Flushes the pending unique-pixel buffer as one or more unique runs of at
/// most [`MAX_UNIQUE_RUN`] pixels each, then clears it.
fn flush_unique<W: std::io::Write>(writer: &mut W, buf: &mut Vec<[u8; 3]>) -> Result<()> {
    for chunk in buf.chunks(MAX_UNIQUE_RUN) {
        let tag = (chunk.len() - 1) as i8;
        write_bytes(writer, &[tag as u8])?;
        for pixel in chunk {
            write_bytes(writer, pixel)?;
        }
    }
    buf.clear();
    Ok(())
}

/// Emits an identical run of `len` copies of `pixel`, split into chunks of at
/// most [`MAX_IDENTICAL_RUN`].
fn emit_identical_run<W: std::io::Write>(
    writer: &mut W,
    pixel: [u8; 3],
    len: usize,
) -> Result<()> {
    let mut remaining = len;
    while remaining > 0 {
        let mut chunk = remaining.min(MAX_IDENTICAL_RUN);
        // A trailing chunk of exactly 1 pixel would need tag `0`, which is a
        // non-negative (unique-run) tag, not a valid identical-run tag.
        // Shave one pixel off this chunk so the remainder becomes 2 instead,
        // e.g. 130 splits as 128+2 rather than 129+1.
        if remaining - chunk == 1 {
            chunk -= 1;
        }
        let tag = -((chunk - 1) as i16) as i8;
        write_bytes(writer, &[tag as u8])?;
        write_bytes(writer, &pixel)?;
        remaining -= chunk;
    }
    Ok(())
}

fn read_tag_byte<R: Read>(reader: &mut R) -> Result<i8> {
    let mut byte = [0u8; 1];
    let n = read_some(reader, &mut byte)?;
    if n == 0 {
        return Err(ReiaError::TruncatedInput {
            expected: 1,
            actual: 0,
        });
    }
    Ok(byte[0] as i8)
}

fn read_exact_pixels<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    let n = read_some(reader, buf)?;
    if n != buf.len() {
        return Err(ReiaError::TruncatedInput {
            expected: buf.len(),
            actual: n,
        });
    }
    Ok(())
}

fn read_some<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(read) => filled += read,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ReiaError::Io(e)),
        }
    }
    Ok(filled)
}
