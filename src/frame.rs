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

//! Frame codec: a frame is a grid of 32x32 tiles, each either reused
//! verbatim from the previous frame or carried as a (possibly delta-coded)
//! block payload.

use std::io::{Read, Write};

use log::trace;

use crate::block::{decode_block, encode_block};
use crate::error::{ReiaError, Result};
use crate::pixels::{Frame, Tile, TILE_SIZE};

/// Byte written in place of a block payload when a tile is unchanged from
/// the previous frame.
const REUSE_MARKER: u8 = 0x00;

/// Any non-zero marker byte means "a block payload follows". The encoder
/// always writes this canonical value.
const BLOCK_MARKER: u8 = 0x01;

/// Decodes one frame of `width x height` pixels from `reader`.
///
/// `previous` is `None` for the first frame in a file; a reuse marker with
/// no previous frame is a hard [`ReiaError::OrphanReuse`].
pub fn decode_frame<R: Read>(
    reader: &mut R,
    width: u32,
    height: u32,
    previous: Option<&Frame>,
) -> Result<Frame> {
    let mut frame = Frame::blank(width, height);

    for y in (0..height).step_by(TILE_SIZE as usize) {
        for x in (0..width).step_by(TILE_SIZE as usize) {
            let mut marker = [0u8; 1];
            read_marker(reader, &mut marker)?;

            let tile = if marker[0] == REUSE_MARKER {
                match previous {
                    Some(prev) => prev.tile_at(x, y),
                    None => return Err(ReiaError::OrphanReuse { x, y }),
                }
            } else {
                let decoded = decode_block(reader)?;
                match previous {
                    Some(prev) => decoded.modular_add(&prev.tile_at(x, y)),
                    None => decoded,
                }
            };

            frame.paste_tile(x, y, &tile);
        }
    }

    Ok(frame)
}

/// Encodes `frame` as a frame payload, writing it to `writer`. `previous` is
/// `None` for the first frame in a file, in which case every tile is
/// encoded as an absolute block payload (no reuse markers, no deltas).
pub fn encode_frame<W: Write>(
    writer: &mut W,
    frame: &Frame,
    previous: Option<&Frame>,
) -> Result<()> {
    let width = frame.width();
    let height = frame.height();

    for y in (0..height).step_by(TILE_SIZE as usize) {
        for x in (0..width).step_by(TILE_SIZE as usize) {
            let current = frame.tile_at(x, y);
            let prev_tile = previous.map(|p| p.tile_at(x, y));

            if let Some(prev) = &prev_tile {
                if *prev == current {
                    writer.write_all(&[REUSE_MARKER])?;
                    continue;
                }
            }

            writer.write_all(&[BLOCK_MARKER])?;
            let wire_tile = match &prev_tile {
                Some(prev) => current.modular_sub(prev),
                None => current,
            };
            encode_block(writer, &wire_tile)?;
        }
    }

    trace!("encoded frame {}x{}", width, height);
    Ok(())
}

fn read_marker<R: Read>(reader: &mut R, buf: &mut [u8; 1]) -> Result<()> {
    let mut filled = 0;
    while filled < 1 {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ReiaError::Io(e)),
        }
    }
    if filled == 0 {
        return Err(ReiaError::TruncatedInput {
            expected: 1,
            actual: 0,
        });
    }
    Ok(())
}

/// Reuse every tile in `prev` to build `next`'s shared tiles in a freshly
/// allocated frame, used when encoding to materialize a reconstructed
/// "previous" without re-decoding; not part of the wire codec itself but a
/// convenience for tests comparing encode/decode symmetry.
#[cfg(test)]
fn identical_frame(base: &Frame) -> Frame {
    let mut out = Frame::blank(base.width(), base.height());
    for y in (0..base.height()).step_by(TILE_SIZE as usize) {
        for x in (0..base.width()).step_by(TILE_SIZE as usize) {
            out.paste_tile(x, y, &base.tile_at(x, y));
        }
    }
    out
}
