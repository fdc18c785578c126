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

//! Container codec: the RIFF wrapper, `Reiahead` metadata record, and the
//! `frme` chunk sequence.
//!
//! This module owns the on-disk framing; block- and frame-level pixel
//! semantics live in [`crate::block`] and [`crate::frame`].

use std::io::{Read, Seek, SeekFrom, Write};

use bytes::{BufMut, BytesMut};
use log::{debug, warn};

use crate::error::{ReiaError, Result};
use crate::frame::{decode_frame, encode_frame};
use crate::io::{read_tag, read_u32_le, write_bytes, write_u32_le};
use crate::pixels::Frame;

const RIFF_TAG: &[u8] = b"RIFF";
const REIAHEAD_TAG: &[u8] = b"Reiahead";
const FRME_TAG: &[u8] = b"frme";
const REIAHEAD_METADATA_SIZE: u32 = 24;
const REIAHEAD_UNKNOWN_FIELD: u32 = 1;

/// Header metadata read off (or to be written to) a `.reia` container,
/// everything preceding the frame chunk sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    /// Width in pixels; always a multiple of 32.
    pub width: u32,
    /// Height in pixels; always a multiple of 32.
    pub height: u32,
    /// Frame rate numerator.
    pub fps_numerator: u32,
    /// Frame rate denominator.
    pub fps_denominator: u32,
    /// Declared frame count. Informational only: the frame loop terminates on
    /// end-of-stream, not on this count.
    pub num_frames: u32,
}

impl ContainerHeader {
    /// Frame rate as a real number (`numerator / denominator`).
    #[must_use]
    pub fn fps(&self) -> f64 {
        f64::from(self.fps_numerator) / f64::from(self.fps_denominator)
    }

    fn validate_dimensions(&self) -> Result<()> {
        if self.width == 0
            || self.height == 0
            || self.width % 32 != 0
            || self.height % 32 != 0
        {
            return Err(ReiaError::BadDimensions {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// Reads and validates the container header (RIFF wrapper through
/// `num_frames`), leaving the reader positioned at the start of the frame
/// chunk sequence.
pub fn read_header<R: Read>(reader: &mut R) -> Result<ContainerHeader> {
    expect_tag(reader, RIFF_TAG)?;
    let _file_size = read_u32_le(reader)?; // informational, not validated against the actual stream length

    expect_tag(reader, REIAHEAD_TAG)?;

    let meta_size = read_u32_le(reader)?;
    if meta_size != REIAHEAD_METADATA_SIZE {
        return Err(ReiaError::BadMetadataSize { actual: meta_size });
    }

    let unknown = read_u32_le(reader)?;
    if unknown != REIAHEAD_UNKNOWN_FIELD {
        return Err(ReiaError::UnknownFieldMismatch {
            expected: REIAHEAD_UNKNOWN_FIELD,
            actual: unknown,
        });
    }

    let width = read_u32_le(reader)?;
    let height = read_u32_le(reader)?;
    let fps_numerator = read_u32_le(reader)?;
    let fps_denominator = read_u32_le(reader)?;
    if fps_denominator == 0 {
        return Err(ReiaError::BadFps {
            numerator: fps_numerator,
        });
    }
    let num_frames = read_u32_le(reader)?;

    let header = ContainerHeader {
        width,
        height,
        fps_numerator,
        fps_denominator,
        num_frames,
    };
    header.validate_dimensions()?;

    debug!(
        "reia header: {}x{} @ {:.3} fps, {} declared frames",
        header.width,
        header.height,
        header.fps(),
        header.num_frames
    );

    Ok(header)
}

/// Reads the next `frme` chunk from `reader` and decodes it, reconstructing
/// against `previous` when present. Returns `Ok(None)` at a clean
/// end-of-stream (no more chunks).
pub fn read_next_frame<R: Read>(
    reader: &mut R,
    width: u32,
    height: u32,
    previous: Option<&Frame>,
) -> Result<Option<Frame>> {
    let tag = read_tag(reader, 4)?;
    if tag.is_empty() {
        return Ok(None);
    }
    if tag != FRME_TAG {
        return Err(ReiaError::BadMagic {
            expected: FRME_TAG.to_vec(),
            actual: tag,
        });
    }

    let frame_size = read_u32_le(reader)?;
    let frame = decode_frame(reader, width, height, previous)?;

    // The frame codec consumes exactly `frame_size` bytes of payload by
    // construction (the tile grid is fully determined by width/height), so
    // there is nothing left to skip; only the trailing pad byte remains.
    if frame_size % 2 != 0 {
        let pad = read_tag(reader, 1)?;
        debug_assert_eq!(pad.len(), 1, "odd-length frame chunk must carry one pad byte");
    }

    Ok(Some(frame))
}

fn expect_tag<R: Read>(reader: &mut R, expected: &[u8]) -> Result<()> {
    let actual = read_tag(reader, expected.len())?;
    if actual != expected {
        return Err(ReiaError::BadMagic {
            expected: expected.to_vec(),
            actual,
        });
    }
    Ok(())
}

/// Writes the container header (everything up to and including `num_frames`)
/// with a placeholder RIFF length, to be patched by [`finish_container`].
pub fn write_header<W: Write>(
    writer: &mut W,
    width: u32,
    height: u32,
    fps: f64,
    num_frames: u32,
) -> Result<()> {
    let (fps_numerator, fps_denominator) = choose_fps_fraction(fps);
    write_header_with_fps_fraction(
        writer,
        width,
        height,
        fps_numerator,
        fps_denominator,
        num_frames,
    )
}

/// Writes the container header using an explicit FPS numerator/denominator
/// pair rather than deriving one from a floating-point FPS value.
///
/// This is the path that keeps re-encoding an unmodified [`crate::Frame`]
/// sequence byte-exact: [`write_header`] always recomputes a fresh
/// `(numerator, denominator)` pair via [`choose_fps_fraction`], which only
/// reproduces the original pair for inputs that pair actually produces (the
/// `10/1` special case, or `1_000_000/floor(1_000_000/fps)`). A file whose
/// original pair was written by some other means — e.g. a real NTSC
/// `30000/1001` — would not round-trip through the `f64` path; this
/// function writes the caller-supplied pair verbatim instead.
pub fn write_header_with_fps_fraction<W: Write>(
    writer: &mut W,
    width: u32,
    height: u32,
    fps_numerator: u32,
    fps_denominator: u32,
    num_frames: u32,
) -> Result<()> {
    if fps_denominator == 0 {
        return Err(ReiaError::BadFps {
            numerator: fps_numerator,
        });
    }

    write_bytes(writer, RIFF_TAG)?;
    write_u32_le(writer, 0)?; // placeholder container length, patched at finish

    write_bytes(writer, REIAHEAD_TAG)?;
    write_u32_le(writer, REIAHEAD_METADATA_SIZE)?;
    write_u32_le(writer, REIAHEAD_UNKNOWN_FIELD)?;
    write_u32_le(writer, width)?;
    write_u32_le(writer, height)?;

    write_u32_le(writer, fps_numerator)?;
    write_u32_le(writer, fps_denominator)?;

    write_u32_le(writer, num_frames)?;
    Ok(())
}

/// Encodes `frame` as a `frme` chunk, writing it to `writer`.
pub fn write_frame<W: Write>(
    writer: &mut W,
    frame: &Frame,
    previous: Option<&Frame>,
) -> Result<()> {
    let mut payload = BytesMut::new().writer();
    encode_frame(&mut payload, frame, previous)?;
    let payload = payload.into_inner();

    write_bytes(writer, FRME_TAG)?;
    write_u32_le(writer, payload.len() as u32)?;
    write_bytes(writer, &payload)?;
    if payload.len() % 2 != 0 {
        write_bytes(writer, &[0x00])?;
    }
    Ok(())
}

/// Byte offset of the `num_frames` field within the container header.
const NUM_FRAMES_OFFSET: u64 = 40;

/// Seeks back and patches the RIFF container length field (offset 4) with
/// `total_bytes_written - 8` (invariant 4) and the `num_frames` field
/// (offset 40) with the actual number of frames written, then seeks back to
/// the end. A streaming encoder does not know its final frame count until
/// the caller stops calling `write_frame`, so both fields are buffered and
/// patched here rather than required up front.
pub fn finish_container<W: Write + Seek>(writer: &mut W, frame_count: u32) -> Result<()> {
    let end = writer.stream_position()?;
    writer.seek(SeekFrom::Start(4))?;
    write_u32_le(writer, (end - 8) as u32)?;
    writer.seek(SeekFrom::Start(NUM_FRAMES_OFFSET))?;
    write_u32_le(writer, frame_count)?;
    writer.seek(SeekFrom::Start(end))?;
    Ok(())
}

/// Chooses the FPS numerator/denominator pair an encoder writes to the wire
/// the exact `(10, 1)` pair for the common 10fps case (matching the game's
/// own files byte-for-byte), otherwise a `1_000_000`-based fraction.
fn choose_fps_fraction(fps: f64) -> (u32, u32) {
    if fps == 10.0 {
        return (10, 1);
    }
    let numerator = 1_000_000u32;
    let denominator = (f64::from(numerator) / fps).floor() as u32;
    (numerator, denominator)
}

/// Logs (but does not error on) a mismatch between the header's declared
/// frame count and the number of frames actually decoded. `num_frames` is
/// treated as informational rather than authoritative.
pub fn check_frame_count(declared: u32, actual: u32) -> Option<crate::error::CountMismatch> {
    if declared != actual {
        warn!(
            "num_frames mismatch: header declared {declared}, stream yielded {actual} frames"
        );
        Some(crate::error::CountMismatch { declared, actual })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn pack_u32(value: u32) -> [u8; 4] {
        value.to_le_bytes()
    }

    #[test]
    fn wrong_file_magic_errors() {
        let mut cursor = Cursor::new(b"hello world".to_vec());
        let err = read_header(&mut cursor).unwrap_err();
        match err {
            ReiaError::BadMagic { expected, .. } => assert_eq!(expected, RIFF_TAG),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn bad_inner_magic_errors() {
        let mut bytes = Vec::new();
        bytes.extend(RIFF_TAG);
        bytes.extend(pack_u32(1));
        bytes.extend(b"NotReiahead");
        let mut cursor = Cursor::new(bytes);
        let err = read_header(&mut cursor).unwrap_err();
        match err {
            ReiaError::BadMagic { expected, .. } => assert_eq!(expected, REIAHEAD_TAG),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn wrong_metadata_size_errors() {
        let mut bytes = Vec::new();
        bytes.extend(RIFF_TAG);
        bytes.extend(pack_u32(1));
        bytes.extend(REIAHEAD_TAG);
        bytes.extend(pack_u32(23));
        let mut cursor = Cursor::new(bytes);
        let err = read_header(&mut cursor).unwrap_err();
        assert!(matches!(err, ReiaError::BadMetadataSize { actual: 23 }));
    }

    #[test]
    fn wrong_unknown_field_errors() {
        let mut bytes = Vec::new();
        bytes.extend(RIFF_TAG);
        bytes.extend(pack_u32(1));
        bytes.extend(REIAHEAD_TAG);
        bytes.extend(pack_u32(24));
        bytes.extend(pack_u32(2)); // must be exactly 1
        let mut cursor = Cursor::new(bytes);
        let err = read_header(&mut cursor).unwrap_err();
        assert!(matches!(
            err,
            ReiaError::UnknownFieldMismatch {
                expected: 1,
                actual: 2
            }
        ));
    }

    #[test]
    fn known_good_header_parses() {
        let mut bytes = Vec::new();
        bytes.extend(RIFF_TAG);
        bytes.extend(pack_u32(0x005D_ACF2));
        bytes.extend(REIAHEAD_TAG);
        bytes.extend(pack_u32(24));
        bytes.extend(pack_u32(1));
        bytes.extend(pack_u32(128));
        bytes.extend(pack_u32(128));
        bytes.extend(pack_u32(10));
        bytes.extend(pack_u32(1));
        bytes.extend(pack_u32(0));
        let mut cursor = Cursor::new(bytes);
        let header = read_header(&mut cursor).unwrap();
        assert_eq!(header.width, 128);
        assert_eq!(header.height, 128);
        assert_eq!(header.fps(), 10.0);
        assert_eq!(header.num_frames, 0);

        let next = read_next_frame(&mut cursor, 128, 128, None).unwrap();
        assert!(next.is_none());
    }

    #[test]
    fn fps_fraction_special_cases_ten() {
        assert_eq!(choose_fps_fraction(10.0), (10, 1));
    }

    #[test]
    fn fps_fraction_general_case_round_trips_within_precision() {
        let (num, den) = choose_fps_fraction(24.0);
        assert_eq!(num, 1_000_000);
        let recovered = f64::from(num) / f64::from(den);
        assert!((recovered - 24.0).abs() < 0.001);
    }
}
