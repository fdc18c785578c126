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

//! # reia-codec
//!
//! A pure Rust decoder and encoder for The Sims 2's `.reia` video format, the
//! RIFF-based container used for neighborhood introduction cutscenes.
//!
//! `.reia` is a simple format by video-codec standards: a RIFF wrapper around
//! a metadata record and a sequence of frames, each frame a grid of 32x32
//! macroblocks individually run-length encoded and delta-coded against the
//! previous frame. This crate reproduces that format exactly, including its
//! quirks (BGR wire byte order, an informational-only frame count, an
//! asymmetric RLE tag range).
//!
//! ## Decoding
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::BufReader;
//! use reia_codec::ReiaFile;
//!
//! # fn main() -> reia_codec::Result<()> {
//! let reader = BufReader::new(File::open("intro.reia")?);
//! let mut file = ReiaFile::open(reader)?;
//! println!("{}x{} @ {:.2} fps", file.width(), file.height(), file.fps());
//!
//! for frame in file.frames() {
//!     let frame = frame?;
//!     let _ = frame.as_image();
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Encoding
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::BufWriter;
//! use reia_codec::{ReiaEncoder, Frame};
//!
//! # fn main() -> reia_codec::Result<()> {
//! let writer = BufWriter::new(File::create("out.reia")?);
//! let mut encoder = ReiaEncoder::new(writer, 128, 128, 10.0)?;
//! encoder.write_frame(&Frame::blank(128, 128))?;
//! encoder.finish()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod block;
pub mod container;
pub mod error;
pub mod frame;
pub mod io;
pub mod pixels;

// Re-exports
pub use error::{CountMismatch, ReiaError, Result};
pub use pixels::{Frame, Tile};

use std::io::{Read, Seek, Write};

use container::ContainerHeader;

/// A `.reia` file opened for reading.
///
/// Holds the parsed header and the underlying reader; frames are decoded
/// lazily as [`ReiaFile::frames`] is iterated, not all at once.
pub struct ReiaFile<R> {
    reader: R,
    header: ContainerHeader,
}

impl<R: Read> ReiaFile<R> {
    /// Reads and validates the RIFF wrapper and `Reiahead` metadata block,
    /// leaving `reader` positioned at the first `frme` chunk.
    pub fn open(mut reader: R) -> Result<Self> {
        let header = container::read_header(&mut reader)?;
        Ok(ReiaFile { reader, header })
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.header.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.header.height
    }

    /// Frame rate in frames per second.
    #[must_use]
    pub fn fps(&self) -> f64 {
        self.header.fps()
    }

    /// The raw `(numerator, denominator)` FPS pair exactly as read off the
    /// wire. Pass this to [`ReiaEncoder::with_fps_fraction`] to re-encode a
    /// file byte-exactly, since [`ReiaFile::fps`]'s `f64` cannot in general
    /// recover the original pair.
    #[must_use]
    pub fn fps_fraction(&self) -> (u32, u32) {
        (self.header.fps_numerator, self.header.fps_denominator)
    }

    /// The frame count declared in the header. This is informational only;
    /// see [`FrameIter`] for the actual decoded count.
    #[must_use]
    pub fn declared_frame_count(&self) -> u32 {
        self.header.num_frames
    }

    /// Returns a lazy iterator over this file's frames, decoding each one
    /// on demand and reconstructing inter-frame deltas against the
    /// previously yielded frame.
    pub fn frames(&mut self) -> FrameIter<'_, R> {
        FrameIter {
            reader: &mut self.reader,
            width: self.header.width,
            height: self.header.height,
            previous: None,
            decoded_count: 0,
            declared_count: self.header.num_frames,
            finished: false,
        }
    }

    /// Decodes every remaining frame eagerly into a `Vec`, for callers who
    /// don't need streaming decode and would rather hold the whole sequence
    /// in memory.
    pub fn into_frames_vec(mut self) -> Result<Vec<Frame>> {
        self.frames().collect()
    }
}

/// Lazy, borrowing iterator over the frames of a [`ReiaFile`].
///
/// Logs (rather than errors on) a mismatch between the header's declared
/// frame count and the number actually decoded once the stream is
/// exhausted; call [`FrameIter::count_mismatch`] after iteration completes
/// to inspect it programmatically.
pub struct FrameIter<'a, R> {
    reader: &'a mut R,
    width: u32,
    height: u32,
    previous: Option<Frame>,
    decoded_count: u32,
    declared_count: u32,
    finished: bool,
}

impl<'a, R: Read> FrameIter<'a, R> {
    /// Compares the declared and actual frame counts, available once
    /// iteration has run to completion (`next()` has returned `None`).
    #[must_use]
    pub fn count_mismatch(&self) -> Option<CountMismatch> {
        if !self.finished {
            return None;
        }
        container::check_frame_count(self.declared_count, self.decoded_count)
    }
}

impl<'a, R: Read> Iterator for FrameIter<'a, R> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match container::read_next_frame(self.reader, self.width, self.height, self.previous.as_ref()) {
            Ok(Some(frame)) => {
                self.decoded_count += 1;
                self.previous = Some(frame.clone());
                Some(Ok(frame))
            }
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// A builder-style encoder for writing a new `.reia` file.
///
/// Requires a seekable sink because the RIFF container length field is
/// patched in place once the final frame has been written.
pub struct ReiaEncoder<W> {
    writer: W,
    width: u32,
    height: u32,
    previous: Option<Frame>,
    frame_count: u32,
}

impl<W: Write + Seek> ReiaEncoder<W> {
    /// Writes the container header and returns an encoder ready to accept
    /// frames via [`ReiaEncoder::write_frame`].
    ///
    /// `width` and `height` must both be positive multiples of 32.
    pub fn new(mut writer: W, width: u32, height: u32, fps: f64) -> Result<Self> {
        if width == 0 || height == 0 || width % 32 != 0 || height % 32 != 0 {
            return Err(ReiaError::BadDimensions { width, height });
        }
        // num_frames is written as 0 here and patched to the actual count in
        // `finish`, the same buffer-and-patch treatment as the RIFF length.
        container::write_header(&mut writer, width, height, fps, 0)?;
        Ok(ReiaEncoder {
            writer,
            width,
            height,
            previous: None,
            frame_count: 0,
        })
    }

    /// Like [`ReiaEncoder::new`], but writes the given FPS numerator and
    /// denominator verbatim instead of deriving a fraction from a `f64`.
    ///
    /// Use this to re-encode a [`ReiaFile`] byte-exactly: pass through the
    /// `(fps_numerator, fps_denominator)` pair the source file was opened
    /// with (available via a decoded header) instead of round-tripping
    /// through [`ReiaFile::fps`]'s `f64`, which loses precision for any pair
    /// not of the `10/1` or `1_000_000/floor(1_000_000/fps)` shape this
    /// crate's encoder otherwise derives.
    pub fn with_fps_fraction(
        mut writer: W,
        width: u32,
        height: u32,
        fps_numerator: u32,
        fps_denominator: u32,
    ) -> Result<Self> {
        if width == 0 || height == 0 || width % 32 != 0 || height % 32 != 0 {
            return Err(ReiaError::BadDimensions { width, height });
        }
        container::write_header_with_fps_fraction(
            &mut writer,
            width,
            height,
            fps_numerator,
            fps_denominator,
            0,
        )?;
        Ok(ReiaEncoder {
            writer,
            width,
            height,
            previous: None,
            frame_count: 0,
        })
    }

    /// Encodes and appends one frame.
    ///
    /// # Panics
    ///
    /// Panics if `frame`'s dimensions don't match the dimensions given to
    /// [`ReiaEncoder::new`].
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        assert_eq!(frame.width(), self.width);
        assert_eq!(frame.height(), self.height);
        container::write_frame(&mut self.writer, frame, self.previous.as_ref())?;
        self.previous = Some(frame.clone());
        self.frame_count += 1;
        Ok(())
    }

    /// Patches the RIFF container length and `num_frames` fields and returns
    /// the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        container::finish_container(&mut self.writer, self.frame_count)?;
        Ok(self.writer)
    }

    /// Number of frames written so far.
    #[must_use]
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn encode_then_decode_round_trips_header_and_frames() {
        let mut buf = Cursor::new(Vec::new());
        let mut encoder = ReiaEncoder::new(&mut buf, 64, 64, 10.0).unwrap();
        let a = Frame::blank(64, 64);
        let mut b = Frame::blank(64, 64);
        b.paste_tile(0, 0, &Tile::from_rgb_bytes(&vec![9u8; pixels::TILE_PIXELS * 3]));
        encoder.write_frame(&a).unwrap();
        encoder.write_frame(&b).unwrap();
        encoder.finish().unwrap();

        buf.set_position(0);
        let mut file = ReiaFile::open(buf).unwrap();
        assert_eq!(file.width(), 64);
        assert_eq!(file.height(), 64);
        assert_eq!(file.fps(), 10.0);

        let frames: Vec<Frame> = file.frames().collect::<Result<_>>().unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], a);
        assert_eq!(frames[1], b);
    }

    #[test]
    fn frame_count_mismatch_is_reported_not_fatal() {
        let mut buf = Cursor::new(Vec::new());
        container::write_header(&mut buf, 32, 32, 10.0, 5).unwrap();
        container::write_frame(&mut buf, &Frame::blank(32, 32), None).unwrap();
        buf.set_position(0);

        let mut file = ReiaFile::open(buf).unwrap();
        assert_eq!(file.declared_frame_count(), 5);
        let mut iter = file.frames();
        assert!(iter.next().unwrap().is_ok());
        assert!(iter.next().is_none());
        let mismatch = iter.count_mismatch().unwrap();
        assert_eq!(mismatch.declared, 5);
        assert_eq!(mismatch.actual, 1);
    }

    #[test]
    fn encoder_rejects_non_tile_aligned_dimensions() {
        let buf = Cursor::new(Vec::new());
        let err = ReiaEncoder::new(buf, 100, 64, 10.0).unwrap_err();
        assert!(matches!(err, ReiaError::BadDimensions { width: 100, height: 64 }));
    }
}
