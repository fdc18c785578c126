//! Error types for the `.reia` codec.

use std::io;
use thiserror::Error;

/// Result type for `.reia` codec operations.
pub type Result<T> = std::result::Result<T, ReiaError>;

/// Errors that can occur while decoding or encoding a `.reia` stream.
#[derive(Debug, Error)]
pub enum ReiaError {
    /// I/O error occurred while reading from or writing to the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A required ASCII tag did not match the expected value.
    #[error("bad magic: expected {expected:?}, got {actual:?}")]
    BadMagic {
        /// The tag bytes that should have been present.
        expected: Vec<u8>,
        /// The tag bytes that were actually read.
        actual: Vec<u8>,
    },

    /// The `Reiahead` metadata size field was not 24.
    #[error("bad Reiahead metadata size: expected 24, got {actual}")]
    BadMetadataSize {
        /// The size value actually read from the stream.
        actual: u32,
    },

    /// The undocumented `unknown` field at offset 20 of the `Reiahead` record
    /// was not `1`. Its meaning is unclear (see `DESIGN.md`); this crate
    /// treats any other value as an error until evidence suggests otherwise.
    #[error("unexpected Reiahead unknown-field value: expected {expected}, got {actual}")]
    UnknownFieldMismatch {
        /// The value this crate asserts the field must hold.
        expected: u32,
        /// The value actually read from the stream.
        actual: u32,
    },

    /// Width or height was not a positive multiple of 32.
    #[error("bad dimensions: {width}x{height} (both must be positive multiples of 32)")]
    BadDimensions {
        /// The width read or supplied.
        width: u32,
        /// The height read or supplied.
        height: u32,
    },

    /// The FPS denominator was zero.
    #[error("bad fps: denominator is zero (numerator {numerator})")]
    BadFps {
        /// The numerator that accompanied the invalid denominator.
        numerator: u32,
    },

    /// The stream ended before a complete integer, tag, or pixel could be read.
    #[error("truncated input: expected {expected} bytes, got {actual}")]
    TruncatedInput {
        /// Number of bytes the read was expecting.
        expected: usize,
        /// Number of bytes actually available.
        actual: usize,
    },

    /// RLE decoding overran the 1024-pixel target for a block.
    #[error("malformed block: emitted {emitted} pixels, expected exactly 1024")]
    MalformedBlock {
        /// The number of pixels actually emitted before the overrun was detected.
        emitted: usize,
    },

    /// A reuse marker (`0x00`) appeared in the first frame of a file, which has no
    /// previous frame to reuse from.
    #[error("orphan reuse marker: tile ({x}, {y}) requested reuse with no previous frame")]
    OrphanReuse {
        /// X coordinate of the tile that requested reuse.
        x: u32,
        /// Y coordinate of the tile that requested reuse.
        y: u32,
    },
}

/// Non-fatal discrepancy between the header's declared frame count and the
/// number of frames actually found while iterating.
///
/// This is deliberately not part of [`ReiaError`]: `num_frames` is treated as
/// informational, and the frame loop terminates on EOF rather than on count.
/// Callers that want to treat a mismatch as fatal can check
/// [`crate::FrameIter::count_mismatch`] after exhausting the frame iterator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountMismatch {
    /// The `num_frames` value declared in the container header.
    pub declared: u32,
    /// The number of frames actually yielded before EOF.
    pub actual: u32,
}
