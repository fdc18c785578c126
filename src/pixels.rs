//! Minimal RGB raster type satisfying the "image utility layer" interface
//! that the block and frame codecs are written against.
//!
//! This crate does not implement a general-purpose image library — it wraps
//! [`image::RgbImage`] and exposes exactly the operations the codec needs:
//! blank construction, cropping/pasting a tile, modular add/subtract, an
//! equality test, and raw byte extraction in either RGB or BGR order.

use image::{ImageBuffer, Rgb, RgbImage};

/// Side length in pixels of a macroblock tile.
pub const TILE_SIZE: u32 = 32;

/// Number of pixels in one tile (`TILE_SIZE * TILE_SIZE`).
pub const TILE_PIXELS: usize = (TILE_SIZE * TILE_SIZE) as usize;

/// One 32x32 RGB macroblock.
///
/// A transient value produced and consumed during block/frame codec
/// operations; it never outlives a single decode or encode step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile(RgbImage);

impl Tile {
    /// Builds a tile from exactly `TILE_PIXELS * 3` bytes in RGB order
    /// (R, G, B per pixel, row-major, no padding).
    ///
    /// # Panics
    ///
    /// Panics if `rgb_bytes.len() != TILE_PIXELS * 3`. Callers within this
    /// crate always supply a buffer of exactly this size; this is an
    /// internal invariant, not a user-facing validation boundary.
    #[must_use]
    pub fn from_rgb_bytes(rgb_bytes: &[u8]) -> Self {
        assert_eq!(rgb_bytes.len(), TILE_PIXELS * 3);
        let buf = ImageBuffer::from_raw(TILE_SIZE, TILE_SIZE, rgb_bytes.to_vec())
            .expect("rgb_bytes is exactly TILE_SIZE x TILE_SIZE x 3 bytes");
        Tile(buf)
    }

    /// A tile filled entirely with zero (black) pixels, used as padding fill
    /// for tolerant-mode edge tiles.
    #[must_use]
    pub fn zeroed() -> Self {
        Tile(RgbImage::new(TILE_SIZE, TILE_SIZE))
    }

    /// Raw bytes of this tile in RGB order (R, G, B per pixel, row-major).
    #[must_use]
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.0.as_raw().clone()
    }

    /// Raw bytes of this tile in BGR order — the wire byte order used inside
    /// RLE-encoded block payloads.
    #[must_use]
    pub fn to_bgr_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(TILE_PIXELS * 3);
        for px in self.0.pixels() {
            out.push(px[2]);
            out.push(px[1]);
            out.push(px[0]);
        }
        out
    }

    /// Builds a tile from `TILE_PIXELS * 3` bytes in BGR order, swapping each
    /// pixel back to RGB for in-memory storage.
    ///
    /// # Panics
    ///
    /// Panics if `bgr_bytes.len() != TILE_PIXELS * 3`.
    #[must_use]
    pub fn from_bgr_bytes(bgr_bytes: &[u8]) -> Self {
        assert_eq!(bgr_bytes.len(), TILE_PIXELS * 3);
        let mut rgb = vec![0u8; TILE_PIXELS * 3];
        for (dst, src) in rgb.chunks_exact_mut(3).zip(bgr_bytes.chunks_exact(3)) {
            dst[0] = src[2];
            dst[1] = src[1];
            dst[2] = src[0];
        }
        Tile::from_rgb_bytes(&rgb)
    }

    /// Per-channel modular difference `self - other (mod 256)`, the inter-frame
    /// delta encoded on the wire.
    #[must_use]
    pub fn modular_sub(&self, other: &Tile) -> Tile {
        self.modular_op(other, u8::wrapping_sub)
    }

    /// Per-channel modular sum `self + other (mod 256)`, used to reconstruct
    /// an absolute tile from a decoded delta plus the previous frame's tile.
    #[must_use]
    pub fn modular_add(&self, other: &Tile) -> Tile {
        self.modular_op(other, u8::wrapping_add)
    }

    fn modular_op(&self, other: &Tile, op: fn(u8, u8) -> u8) -> Tile {
        let mut out = RgbImage::new(TILE_SIZE, TILE_SIZE);
        for (dst, (a, b)) in out.pixels_mut().zip(self.0.pixels().zip(other.0.pixels())) {
            *dst = Rgb([op(a[0], b[0]), op(a[1], b[1]), op(a[2], b[2])]);
        }
        out.into()
    }
}

impl From<RgbImage> for Tile {
    fn from(image: RgbImage) -> Self {
        assert_eq!(image.width(), TILE_SIZE);
        assert_eq!(image.height(), TILE_SIZE);
        Tile(image)
    }
}

/// A full raster frame of `width x height` 24-bit RGB pixels, no alpha.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    image: RgbImage,
}

impl Frame {
    /// Allocates a blank (all-black) frame of the given dimensions.
    #[must_use]
    pub fn blank(width: u32, height: u32) -> Self {
        Frame {
            image: RgbImage::new(width, height),
        }
    }

    /// Wraps an existing [`RgbImage`] as a frame.
    #[must_use]
    pub fn from_image(image: RgbImage) -> Self {
        Frame { image }
    }

    /// Borrows the underlying [`RgbImage`].
    #[must_use]
    pub fn as_image(&self) -> &RgbImage {
        &self.image
    }

    /// Consumes the frame, returning the underlying [`RgbImage`].
    #[must_use]
    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Crops a `TILE_SIZE x TILE_SIZE` tile out of the frame at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the requested tile does not fully fit inside the frame.
    #[must_use]
    pub fn tile_at(&self, x: u32, y: u32) -> Tile {
        assert!(x + TILE_SIZE <= self.width());
        assert!(y + TILE_SIZE <= self.height());
        let mut out = RgbImage::new(TILE_SIZE, TILE_SIZE);
        for dy in 0..TILE_SIZE {
            for dx in 0..TILE_SIZE {
                out.put_pixel(dx, dy, *self.image.get_pixel(x + dx, y + dy));
            }
        }
        Tile(out)
    }

    /// Pastes a `TILE_SIZE x TILE_SIZE` tile into the frame at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the tile does not fully fit inside the frame at this offset.
    pub fn paste_tile(&mut self, x: u32, y: u32, tile: &Tile) {
        assert!(x + TILE_SIZE <= self.width());
        assert!(y + TILE_SIZE <= self.height());
        for dy in 0..TILE_SIZE {
            for dx in 0..TILE_SIZE {
                self.image
                    .put_pixel(x + dx, y + dy, *tile.0.get_pixel(dx, dy));
            }
        }
    }

    /// Pads this frame's bottom/right edge tiles with zero-filled pixels so
    /// that both dimensions become multiples of [`TILE_SIZE`] ("tolerant
    /// mode" encoding of non-conformant inputs).
    ///
    /// Returns `self` unchanged if the dimensions are already tile-aligned.
    #[must_use]
    pub fn pad_to_tile_grid(&self) -> Frame {
        let padded_w = self.width().div_ceil(TILE_SIZE) * TILE_SIZE;
        let padded_h = self.height().div_ceil(TILE_SIZE) * TILE_SIZE;
        if padded_w == self.width() && padded_h == self.height() {
            return self.clone();
        }
        let mut out = RgbImage::new(padded_w, padded_h);
        for y in 0..self.height() {
            for x in 0..self.width() {
                out.put_pixel(x, y, *self.image.get_pixel(x, y));
            }
        }
        Frame { image: out }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_rgb_bgr_round_trip() {
        let mut bytes = vec![0u8; TILE_PIXELS * 3];
        for (i, chunk) in bytes.chunks_exact_mut(3).enumerate() {
            chunk[0] = (i % 251) as u8;
            chunk[1] = (i % 239) as u8;
            chunk[2] = (i % 197) as u8;
        }
        let tile = Tile::from_rgb_bytes(&bytes);
        let bgr = tile.to_bgr_bytes();
        let back = Tile::from_bgr_bytes(&bgr);
        assert_eq!(tile, back);
    }

    #[test]
    fn modular_add_sub_round_trip() {
        let a = Tile::from_rgb_bytes(&vec![200u8; TILE_PIXELS * 3]);
        let b = Tile::from_rgb_bytes(&vec![100u8; TILE_PIXELS * 3]);
        let diff = a.modular_sub(&b);
        let restored = diff.modular_add(&b);
        assert_eq!(a, restored);
    }

    #[test]
    fn modular_sub_wraps() {
        let a = Tile::from_rgb_bytes(&vec![10u8; TILE_PIXELS * 3]);
        let b = Tile::from_rgb_bytes(&vec![250u8; TILE_PIXELS * 3]);
        let diff = a.modular_sub(&b);
        assert_eq!(diff.to_rgb_bytes()[0], 10u8.wrapping_sub(250));
    }

    #[test]
    fn crop_paste_round_trip() {
        let mut frame = Frame::blank(64, 64);
        let tile = Tile::from_rgb_bytes(&vec![42u8; TILE_PIXELS * 3]);
        frame.paste_tile(32, 0, &tile);
        assert_eq!(frame.tile_at(32, 0), tile);
        assert_eq!(frame.tile_at(0, 0), Tile::zeroed());
    }

    #[test]
    fn pad_to_tile_grid_is_noop_when_aligned() {
        let frame = Frame::blank(64, 32);
        let padded = frame.pad_to_tile_grid();
        assert_eq!(padded.width(), 64);
        assert_eq!(padded.height(), 32);
    }

    #[test]
    fn pad_to_tile_grid_pads_edges_with_zero() {
        let frame = Frame::blank(40, 40);
        let padded = frame.pad_to_tile_grid();
        assert_eq!(padded.width(), 64);
        assert_eq!(padded.height(), 64);
        assert_eq!(padded.tile_at(32, 32), Tile::zeroed());
    }
}
