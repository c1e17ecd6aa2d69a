//! QR code rasterization
//!
//! Turns a payload into a 1-bit bitmap suitable for the `GS v 0` raster
//! image command.

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use qrcode::{Color, EcLevel, QrCode};
use tracing::{debug, instrument};

use crate::error::RasterError;

/// Printable raster width of an 80mm head (dots)
pub const MAX_RASTER_WIDTH: u32 = 384;

const BLACK: Luma<u8> = Luma([0]);
const WHITE: Luma<u8> = Luma([255]);

/// Packed 1-bit bitmap
///
/// Rows are stored top to bottom, `byte_width` bytes each. Within a byte the
/// leftmost pixel is the most significant bit; a set bit prints black.
/// Unused trailing bits of a row are zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Raster {
    /// Pack a grayscale image, treating luma below 128 as black
    pub fn from_gray(img: &GrayImage) -> Self {
        let (width, height) = img.dimensions();
        let byte_width = width.div_ceil(8);
        let mut data = Vec::with_capacity((byte_width * height) as usize);

        for y in 0..height {
            for x_byte in 0..byte_width {
                let mut byte = 0u8;
                for bit in 0..8 {
                    let x = x_byte * 8 + bit;
                    if x < width && img.get_pixel(x, y)[0] < 128 {
                        byte |= 1 << (7 - bit);
                    }
                }
                data.push(byte);
            }
        }

        Self {
            width,
            height,
            data,
        }
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels (= number of rows)
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row, `ceil(width / 8)`
    pub fn byte_width(&self) -> u32 {
        self.width.div_ceil(8)
    }

    /// Packed rows
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// QR symbol rasterizer
///
/// Medium error correction, smallest version that fits the payload.
#[derive(Debug, Clone)]
pub struct QrRasterizer {
    module_size: u32,
    quiet_zone: u32,
    max_width: u32,
}

impl QrRasterizer {
    /// Create a rasterizer
    ///
    /// - `module_size`: pixels per QR module
    /// - `quiet_zone`: border width in modules
    /// - `max_width`: wider bitmaps are downscaled to this width
    pub fn new(module_size: u32, quiet_zone: u32, max_width: u32) -> Self {
        Self {
            module_size: module_size.max(1),
            quiet_zone,
            max_width: max_width.max(8),
        }
    }

    /// Encode `payload` and render it as a 1-bit raster
    #[instrument(skip(self), fields(len = payload.len()))]
    pub fn rasterize(&self, payload: &str) -> Result<Raster, RasterError> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::M)
            .map_err(|e| RasterError::QrEncode(e.to_string()))?;

        let img = self.draw(&code);
        let (w, h) = img.dimensions();

        let img = if w > self.max_width {
            let new_h = ((h as u64 * self.max_width as u64) / w as u64).max(1) as u32;
            debug!(from = w, to = self.max_width, "downscaling QR raster");
            let resized = imageops::resize(&img, self.max_width, new_h, FilterType::Lanczos3);
            threshold(&resized)
        } else {
            img
        };

        let raster = Raster::from_gray(&img);
        if raster.byte_width() > u16::MAX as u32 || raster.height() > u16::MAX as u32 {
            return Err(RasterError::TooLarge {
                width: raster.width(),
                height: raster.height(),
            });
        }

        debug!(
            width = raster.width(),
            height = raster.height(),
            "QR raster ready"
        );
        Ok(raster)
    }

    /// Draw modules plus quiet zone at `module_size` pixels per module
    fn draw(&self, code: &QrCode) -> GrayImage {
        let modules = code.width() as u32;
        let colors = code.to_colors();
        let side = (modules + 2 * self.quiet_zone) * self.module_size;

        GrayImage::from_fn(side, side, |x, y| {
            let mx = (x / self.module_size) as i64 - self.quiet_zone as i64;
            let my = (y / self.module_size) as i64 - self.quiet_zone as i64;
            let inside = (0..modules as i64).contains(&mx) && (0..modules as i64).contains(&my);
            if inside && colors[(my as usize) * modules as usize + mx as usize] == Color::Dark {
                BLACK
            } else {
                WHITE
            }
        })
    }
}

impl Default for QrRasterizer {
    fn default() -> Self {
        Self::new(6, 2, MAX_RASTER_WIDTH)
    }
}

/// Snap resampled gray levels back to strict black/white
fn threshold(img: &GrayImage) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        if img.get_pixel(x, y)[0] < 128 {
            BLACK
        } else {
            WHITE
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packed_row(raster: &Raster, y: u32) -> &[u8] {
        let bw = raster.byte_width() as usize;
        let start = y as usize * bw;
        &raster.data()[start..start + bw]
    }

    #[test]
    fn test_pack_bits_msb_first() {
        // 10 px wide, so the second byte of each row carries 6 padding bits
        let img = GrayImage::from_fn(10, 2, |x, y| {
            let dark = (y == 0 && x % 2 == 0) || (y == 1 && x >= 8);
            if dark { BLACK } else { WHITE }
        });
        let raster = Raster::from_gray(&img);

        assert_eq!(raster.byte_width(), 2);
        assert_eq!(raster.height(), 2);
        assert_eq!(packed_row(&raster, 0), &[0b1010_1010, 0b1000_0000]);
        assert_eq!(packed_row(&raster, 1), &[0x00, 0b1100_0000]);
    }

    #[test]
    fn test_small_payload_geometry() {
        let raster = QrRasterizer::default().rasterize("A-102").unwrap();

        // Version 1: 21 modules + 2x2 quiet zone, 6 px each
        assert_eq!(raster.width(), 150);
        assert_eq!(raster.height(), 150);
        assert_eq!(raster.byte_width(), 19);
        assert_eq!(raster.data().len(), 19 * 150);
    }

    #[test]
    fn test_quiet_zone_and_finder_pattern() {
        let raster = QrRasterizer::default().rasterize("A-102").unwrap();

        // Quiet zone: 12 white rows on top
        for y in 0..12 {
            assert!(packed_row(&raster, y).iter().all(|&b| b == 0), "row {y}");
        }

        // Top-left finder starts at pixel 12 and spans 7 modules (42 px)
        let row = packed_row(&raster, 12);
        assert_eq!(row[0], 0x00);
        assert_eq!(row[1], 0x0F);
        assert!(row[2..6].iter().all(|&b| b == 0xFF));
        assert_eq!(row[6], 0xFC);

        // Trailing bits of the last byte are never set
        for y in 0..raster.height() {
            assert_eq!(packed_row(&raster, y)[18] & 0b0000_0011, 0);
        }
    }

    #[test]
    fn test_large_payload_downscaled() {
        let payload = "r".repeat(300);
        let raster = QrRasterizer::default().rasterize(&payload).unwrap();

        assert_eq!(raster.width(), MAX_RASTER_WIDTH);
        assert_eq!(raster.height(), MAX_RASTER_WIDTH);
        assert_eq!(raster.byte_width(), 48);
        assert_eq!(raster.data().len(), (48 * raster.height()) as usize);
    }

    #[test]
    fn test_byte_width_matches_pixel_width() {
        for payload in ["1", "RC-2024-0042", "https://repaircafe.example/t/A-102"] {
            let raster = QrRasterizer::default().rasterize(payload).unwrap();
            assert_eq!(raster.byte_width(), raster.width().div_ceil(8));
            assert_eq!(
                raster.data().len() as u32,
                raster.byte_width() * raster.height()
            );
        }
    }

    #[test]
    fn test_payload_too_long() {
        let payload = "x".repeat(4000);
        let err = QrRasterizer::default().rasterize(&payload).unwrap_err();
        assert!(matches!(err, RasterError::QrEncode(_)));
    }

    #[test]
    fn test_deterministic() {
        let r = QrRasterizer::default();
        assert_eq!(r.rasterize("A-102").unwrap(), r.rasterize("A-102").unwrap());
    }
}
