//! ESC/POS command builder
//!
//! Provides a fluent API for building ESC/POS print data.
//! Text is encoded to Windows-1252 as it is written; command and raster
//! bytes are appended untouched, so the buffer is final at every step.

use crate::encoding::encode_cp1252;
use crate::raster::Raster;

const ESC: u8 = 0x1B;
const GS: u8 = 0x1D;

/// ESC t n value for WPC1252
pub const CODE_PAGE_WPC1252: u8 = 16;

/// ESC/POS command builder
pub struct EscPosBuilder {
    buf: Vec<u8>,
    width: usize,
}

impl EscPosBuilder {
    /// Create a new builder with the specified paper width in characters
    ///
    /// Starts with printer reset (ESC @) and WPC1252 code page selection.
    ///
    /// Common widths:
    /// - 58mm paper: 32 characters
    /// - 80mm paper: 42 (font A, 512-dot heads print 48)
    pub fn new(width: usize) -> Self {
        let mut buf = Vec::with_capacity(4096);
        buf.extend_from_slice(&[ESC, 0x40]);
        buf.extend_from_slice(&[ESC, 0x74, CODE_PAGE_WPC1252]);
        Self { buf, width }
    }

    // === Text Output ===

    /// Write text (Windows-1252 encoded, unencodable characters become '?')
    pub fn text(&mut self, s: &str) -> &mut Self {
        self.buf.extend_from_slice(&encode_cp1252(s));
        self
    }

    /// Write text followed by newline
    pub fn line(&mut self, s: &str) -> &mut Self {
        self.text(s);
        self.buf.push(b'\n');
        self
    }

    /// Write empty line
    pub fn newline(&mut self) -> &mut Self {
        self.buf.push(b'\n');
        self
    }

    /// Bold label followed by normal-weight text, no newline
    pub fn labeled(&mut self, label: &str, value: &str) -> &mut Self {
        self.bold().text(label).bold_off().text(value)
    }

    // === Alignment ===

    /// Align text to center
    pub fn center(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[ESC, 0x61, 0x01]);
        self
    }

    /// Align text to left (default)
    pub fn left(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[ESC, 0x61, 0x00]);
        self
    }

    // === Text Style ===

    /// Enable bold text
    pub fn bold(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[ESC, 0x45, 0x01]);
        self
    }

    /// Disable bold text
    pub fn bold_off(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[ESC, 0x45, 0x00]);
        self
    }

    /// Double width and height
    pub fn double_size(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[GS, 0x21, 0x11]);
        self
    }

    /// Reset to normal size
    pub fn reset_size(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[GS, 0x21, 0x00]);
        self
    }

    // === Separators ===

    /// Print a line of `ch` repeated `width` times
    pub fn rule(&mut self, ch: char, width: usize) -> &mut Self {
        let s: String = std::iter::repeat_n(ch, width).collect();
        self.line(&s)
    }

    /// Print a full-width line of '=' characters
    pub fn sep_double(&mut self) -> &mut Self {
        self.rule('=', self.width)
    }

    // === Images ===

    /// Print a raster bit image (GS v 0, normal mode)
    ///
    /// Dimension fields are little-endian 16-bit: width in bytes, height in dots.
    pub fn raster(&mut self, raster: &Raster) -> &mut Self {
        let x_bytes = raster.byte_width();
        let height = raster.height();

        // GS v 0 m xL xH yL yH
        self.buf.extend_from_slice(&[GS, 0x76, 0x30, 0x00]);
        self.buf.push((x_bytes & 0xFF) as u8);
        self.buf.push(((x_bytes >> 8) & 0xFF) as u8);
        self.buf.push((height & 0xFF) as u8);
        self.buf.push(((height >> 8) & 0xFF) as u8);
        self.buf.extend_from_slice(raster.data());
        self
    }

    // === Paper Control ===

    /// Feed `lines` lines, then full cut (GS V 65 n)
    pub fn cut_feed(&mut self, lines: u8) -> &mut Self {
        self.buf.extend_from_slice(&[GS, 0x56, 0x41, lines]);
        self
    }

    // === Build ===

    /// Finish and return the byte stream
    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for EscPosBuilder {
    fn default() -> Self {
        Self::new(42)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn test_builder_preamble() {
        let data = EscPosBuilder::new(42).build();
        assert_eq!(data, vec![0x1B, 0x40, 0x1B, 0x74, 0x10]);
    }

    #[test]
    fn test_style_codes() {
        let mut b = EscPosBuilder::new(32);
        b.center().bold().double_size().line("TITEL").reset_size().bold_off().left();

        let data = b.build();
        let tail = &data[5..];
        let mut expected = vec![0x1B, 0x61, 0x01, 0x1B, 0x45, 0x01, 0x1D, 0x21, 0x11];
        expected.extend_from_slice(b"TITEL\n");
        expected.extend_from_slice(&[0x1D, 0x21, 0x00, 0x1B, 0x45, 0x00, 0x1B, 0x61, 0x00]);
        assert_eq!(tail, expected.as_slice());
    }

    #[test]
    fn test_text_is_cp1252() {
        let mut b = EscPosBuilder::new(32);
        b.text("Café €5 修");
        let data = b.build();
        assert_eq!(&data[5..], &[b'C', b'a', b'f', 0xE9, b' ', 0x80, b'5', b' ', b'?']);
    }

    #[test]
    fn test_separators() {
        let mut b = EscPosBuilder::new(10);
        b.sep_double().rule('-', 4);

        let data = b.build();
        assert_eq!(&data[5..], b"==========\n----\n");
    }

    #[test]
    fn test_raster_command() {
        let img = GrayImage::from_fn(300, 2, |_, _| Luma([0]));
        let raster = Raster::from_gray(&img);

        let mut b = EscPosBuilder::new(42);
        b.raster(&raster);
        let data = b.build();

        // 300 px -> 38 bytes per row, 2 rows
        assert_eq!(&data[5..13], &[0x1D, 0x76, 0x30, 0x00, 38, 0, 2, 0]);
        assert_eq!(data.len(), 13 + 38 * 2);
    }

    #[test]
    fn test_raster_dimension_high_bytes() {
        let img = GrayImage::from_fn(8, 300, |_, _| Luma([255]));
        let raster = Raster::from_gray(&img);

        let mut b = EscPosBuilder::new(42);
        b.raster(&raster);
        let data = b.build();

        // height 300 = 0x012C
        assert_eq!(&data[9..13], &[1, 0, 0x2C, 0x01]);
    }

    #[test]
    fn test_cut() {
        let mut b = EscPosBuilder::new(42);
        b.cut_feed(3);
        assert!(b.build().ends_with(&[0x1D, 0x56, 0x41, 0x03]));
    }
}
