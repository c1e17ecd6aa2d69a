//! Windows-1252 encoding for Western thermal printers
//!
//! The printer is switched to code page 16 (WPC1252) at the start of every
//! ticket, so all text is sent as single-byte Windows-1252.
//! Characters outside the code page are replaced with `?`; encoding never fails.

use encoding_rs::{EncoderResult, WINDOWS_1252};

/// Byte written in place of a character the code page cannot represent
pub const SUBSTITUTE: u8 = b'?';

/// Encode UTF-8 text as Windows-1252 with best-effort substitution
///
/// ASCII (and therefore every ESC/POS control byte) passes through unchanged.
pub fn encode_cp1252(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    let mut encoder = WINDOWS_1252.new_encoder();
    let mut chunk = [0u8; 256];
    let mut src = s;

    loop {
        let (result, read, written) =
            encoder.encode_from_utf8_without_replacement(src, &mut chunk, true);
        out.extend_from_slice(&chunk[..written]);
        src = &src[read..];

        match result {
            EncoderResult::InputEmpty => break,
            EncoderResult::OutputFull => {}
            EncoderResult::Unmappable(_) => out.push(SUBSTITUTE),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passthrough() {
        assert_eq!(encode_cp1252("TICKET\n"), b"TICKET\n");
        assert_eq!(encode_cp1252("\x1B\x45\x01"), vec![0x1B, 0x45, 0x01]);
    }

    #[test]
    fn test_western_characters() {
        assert_eq!(encode_cp1252("café"), vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(encode_cp1252("€"), vec![0x80]);
        assert_eq!(encode_cp1252("ë"), vec![0xEB]);
    }

    #[test]
    fn test_unencodable_substitution() {
        assert_eq!(encode_cp1252("日本"), b"??");
        assert_eq!(encode_cp1252("a日b"), b"a?b");
    }

    #[test]
    fn test_long_input_spans_chunks() {
        let text = "é".repeat(1000);
        let encoded = encode_cp1252(&text);
        assert_eq!(encoded.len(), 1000);
        assert!(encoded.iter().all(|&b| b == 0xE9));
    }
}
