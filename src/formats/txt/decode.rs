//! Text decoding with legacy CJK fallbacks

use encoding_rs::{Encoding, GB18030, GBK};

/// Decoded text and how it was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    /// Name of the encoding that produced `text`
    pub encoding: &'static str,
    /// Whether `text` differs from the raw bytes (anything but valid UTF-8)
    pub converted: bool,
}

/// Strict decoders tried, in order, when the bytes are not UTF-8
fn legacy_encodings() -> [&'static Encoding; 2] {
    [GBK, GB18030]
}

/// Decode raw text: UTF-8 as-is, then GBK, then GB18030, then lossy UTF-8
pub fn decode_text(raw: Vec<u8>) -> DecodedText {
    let raw = match String::from_utf8(raw) {
        Ok(text) => {
            return DecodedText {
                text,
                encoding: "UTF-8",
                converted: false,
            }
        }
        Err(e) => e.into_bytes(),
    };

    for encoding in legacy_encodings() {
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(&raw) {
            return DecodedText {
                text: text.into_owned(),
                encoding: encoding.name(),
                converted: true,
            };
        }
    }

    DecodedText {
        text: String::from_utf8_lossy(&raw).into_owned(),
        encoding: "UTF-8 (lossy)",
        converted: true,
    }
}
