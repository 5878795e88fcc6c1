//! Base64 payload decoding with an ordered text-encoding cascade.
//!
//! The hosting API ships file bodies as base64 (wrapped at 60 columns).
//! After the base64 step the raw bytes are tried against
//! [`ENCODING_CASCADE`] in order and the first encoding that accepts the
//! bytes wins. Failures never propagate: they become sentinel strings that
//! the ingestion run stores as the file's content before moving on.

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Stored in place of content when no encoding in the cascade accepts the bytes.
pub const UNDECODABLE: &str = "Unable to decode file content";

/// Stored in place of content when a file exceeds the configured size ceiling.
pub const TOO_LARGE: &str = "File too large for analysis";

/// Prefix of the sentinel stored when the payload itself is malformed.
pub const READ_ERROR_PREFIX: &str = "Error reading file: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    /// Only attempted when a byte-order mark is present.
    Utf16,
    Windows1252,
    Latin1,
}

/// Broadest first, total fallback last.
pub const ENCODING_CASCADE: &[TextEncoding] = &[
    TextEncoding::Utf8,
    TextEncoding::Utf16,
    TextEncoding::Windows1252,
    TextEncoding::Latin1,
];

/// Outcome of decoding one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Text {
        text: String,
        encoding: TextEncoding,
    },
    Undecodable,
    /// The base64 layer was malformed.
    Invalid(String),
}

impl Decoded {
    /// The string to store as file content: the text itself or a sentinel.
    pub fn into_content(self) -> String {
        match self {
            Decoded::Text { text, .. } => text,
            Decoded::Undecodable => UNDECODABLE.to_string(),
            Decoded::Invalid(reason) => format!("{READ_ERROR_PREFIX}{reason}"),
        }
    }
}

/// Decodes a base64 payload and then its text, using [`ENCODING_CASCADE`].
pub fn decode_base64_content(payload: &str) -> Decoded {
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    match STANDARD.decode(compact.as_bytes()) {
        Ok(bytes) => decode_bytes(&bytes, ENCODING_CASCADE),
        Err(e) => Decoded::Invalid(e.to_string()),
    }
}

/// Tries each encoding of `cascade` in order against `bytes`.
pub fn decode_bytes(bytes: &[u8], cascade: &[TextEncoding]) -> Decoded {
    for &encoding in cascade {
        if let Some(text) = encoding.decode(bytes) {
            return Decoded::Text { text, encoding };
        }
    }
    Decoded::Undecodable
}

impl TextEncoding {
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_string),
            TextEncoding::Utf16 => decode_utf16(bytes),
            TextEncoding::Windows1252 => bytes.iter().map(|&b| windows_1252_char(b)).collect(),
            TextEncoding::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
        }
    }
}

fn decode_utf16(bytes: &[u8]) -> Option<String> {
    let (body, little_endian) = match bytes {
        [0xFF, 0xFE, rest @ ..] => (rest, true),
        [0xFE, 0xFF, rest @ ..] => (rest, false),
        _ => return None,
    };
    if body.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| {
            if little_endian {
                u16::from_le_bytes([pair[0], pair[1]])
            } else {
                u16::from_be_bytes([pair[0], pair[1]])
            }
        })
        .collect();
    String::from_utf16(&units).ok()
}

/// Code page 1252: Latin-1 except for 0x80..=0x9F, five of which are unassigned.
fn windows_1252_char(b: u8) -> Option<char> {
    let c = match b {
        0x80 => '\u{20AC}',
        0x82 => '\u{201A}',
        0x83 => '\u{0192}',
        0x84 => '\u{201E}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02C6}',
        0x89 => '\u{2030}',
        0x8A => '\u{0160}',
        0x8B => '\u{2039}',
        0x8C => '\u{0152}',
        0x8E => '\u{017D}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02DC}',
        0x99 => '\u{2122}',
        0x9A => '\u{0161}',
        0x9B => '\u{203A}',
        0x9C => '\u{0153}',
        0x9E => '\u{017E}',
        0x9F => '\u{0178}',
        0x81 | 0x8D | 0x8F | 0x90 | 0x9D => return None,
        _ => b as char,
    };
    Some(c)
}
