//! Text encodings accepted for reading and writing files.

use std::fmt;

/// Character encoding of the files being read or written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    #[default]
    Utf8,
    /// Big-endian unless a byte order mark says otherwise; written with a BOM.
    Utf16,
    /// 7-bit US-ASCII.
    Ascii,
    /// ISO-8859-1, the Western European superset of ASCII.
    Latin1,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CharsetError {
    #[error("invalid UTF-8 at byte {offset}")]
    InvalidUtf8 { offset: usize },
    #[error("UTF-16 input has an odd number of bytes ({len})")]
    OddUtf16Length { len: usize },
    #[error("unpaired UTF-16 surrogate at byte {offset}")]
    UnpairedSurrogate { offset: usize },
    #[error("byte 0x{byte:02X} at {offset} is not US-ASCII")]
    NotAscii { offset: usize, byte: u8 },
    #[error("character {ch:?} at {offset} cannot be written as {charset}")]
    Unencodable {
        ch: char,
        offset: usize,
        charset: Charset,
    },
}

const UTF16_BE_BOM: [u8; 2] = [0xFE, 0xFF];
const UTF16_LE_BOM: [u8; 2] = [0xFF, 0xFE];

impl Charset {
    pub const ALL: [Charset; 4] = [
        Charset::Utf8,
        Charset::Utf16,
        Charset::Ascii,
        Charset::Latin1,
    ];

    /// Canonical name, as printed in messages.
    pub fn name(self) -> &'static str {
        match self {
            Charset::Utf8 => "UTF-8",
            Charset::Utf16 => "UTF-16",
            Charset::Ascii => "US-ASCII",
            Charset::Latin1 => "ISO-8859-1",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            Charset::Utf8 => &["UTF-8", "UTF8"],
            Charset::Utf16 => &["UTF-16", "UTF16"],
            Charset::Ascii => &["US-ASCII", "US_ASCII", "ASCII"],
            Charset::Latin1 => &["ISO-8859-1", "ISO88591", "ISO_8859_1", "LATIN1"],
        }
    }

    /// Looks a charset up by any of its usual spellings, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = name.trim().to_ascii_uppercase();
        Charset::ALL
            .into_iter()
            .find(|cs| cs.aliases().contains(&wanted.as_str()))
    }

    pub fn decode(self, bytes: &[u8]) -> Result<String, CharsetError> {
        match self {
            Charset::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|e| CharsetError::InvalidUtf8 {
                    offset: e.valid_up_to(),
                }),
            Charset::Utf16 => decode_utf16(bytes),
            Charset::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(offset) => Err(CharsetError::NotAscii {
                    offset,
                    byte: bytes[offset],
                }),
                None => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            },
            Charset::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }

    pub fn encode(self, text: &str) -> Result<Vec<u8>, CharsetError> {
        match self {
            Charset::Utf8 => Ok(text.as_bytes().to_vec()),
            Charset::Utf16 => {
                let mut out = Vec::with_capacity(2 + text.len() * 2);
                out.extend_from_slice(&UTF16_BE_BOM);
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_be_bytes());
                }
                Ok(out)
            }
            Charset::Ascii => self.encode_single_byte(text, 0x7F),
            Charset::Latin1 => self.encode_single_byte(text, 0xFF),
        }
    }

    fn encode_single_byte(self, text: &str, max: u32) -> Result<Vec<u8>, CharsetError> {
        text.char_indices()
            .map(|(offset, ch)| {
                u8::try_from(u32::from(ch))
                    .ok()
                    .filter(|&b| u32::from(b) <= max)
                    .ok_or(CharsetError::Unencodable {
                        ch,
                        offset,
                        charset: self,
                    })
            })
            .collect()
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn decode_utf16(bytes: &[u8]) -> Result<String, CharsetError> {
    if bytes.len() % 2 != 0 {
        return Err(CharsetError::OddUtf16Length { len: bytes.len() });
    }

    let (little_endian, body, bom_len) = match bytes {
        [0xFF, 0xFE, rest @ ..] => (true, rest, UTF16_LE_BOM.len()),
        [0xFE, 0xFF, rest @ ..] => (false, rest, UTF16_BE_BOM.len()),
        _ => (false, bytes, 0),
    };

    let units = body.chunks_exact(2).map(|pair| {
        let pair = [pair[0], pair[1]];
        if little_endian {
            u16::from_le_bytes(pair)
        } else {
            u16::from_be_bytes(pair)
        }
    });

    let mut out = String::with_capacity(body.len() / 2);
    let mut offset = bom_len;
    for decoded in char::decode_utf16(units) {
        match decoded {
            Ok(ch) => {
                offset += ch.len_utf16() * 2;
                out.push(ch);
            }
            Err(_) => return Err(CharsetError::UnpairedSurrogate { offset }),
        }
    }
    Ok(out)
}
