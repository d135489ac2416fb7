use std::fs;
use std::path::Path;

use log::{debug, warn};

use crate::config::{DecodePolicy, TextEncoding};
use crate::error::{Result, SensorLogError};

/// Decoded log text plus how many invalid sequences were substituted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub replacements: usize,
}

pub fn read_log(path: &Path, encoding: TextEncoding, policy: DecodePolicy) -> Result<DecodedText> {
    let bytes = fs::read(path)?;
    debug!("read {} bytes from {}", bytes.len(), path.display());
    let decoded = decode(&bytes, encoding, policy)?;
    if decoded.replacements > 0 {
        warn!(
            "{}: replaced {} invalid {encoding} sequence(s)",
            path.display(),
            decoded.replacements
        );
    }
    Ok(decoded)
}

/// Decode raw log bytes. Under [`DecodePolicy::Strict`] the first invalid
/// sequence aborts with its byte offset; under [`DecodePolicy::Replace`] each
/// one becomes U+FFFD.
pub fn decode(bytes: &[u8], encoding: TextEncoding, policy: DecodePolicy) -> Result<DecodedText> {
    match encoding {
        TextEncoding::Utf8 => decode_utf8(bytes, policy),
        TextEncoding::Utf16 => match bytes {
            [0xFF, 0xFE, ..] => decode_utf16(bytes, 2, Endian::Little, encoding, policy),
            [0xFE, 0xFF, ..] => decode_utf16(bytes, 2, Endian::Big, encoding, policy),
            _ => decode_utf16(bytes, 0, Endian::Little, encoding, policy),
        },
        TextEncoding::Utf16Le => {
            let start = if bytes.starts_with(&[0xFF, 0xFE]) { 2 } else { 0 };
            decode_utf16(bytes, start, Endian::Little, encoding, policy)
        }
        TextEncoding::Utf16Be => {
            let start = if bytes.starts_with(&[0xFE, 0xFF]) { 2 } else { 0 };
            decode_utf16(bytes, start, Endian::Big, encoding, policy)
        }
    }
}

fn decode_utf8(bytes: &[u8], policy: DecodePolicy) -> Result<DecodedText> {
    let start = if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) { 3 } else { 0 };
    let bytes = &bytes[start..];
    match policy {
        DecodePolicy::Strict => {
            let text = std::str::from_utf8(bytes).map_err(|e| SensorLogError::Decode {
                encoding: TextEncoding::Utf8,
                offset: start + e.valid_up_to(),
            })?;
            Ok(DecodedText {
                text: text.to_owned(),
                replacements: 0,
            })
        }
        DecodePolicy::Replace => {
            let mut text = String::with_capacity(bytes.len());
            let mut replacements = 0;
            for chunk in bytes.utf8_chunks() {
                text.push_str(chunk.valid());
                if !chunk.invalid().is_empty() {
                    text.push(char::REPLACEMENT_CHARACTER);
                    replacements += 1;
                }
            }
            Ok(DecodedText { text, replacements })
        }
    }
}

#[derive(Clone, Copy)]
enum Endian {
    Little,
    Big,
}

fn decode_utf16(
    bytes: &[u8],
    start: usize,
    endian: Endian,
    encoding: TextEncoding,
    policy: DecodePolicy,
) -> Result<DecodedText> {
    let body = &bytes[start..];
    let pairs = body.chunks_exact(2);
    let trailing = !pairs.remainder().is_empty();
    let units = pairs.map(|pair| match endian {
        Endian::Little => u16::from_le_bytes([pair[0], pair[1]]),
        Endian::Big => u16::from_be_bytes([pair[0], pair[1]]),
    });

    let mut text = String::with_capacity(body.len() / 2);
    let mut replacements = 0;
    let mut consumed_units = 0usize;
    for decoded in char::decode_utf16(units) {
        match decoded {
            Ok(c) => {
                text.push(c);
                consumed_units += c.len_utf16();
            }
            Err(_) => {
                if policy == DecodePolicy::Strict {
                    return Err(SensorLogError::Decode {
                        encoding,
                        offset: start + consumed_units * 2,
                    });
                }
                text.push(char::REPLACEMENT_CHARACTER);
                replacements += 1;
                consumed_units += 1;
            }
        }
    }
    if trailing {
        if policy == DecodePolicy::Strict {
            return Err(SensorLogError::Decode {
                encoding,
                offset: bytes.len() - 1,
            });
        }
        text.push(char::REPLACEMENT_CHARACTER);
        replacements += 1;
    }
    Ok(DecodedText { text, replacements })
}
