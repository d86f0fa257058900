//! SSID decoding for the hex-wrapped identifiers used as keys and list
//! entries in the airport preferences store.
//!
//! Identifiers look like `wifi.ssid.<686f6d65>`. Generations from 2500 on wrap
//! the payload in a 10 character prefix; older ones use an 11 character
//! prefix plus one trailing delimiter.

use std::fmt::{self, Write as _};

use plist::Value;

use super::parse_log::ParseLog;

/// First schema generation that uses the short wrapper.
pub const SHORT_WRAPPER_VERSION: i64 = 2500;

#[derive(Debug, Clone, PartialEq)]
pub enum SsidDecodeError {
    TooShort { len: usize, needed: usize },
    InvalidHex(hex::FromHexError),
}

impl fmt::Display for SsidDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { len, needed } => {
                write!(f, "identifier has {len} characters, wrapper needs {needed}")
            }
            Self::InvalidHex(err) => write!(f, "payload is not hex: {err}"),
        }
    }
}

impl std::error::Error for SsidDecodeError {}

/// Strict decode of one wrapped identifier.
pub fn decode_ssid(raw: &str, schema_version: i64) -> Result<String, SsidDecodeError> {
    let (prefix, suffix) = if schema_version >= SHORT_WRAPPER_VERSION {
        (10, 0)
    } else {
        (11, 1)
    };

    let len = raw.chars().count();
    let needed = prefix + suffix;
    if len < needed {
        return Err(SsidDecodeError::TooShort { len, needed });
    }

    let payload: String = raw
        .chars()
        .skip(prefix)
        .take(len - needed)
        .filter(|c| !matches!(c, ' ' | '<' | '>'))
        .collect();

    let bytes = hex::decode(payload).map_err(SsidDecodeError::InvalidHex)?;
    Ok(decode_utf8_escaped(&bytes))
}

/// Best-effort decode: on failure the error is logged and `raw` comes back
/// unchanged.
pub fn readable_ssid(raw: &str, schema_version: i64, log: &mut ParseLog) -> String {
    match decode_ssid(raw, schema_version) {
        Ok(name) => name,
        Err(err) => {
            log.error(format!("could not decode SSID '{raw}': {err}"));
            raw.to_string()
        }
    }
}

/// Decode every entry, dropping the ones that come out empty.
pub fn readable_ssids(raws: &[Value], schema_version: i64, log: &mut ParseLog) -> Vec<String> {
    raws.iter()
        .filter_map(|raw| match raw.as_string() {
            Some(raw) => Some(readable_ssid(raw, schema_version, log)),
            None => {
                log.warn("skipping non-text SSID entry in collocated group");
                None
            }
        })
        .filter(|name| !name.is_empty())
        .collect()
}

/// UTF-8 decode, writing each undecodable byte as `\xNN`.
pub fn decode_utf8_escaped(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut rest = bytes;
    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                out.push_str(valid);
                return out;
            }
            Err(err) => {
                let (valid, after) = rest.split_at(err.valid_up_to());
                out.push_str(&String::from_utf8_lossy(valid));
                let bad = err.error_len().unwrap_or(after.len());
                for byte in &after[..bad] {
                    let _ = write!(out, "\\x{byte:02x}");
                }
                rest = &after[bad..];
            }
        }
    }
}

/// UTF-8 decode that silently drops undecodable bytes.
pub fn decode_utf8_ignoring(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut rest = bytes;
    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                out.push_str(valid);
                return out;
            }
            Err(err) => {
                let (valid, after) = rest.split_at(err.valid_up_to());
                out.push_str(&String::from_utf8_lossy(valid));
                let bad = err.error_len().unwrap_or(after.len());
                rest = &after[bad..];
            }
        }
    }
}
