//! Decoded parameter values and word-level ABI decoding.

use crate::abi::descriptor::AbiType;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("bad hex: {0}")]
    Hex(String),
    #[error("data too short for {0}")]
    Truncated(&'static str),
    #[error("invalid offset or length in dynamic value")]
    BadOffset,
    #[error("invalid utf-8 in string value")]
    Utf8,
    #[error("unsupported parameter type: {0}")]
    UnsupportedType(String),
    #[error("topic count mismatch: expected {expected}, got {got}")]
    TopicCount { expected: usize, got: usize },
}

/// A decoded event parameter. Integers up to 128 bits decode exactly; wider
/// values fall back to a `0x` hex string.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventValue {
    Bool(bool),
    Uint(u128),
    Int(i128),
    Str(String),
}

impl EventValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view: exact integers directly, strings parsed as decimal or
    /// `0x` hex when they fit.
    pub fn as_u128(&self) -> Option<u128> {
        match self {
            Self::Uint(v) => Some(*v),
            Self::Int(v) => u128::try_from(*v).ok(),
            Self::Str(s) => {
                let t = s.trim();
                match t.strip_prefix("0x") {
                    Some(h) => u128::from_str_radix(h, 16).ok(),
                    None => t.parse().ok(),
                }
            }
            Self::Bool(_) => None,
        }
    }
}

/// Decode a hex payload, with or without `0x` prefix. Empty input is an
/// empty payload, which is valid for events with no data parameters.
pub fn decode_hex(s: &str) -> Result<Vec<u8>, DecodeError> {
    let t = s.trim().trim_start_matches("0x");
    if t.is_empty() {
        return Ok(Vec::new());
    }
    hex::decode(t).map_err(|_| DecodeError::Hex(s.to_string()))
}

fn word(data: &[u8], offset: usize) -> Result<&[u8], DecodeError> {
    let end = offset.checked_add(32).ok_or(DecodeError::BadOffset)?;
    data.get(offset..end).ok_or(DecodeError::Truncated("word"))
}

/// A 32-byte word interpreted as an offset or length. Values beyond u64
/// range are never legitimate positions in a log payload.
fn read_usize(w: &[u8]) -> Result<usize, DecodeError> {
    if w[..24].iter().any(|&b| b != 0) {
        return Err(DecodeError::BadOffset);
    }
    let mut b = [0u8; 8];
    b.copy_from_slice(&w[24..32]);
    Ok(u64::from_be_bytes(b) as usize)
}

/// Decode one 32-byte word as a static value of `kind`. Callers guarantee
/// `w.len() == 32`.
pub fn decode_static(kind: AbiType, w: &[u8]) -> EventValue {
    match kind {
        AbiType::Address => EventValue::Str(format!("0x{}", hex::encode(&w[12..32]))),
        AbiType::Bool => EventValue::Bool(w[31] != 0),
        AbiType::FixedBytes(n) => EventValue::Str(format!("0x{}", hex::encode(&w[..n]))),
        AbiType::Uint(_) => {
            if w[..16].iter().all(|&b| b == 0) {
                let mut b = [0u8; 16];
                b.copy_from_slice(&w[16..32]);
                EventValue::Uint(u128::from_be_bytes(b))
            } else {
                EventValue::Str(format!("0x{}", hex::encode(w)))
            }
        }
        AbiType::Int(_) => {
            let positive_fits = w[..16].iter().all(|&b| b == 0) && w[16] & 0x80 == 0;
            let negative_fits = w[..16].iter().all(|&b| b == 0xff) && w[16] & 0x80 != 0;
            if positive_fits || negative_fits {
                let mut b = [0u8; 16];
                b.copy_from_slice(&w[16..32]);
                EventValue::Int(i128::from_be_bytes(b))
            } else {
                EventValue::Str(format!("0x{}", hex::encode(w)))
            }
        }
        // Dynamic types never reach here; decode_dynamic handles them.
        AbiType::String | AbiType::Bytes => EventValue::Str(format!("0x{}", hex::encode(w))),
    }
}

/// Decode a dynamic value (`string`/`bytes`) whose head word sits at
/// `head_offset` in `data`, using the standard offset+length tail layout.
pub fn decode_dynamic(
    kind: AbiType,
    data: &[u8],
    head_offset: usize,
) -> Result<EventValue, DecodeError> {
    let tail = read_usize(word(data, head_offset)?)?;
    let len = read_usize(word(data, tail)?)?;
    let start = tail.checked_add(32).ok_or(DecodeError::BadOffset)?;
    let end = start.checked_add(len).ok_or(DecodeError::BadOffset)?;
    let bytes = data.get(start..end).ok_or(DecodeError::BadOffset)?;
    match kind {
        AbiType::String => String::from_utf8(bytes.to_vec())
            .map(EventValue::Str)
            .map_err(|_| DecodeError::Utf8),
        _ => Ok(EventValue::Str(format!("0x{}", hex::encode(bytes)))),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_hex_handles_prefix_and_empty() {
        assert_eq!(decode_hex("0x").unwrap(), Vec::<u8>::new());
        assert_eq!(decode_hex("").unwrap(), Vec::<u8>::new());
        assert_eq!(decode_hex("0x0a0b").unwrap(), vec![0x0a, 0x0b]);
        assert!(decode_hex("0xzz").is_err());
    }

    #[test]
    fn decode_static_address() {
        let w = encode::word_address("0x0000000000000000000000000000000000000065");
        let v = decode_static(AbiType::Address, &w);
        assert_eq!(
            v,
            EventValue::Str("0x0000000000000000000000000000000000000065".to_string())
        );
    }

    #[test]
    fn decode_static_uint_exact_and_overflow() {
        let w = encode::word_u128(500_000_000);
        assert_eq!(
            decode_static(AbiType::Uint(256), &w),
            EventValue::Uint(500_000_000)
        );

        let mut wide = vec![0xffu8; 32];
        wide[0] = 0x01;
        let v = decode_static(AbiType::Uint(256), &wide);
        assert!(matches!(v, EventValue::Str(ref s) if s.starts_with("0x01ff")));
    }

    #[test]
    fn decode_static_int_signs() {
        let w = encode::word_u128(42);
        assert_eq!(decode_static(AbiType::Int(256), &w), EventValue::Int(42));

        let neg = vec![0xffu8; 32];
        assert_eq!(decode_static(AbiType::Int(256), &neg), EventValue::Int(-1));
    }

    #[test]
    fn decode_static_bool() {
        assert_eq!(
            decode_static(AbiType::Bool, &encode::word_bool(true)),
            EventValue::Bool(true)
        );
        assert_eq!(
            decode_static(AbiType::Bool, &encode::word_bool(false)),
            EventValue::Bool(false)
        );
    }

    #[test]
    fn decode_dynamic_string_roundtrip() {
        // head: offset 0x20, tail: len + "upgrade treasury"
        let mut data = encode::word_u128(0x20);
        data.extend(encode::tail_bytes(b"upgrade treasury"));
        let v = decode_dynamic(AbiType::String, &data, 0).unwrap();
        assert_eq!(v, EventValue::Str("upgrade treasury".to_string()));
    }

    #[test]
    fn decode_dynamic_rejects_bad_offset() {
        let data = encode::word_u128(4096);
        assert_eq!(
            decode_dynamic(AbiType::String, &data, 0),
            Err(DecodeError::Truncated("word"))
        );
    }

    #[test]
    fn decode_dynamic_rejects_overflowing_offset() {
        // An offset of u64::MAX passes read_usize; the arithmetic for the
        // tail position must reject it instead of wrapping.
        let data = encode::word_u128(u128::from(u64::MAX));
        assert_eq!(
            decode_dynamic(AbiType::String, &data, 0),
            Err(DecodeError::BadOffset)
        );

        // Overflowing length word at a valid tail position.
        let mut with_len = encode::word_u128(0x20);
        with_len.extend(encode::word_u128(u128::from(u64::MAX)));
        assert_eq!(
            decode_dynamic(AbiType::String, &with_len, 0),
            Err(DecodeError::BadOffset)
        );
    }

    #[test]
    fn event_value_numeric_views() {
        assert_eq!(EventValue::Uint(7).as_u128(), Some(7));
        assert_eq!(EventValue::Int(-1).as_u128(), None);
        assert_eq!(EventValue::Str("0x10".to_string()).as_u128(), Some(16));
        assert_eq!(EventValue::Str("250".to_string()).as_u128(), Some(250));
        assert_eq!(EventValue::Bool(true).as_u128(), None);
    }
}
