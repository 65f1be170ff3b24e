//! Value codec
//!
//! Converts between typed values and the byte encodings the cluster uses:
//! big-endian integers, IEEE-754 floats by bit pattern, `0xFF`/`0x00`
//! booleans, UTF-8 strings, and the printable `\xNN` binary notation.
//!
//! Encoders never fail. Decoders reject inputs of the wrong length,
//! invalid UTF-8, and malformed escapes.

use thiserror::Error;

use crate::errors::ErrorKind;
use crate::model::escape_binary;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("cannot decode {target}: expected {expected} bytes, got {actual}")]
    WrongLength {
        target: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("value is not valid UTF-8 (invalid byte at {0})")]
    InvalidUtf8(usize),

    #[error("malformed escape at offset {0}")]
    BadEscape(usize),
}

impl EncodingError {
    pub fn code(&self) -> &'static str {
        match self {
            EncodingError::WrongLength { .. } => "ROWSTORE_ENCODING_LENGTH",
            EncodingError::InvalidUtf8(_) => "ROWSTORE_ENCODING_UTF8",
            EncodingError::BadEscape(_) => "ROWSTORE_ENCODING_ESCAPE",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Encoding
    }
}

pub type EncodingResult<T> = Result<T, EncodingError>;

pub fn to_bytes_bool(b: bool) -> Vec<u8> {
    vec![if b { 0xFF } else { 0x00 }]
}

pub fn to_bytes_i32(v: i32) -> Vec<u8> {
    v.to_be_bytes().to_vec()
}

pub fn to_bytes_i64(v: i64) -> Vec<u8> {
    v.to_be_bytes().to_vec()
}

pub fn to_bytes_f32(v: f32) -> Vec<u8> {
    v.to_bits().to_be_bytes().to_vec()
}

pub fn to_bytes_f64(v: f64) -> Vec<u8> {
    v.to_bits().to_be_bytes().to_vec()
}

pub fn to_bytes_str(s: &str) -> Vec<u8> {
    s.as_bytes().to_vec()
}

/// Parses printable binary notation: `\xNN` is one byte, every other
/// character contributes its UTF-8 bytes.
pub fn to_bytes_binary(s: &str) -> EncodingResult<Vec<u8>> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        let escape = bytes.get(i + 1..i + 4).ok_or(EncodingError::BadEscape(i))?;
        if escape[0] != b'x' || !escape[1..].iter().all(u8::is_ascii_hexdigit) {
            return Err(EncodingError::BadEscape(i));
        }
        let hex = std::str::from_utf8(&escape[1..]).map_err(|_| EncodingError::BadEscape(i))?;
        let byte = u8::from_str_radix(hex, 16).map_err(|_| EncodingError::BadEscape(i))?;
        out.push(byte);
        i += 4;
    }
    Ok(out)
}

/// Decodes a single-byte boolean; any non-zero byte is true.
pub fn to_bool(bytes: &[u8]) -> EncodingResult<bool> {
    let [b] = fixed::<1>("bool", bytes)?;
    Ok(b != 0)
}

pub fn to_i32(bytes: &[u8]) -> EncodingResult<i32> {
    Ok(i32::from_be_bytes(fixed("i32", bytes)?))
}

pub fn to_i64(bytes: &[u8]) -> EncodingResult<i64> {
    Ok(i64::from_be_bytes(fixed("i64", bytes)?))
}

pub fn to_f32(bytes: &[u8]) -> EncodingResult<f32> {
    Ok(f32::from_bits(u32::from_be_bytes(fixed("f32", bytes)?)))
}

pub fn to_f64(bytes: &[u8]) -> EncodingResult<f64> {
    Ok(f64::from_bits(u64::from_be_bytes(fixed("f64", bytes)?)))
}

pub fn to_str(bytes: &[u8]) -> EncodingResult<&str> {
    std::str::from_utf8(bytes).map_err(|e| EncodingError::InvalidUtf8(e.valid_up_to()))
}

/// Renders bytes in printable binary notation; the inverse of
/// [`to_bytes_binary`].
pub fn to_string_binary(bytes: &[u8]) -> String {
    escape_binary(bytes)
}

fn fixed<const N: usize>(target: &'static str, bytes: &[u8]) -> EncodingResult<[u8; N]> {
    bytes.try_into().map_err(|_| EncodingError::WrongLength {
        target,
        expected: N,
        actual: bytes.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_encoding() {
        assert_eq!(to_bytes_bool(true), vec![0xFF]);
        assert_eq!(to_bytes_bool(false), vec![0x00]);
        assert!(to_bool(&[0x01]).unwrap());
        assert!(!to_bool(&[0x00]).unwrap());
        assert!(to_bool(&[]).is_err());
    }

    #[test]
    fn test_integers_are_big_endian() {
        assert_eq!(to_bytes_i32(1), vec![0, 0, 0, 1]);
        assert_eq!(to_bytes_i64(-1), vec![0xFF; 8]);
        assert_eq!(to_i32(&[0, 0, 1, 0]).unwrap(), 256);
        assert_eq!(to_i64(&to_bytes_i64(i64::MIN)).unwrap(), i64::MIN);
    }

    #[test]
    fn test_floats_use_bit_patterns() {
        assert_eq!(to_bytes_f32(1.0), vec![0x3F, 0x80, 0, 0]);
        assert_eq!(to_f64(&to_bytes_f64(-2.5)).unwrap(), -2.5);
        assert!(to_f32(&to_bytes_f32(f32::NAN)).unwrap().is_nan());
    }

    #[test]
    fn test_wrong_length_reports_sizes() {
        assert_eq!(
            to_i64(&[1, 2, 3]),
            Err(EncodingError::WrongLength {
                target: "i64",
                expected: 8,
                actual: 3
            })
        );
        assert_eq!(to_i32(&[0; 5]).unwrap_err().kind(), ErrorKind::Encoding);
    }

    #[test]
    fn test_utf8() {
        assert_eq!(to_str(&to_bytes_str("héllo")).unwrap(), "héllo");
        assert_eq!(to_str(&[b'a', 0xC3]), Err(EncodingError::InvalidUtf8(1)));
    }

    #[test]
    fn test_binary_notation() {
        assert_eq!(to_bytes_binary("a\\x00\\xff").unwrap(), vec![b'a', 0x00, 0xFF]);
        assert_eq!(to_string_binary(&[b'a', 0x00, 0xFF]), "a\\x00\\xFF");

        let raw = vec![0x5C, 0x01, b'k', 0x80];
        assert_eq!(to_bytes_binary(&to_string_binary(&raw)).unwrap(), raw);
    }

    #[test]
    fn test_binary_rejects_malformed_escapes() {
        assert_eq!(to_bytes_binary("\\x0"), Err(EncodingError::BadEscape(0)));
        assert_eq!(to_bytes_binary("ab\\y00"), Err(EncodingError::BadEscape(2)));
        assert_eq!(to_bytes_binary("\\xZZ"), Err(EncodingError::BadEscape(0)));
    }
}
