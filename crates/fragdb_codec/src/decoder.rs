//! Binary value decoder.
//!
//! Positional decoder over a byte slice. `decode` consumes exactly one
//! value, which is what the archive relies on to unpack a single fragment
//! at a seeked offset without touching the rest of the file.

use crate::error::{CodecError, CodecResult};
use crate::value::Value;

/// Decode one value from the start of `bytes`.
pub fn from_bytes(bytes: &[u8]) -> CodecResult<Value> {
    let mut decoder = Decoder::new(bytes);
    decoder.decode()
}

/// Decode one value starting at `offset` within `bytes`.
pub fn decode_at(bytes: &[u8], offset: usize) -> CodecResult<Value> {
    if offset > bytes.len() {
        return Err(CodecError::UnexpectedEof);
    }
    let mut decoder = Decoder::new(&bytes[offset..]);
    decoder.decode()
}

/// Maximum allowed element count for arrays and maps.
/// Guards against allocation blow-up from corrupt length headers.
const MAX_CONTAINER_ELEMENTS: u64 = 16 * 1024 * 1024;

/// Maximum allowed byte/string length, same rationale.
const MAX_BYTES_LENGTH: u64 = 256 * 1024 * 1024;

/// A positional value decoder.
pub struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    /// Create a new decoder for the given bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Decode the next value.
    pub fn decode(&mut self) -> CodecResult<Value> {
        let initial_byte = self.read_byte()?;
        let major_type = initial_byte >> 5;
        let additional_info = initial_byte & 0x1f;

        match major_type {
            0 => self
                .decode_unsigned(additional_info)
                .and_then(|n| i64::try_from(n).map_err(|_| CodecError::invalid_structure("integer out of i64 range")))
                .map(Value::Integer),
            1 => self.decode_unsigned(additional_info).and_then(|n| {
                // Negative integer: value is -(n+1).
                i64::try_from(n)
                    .map(|n| Value::Integer(-n - 1))
                    .map_err(|_| CodecError::invalid_structure("integer out of i64 range"))
            }),
            2 => self.decode_byte_string(additional_info),
            3 => self.decode_text(additional_info).map(Value::Text),
            4 => self.decode_array(additional_info),
            5 => self.decode_map(additional_info),
            6 => {
                // Tagged value: skip the tag, decode the inner value.
                let _tag = self.decode_unsigned(additional_info)?;
                self.decode()
            }
            7 => self.decode_simple(additional_info),
            _ => Err(CodecError::invalid_structure("invalid major type")),
        }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Check if all bytes have been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    #[inline]
    fn read_byte(&mut self) -> CodecResult<u8> {
        if self.pos >= self.data.len() {
            return Err(CodecError::UnexpectedEof);
        }
        let byte = self.data[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    #[inline]
    fn read_bytes(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        if self.data.len() - self.pos < len {
            return Err(CodecError::UnexpectedEof);
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    #[inline]
    fn decode_unsigned(&mut self, additional_info: u8) -> CodecResult<u64> {
        match additional_info {
            0..=23 => Ok(u64::from(additional_info)),
            24 => Ok(u64::from(self.read_byte()?)),
            25 => {
                let bytes = self.read_bytes(2)?;
                Ok(u64::from(u16::from_be_bytes([bytes[0], bytes[1]])))
            }
            26 => {
                let bytes = self.read_bytes(4)?;
                Ok(u64::from(u32::from_be_bytes([
                    bytes[0], bytes[1], bytes[2], bytes[3],
                ])))
            }
            27 => {
                let bytes = self.read_bytes(8)?;
                Ok(u64::from_be_bytes([
                    bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
                ]))
            }
            28..=30 => Err(CodecError::invalid_structure("reserved additional info")),
            31 => Err(CodecError::IndefiniteLengthForbidden),
            _ => unreachable!(),
        }
    }

    fn decode_length(&mut self, additional_info: u8, max: u64) -> CodecResult<usize> {
        if additional_info == 31 {
            return Err(CodecError::IndefiniteLengthForbidden);
        }
        let len = self.decode_unsigned(additional_info)?;
        if len > max {
            return Err(CodecError::SizeLimitExceeded {
                claimed: len,
                max_allowed: max,
            });
        }
        Ok(len as usize)
    }

    fn decode_byte_string(&mut self, additional_info: u8) -> CodecResult<Value> {
        let len = self.decode_length(additional_info, MAX_BYTES_LENGTH)?;
        let bytes = self.read_bytes(len)?;
        Ok(Value::Bytes(bytes.to_vec()))
    }

    fn decode_text(&mut self, additional_info: u8) -> CodecResult<String> {
        let len = self.decode_length(additional_info, MAX_BYTES_LENGTH)?;
        let bytes = self.read_bytes(len)?;
        let text = std::str::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)?;
        Ok(text.to_string())
    }

    fn decode_array(&mut self, additional_info: u8) -> CodecResult<Value> {
        let len = self.decode_length(additional_info, MAX_CONTAINER_ELEMENTS)?;
        let mut items = Vec::with_capacity(len.min(4096));
        for _ in 0..len {
            items.push(self.decode()?);
        }
        Ok(Value::Array(items))
    }

    fn decode_map(&mut self, additional_info: u8) -> CodecResult<Value> {
        let len = self.decode_length(additional_info, MAX_CONTAINER_ELEMENTS)?;
        let mut pairs = Vec::with_capacity(len.min(4096));
        for _ in 0..len {
            let key = match self.decode()? {
                Value::Text(s) => s,
                _ => return Err(CodecError::NonStringKey),
            };
            let value = self.decode()?;
            pairs.push((key, value));
        }
        Ok(Value::Map(pairs))
    }

    fn decode_simple(&mut self, additional_info: u8) -> CodecResult<Value> {
        match additional_info {
            20 => Ok(Value::Bool(false)),
            21 => Ok(Value::Bool(true)),
            22 => Ok(Value::Null),
            // undefined: treat as null
            23 => Ok(Value::Null),
            24 => {
                let simple = self.read_byte()?;
                Err(CodecError::unsupported_type(format!(
                    "simple value {simple}"
                )))
            }
            25 => {
                let bytes = self.read_bytes(2)?;
                let half = u16::from_be_bytes([bytes[0], bytes[1]]);
                Ok(Value::Float(decode_half(half)))
            }
            26 => {
                let bytes = self.read_bytes(4)?;
                let x = f32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                Ok(Value::Float(f64::from(x)))
            }
            27 => {
                let bytes = self.read_bytes(8)?;
                Ok(Value::Float(f64::from_be_bytes([
                    bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
                ])))
            }
            28..=30 => Err(CodecError::invalid_structure("reserved additional info")),
            31 => Err(CodecError::invalid_structure("break without indefinite")),
            _ => Err(CodecError::unsupported_type(format!(
                "simple value {additional_info}"
            ))),
        }
    }
}

/// Expand an IEEE-754 half-precision float to f64.
fn decode_half(half: u16) -> f64 {
    let sign = if half & 0x8000 != 0 { -1.0 } else { 1.0 };
    let exponent = (half >> 10) & 0x1f;
    let mantissa = f64::from(half & 0x3ff);

    let magnitude = match exponent {
        0 => mantissa * 2f64.powi(-24),
        31 => {
            if mantissa == 0.0 {
                f64::INFINITY
            } else {
                f64::NAN
            }
        }
        _ => (1.0 + mantissa / 1024.0) * 2f64.powi(i32::from(exponent) - 15),
    };
    sign * magnitude
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::to_bytes;

    #[test]
    fn decode_scalars() {
        assert_eq!(from_bytes(&[0xf6]).unwrap(), Value::Null);
        assert_eq!(from_bytes(&[0xf4]).unwrap(), Value::Bool(false));
        assert_eq!(from_bytes(&[0xf5]).unwrap(), Value::Bool(true));
        assert_eq!(from_bytes(&[0x17]).unwrap(), Value::Integer(23));
        assert_eq!(from_bytes(&[0x18, 24]).unwrap(), Value::Integer(24));
        assert_eq!(from_bytes(&[0x20]).unwrap(), Value::Integer(-1));
        assert_eq!(from_bytes(&[0x38, 99]).unwrap(), Value::Integer(-100));
    }

    #[test]
    fn decode_floats() {
        // f64
        let mut bytes = vec![0xfb];
        bytes.extend_from_slice(&0.25f64.to_be_bytes());
        assert_eq!(from_bytes(&bytes).unwrap(), Value::Float(0.25));

        // f32
        let mut bytes = vec![0xfa];
        bytes.extend_from_slice(&1.5f32.to_be_bytes());
        assert_eq!(from_bytes(&bytes).unwrap(), Value::Float(1.5));

        // f16: 1.0 is 0x3c00
        assert_eq!(
            from_bytes(&[0xf9, 0x3c, 0x00]).unwrap(),
            Value::Float(1.0)
        );
    }

    #[test]
    fn decode_containers() {
        assert_eq!(from_bytes(&[0x80]).unwrap(), Value::Array(vec![]));
        assert_eq!(
            from_bytes(&[0x82, 0x01, 0x02]).unwrap(),
            Value::Array(vec![Value::Integer(1), Value::Integer(2)])
        );
        assert_eq!(
            from_bytes(&[0xa1, 0x61, b'a', 0x01]).unwrap(),
            Value::map(vec![("a".to_string(), Value::Integer(1))])
        );
    }

    #[test]
    fn map_order_survives_roundtrip() {
        let map = Value::map(vec![
            ("zeta".to_string(), Value::Integer(1)),
            ("alpha".to_string(), Value::Integer(2)),
        ]);
        let bytes = to_bytes(&map).unwrap();
        assert_eq!(from_bytes(&bytes).unwrap(), map);
    }

    #[test]
    fn non_string_map_key_rejected() {
        // map { 1: 2 }
        assert_eq!(
            from_bytes(&[0xa1, 0x01, 0x02]),
            Err(CodecError::NonStringKey)
        );
    }

    #[test]
    fn decode_at_mid_stream() {
        let first = to_bytes(&Value::Text("padding".to_string())).unwrap();
        let second = to_bytes(&Value::Integer(99)).unwrap();
        let mut stream = first.clone();
        stream.extend_from_slice(&second);

        assert_eq!(
            decode_at(&stream, first.len()).unwrap(),
            Value::Integer(99)
        );
        assert_eq!(decode_at(&stream, stream.len() + 1), Err(CodecError::UnexpectedEof));
    }

    #[test]
    fn decode_stops_after_one_value() {
        let bytes = to_bytes(&Value::Integer(300)).unwrap();
        let mut stream = bytes.clone();
        stream.extend_from_slice(&[0xde, 0xad]); // trailing garbage

        let mut decoder = Decoder::new(&stream);
        assert_eq!(decoder.decode().unwrap(), Value::Integer(300));
        assert_eq!(decoder.position(), bytes.len());
    }

    #[test]
    fn truncated_input_fails() {
        assert_eq!(from_bytes(&[]), Err(CodecError::UnexpectedEof));
        assert_eq!(from_bytes(&[0x18]), Err(CodecError::UnexpectedEof));
        assert_eq!(
            from_bytes(&[0x62, b'h']),
            Err(CodecError::UnexpectedEof)
        );
    }

    #[test]
    fn indefinite_length_rejected() {
        assert!(matches!(
            from_bytes(&[0x9f, 0x01, 0xff]),
            Err(CodecError::IndefiniteLengthForbidden)
        ));
        assert!(matches!(
            from_bytes(&[0x5f, 0x41, b'a', 0xff]),
            Err(CodecError::IndefiniteLengthForbidden)
        ));
    }

    #[test]
    fn invalid_utf8_rejected() {
        assert_eq!(
            from_bytes(&[0x62, 0xff, 0xfe]),
            Err(CodecError::InvalidUtf8)
        );
    }

    #[test]
    fn tagged_value_unwrapped() {
        // tag 0 around text "x"
        assert_eq!(
            from_bytes(&[0xc0, 0x61, b'x']).unwrap(),
            Value::Text("x".to_string())
        );
    }
}
