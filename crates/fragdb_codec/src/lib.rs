//! # fragdb Codec
//!
//! Self-describing binary value codec for fragdb archives.
//!
//! The wire format is a CBOR subset with two deliberate deviations from
//! canonical CBOR:
//! - map keys are UTF-8 strings kept in insertion order (archive offsets
//!   depend on stable re-encoding of the same document);
//! - floats are first-class and always written as 64-bit.
//!
//! The decoder is positional: it consumes exactly one value from a byte
//! slice, so a caller holding a byte offset can unpack a single fragment
//! out of a larger file.
//!
//! ```
//! use fragdb_codec::{to_bytes, from_bytes, Value};
//!
//! let value = Value::map(vec![("energy".to_string(), Value::Float(-7.25))]);
//! let bytes = to_bytes(&value).unwrap();
//! assert_eq!(from_bytes(&bytes).unwrap(), value);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod json;
mod value;

pub use decoder::{decode_at, from_bytes, Decoder};
pub use encoder::{to_bytes, Encoder};
pub use error::{CodecError, CodecResult};
pub use value::Value;

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::Integer),
            // NaN breaks equality; finite floats are enough here.
            (-1e12f64..1e12f64).prop_map(Value::Float),
            "[a-z0-9_]{0,12}".prop_map(Value::Text),
            proptest::collection::vec(any::<u8>(), 0..32).prop_map(Value::Bytes),
        ]
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        arb_scalar().prop_recursive(3, 48, 6, |inner| {
            prop_oneof![
                proptest::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                proptest::collection::vec(("[a-z][a-z0-9_]{0,8}", inner), 0..6)
                    .prop_map(Value::Map),
            ]
        })
    }

    proptest! {
        #[test]
        fn encode_decode_roundtrip(value in arb_value()) {
            let bytes = to_bytes(&value).unwrap();
            prop_assert_eq!(from_bytes(&bytes).unwrap(), value);
        }

        #[test]
        fn decoder_consumes_exact_length(value in arb_value()) {
            let bytes = to_bytes(&value).unwrap();
            let mut decoder = Decoder::new(&bytes);
            decoder.decode().unwrap();
            prop_assert_eq!(decoder.position(), bytes.len());
        }
    }
}
