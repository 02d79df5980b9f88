//! Relish is a binary serialization format library designed for efficient
//! encoding, explicit backwards compatibility through field tagging, and
//! flexible type serialization.
//!
//! The format is Type-[Length]-Value: a type id byte followed by either a
//! fixed-size content region or a tagged-varint length prefix and that many
//! content bytes. Structs tag every field with a stable 7-bit id, so old
//! decoders skip fields they do not know and new decoders tolerate old data.
//!
//! # One-shot encoding
//!
//! ```
//! use relish::{Relish, from_slice, to_vec};
//!
//! #[derive(Debug, PartialEq, Relish)]
//! struct Greeting {
//!     #[relish(field_id = 0)]
//!     count: u32,
//!     #[relish(field_id = 1)]
//!     text: Option<String>,
//! }
//!
//! let value = Greeting { count: 2, text: Some("hi".to_string()) };
//! let bytes = to_vec(&value).unwrap();
//! let back: Greeting = from_slice(&bytes).unwrap();
//! assert_eq!(back, value);
//! ```
//!
//! # Streaming
//!
//! [`Encoder`] and [`Decoder`] wrap any [`std::io::Write`] / [`std::io::Read`]
//! and expose per-type convenience methods plus `skip_value`. Schemaless data
//! can be inspected through the dynamic [`Value`] tree.

mod codec;
mod decode;
mod encode;
mod error;
mod input;
mod len;
mod pool;
mod schema;
mod types;
mod value;

pub use crate::codec::Relish;
pub use crate::decode::Decoder;
pub use crate::encode::Encoder;
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::input::Input;
pub use crate::types::{Null, TypeId};
pub use crate::value::Value;

#[doc(hidden)]
pub use crate::len::write_len;

#[doc(hidden)]
pub use crate::pool::Scratch;

#[doc(hidden)]
pub use crate::schema::{FieldBind, StructReader};

/// Re-export of the derive macro for implementing the [`Relish`] trait on
/// custom types.
///
/// Struct fields take `#[relish(field_id = N)]` with optional `omit_empty`,
/// or `#[relish(skip)]`; enum variants take `#[relish(field_id = N)]` and
/// carry exactly one payload.
pub use relish_derive::Relish;

/// Serializes a value to its Relish TLV bytes.
pub fn to_vec<T: Relish>(value: &T) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    value.write_tlv(&mut out)?;
    Ok(out)
}

/// Deserializes a fresh value from exactly one TLV, rejecting trailing
/// bytes.
pub fn from_slice<T: Relish>(data: &[u8]) -> Result<T> {
    let mut input = Input::new(data);
    let value = input.read_value()?;
    reject_trailing(&input)?;
    Ok(value)
}

/// Deserializes one TLV into an existing value.
///
/// Struct fields present on the wire overwrite their slots; absent fields
/// (including every `#[relish(skip)]` field) retain their prior value.
pub fn from_slice_into<T: Relish>(data: &[u8], dst: &mut T) -> Result<()> {
    let mut input = Input::new(data);
    input.read_value_into(dst)?;
    reject_trailing(&input)
}

fn reject_trailing(input: &Input<'_>) -> Result<()> {
    if !input.is_empty() {
        return Err(Error::at(
            ErrorKind::TrailingBytes(input.remaining()),
            input.offset(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_rejects_trailing_bytes() {
        let data = [0x04, 0x2A, 0x00, 0x00, 0x00, 0xFF, 0xEE];
        let err = from_slice::<u32>(&data).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::TrailingBytes(2)));
        assert_eq!(err.offset(), Some(5));
    }

    #[test]
    fn test_from_slice_into_overwrites() {
        let mut value = 7u32;
        from_slice_into(&[0x04, 0x2A, 0x00, 0x00, 0x00], &mut value).unwrap();
        assert_eq!(value, 42);
    }
}
