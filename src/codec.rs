//! The [`Relish`] trait and its implementations for the built-in types.

use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};
use std::mem;
use std::sync::Arc;

use crate::len::write_len;
use crate::pool::Scratch;
use crate::types::WireSize;
use crate::{Error, ErrorKind, Input, Null, Result, TypeId};

/// A type with a Relish wire representation.
///
/// `write_body` and `read_body` operate on the content region of a TLV: the
/// bytes after the type id. For variable-size types the content region on
/// write includes its own length prefix, while on read the caller has
/// already resolved the prefix and hands over exactly the content bytes.
/// This asymmetry is what the array and map element rules require, so the
/// same methods serve both standalone values and container elements.
pub trait Relish: Sized {
    /// The type id identifying this type on the wire.
    const TYPE_ID: TypeId;

    /// Appends the content encoding of `self` to `out`.
    fn write_body(&self, out: &mut Vec<u8>) -> Result<()>;

    /// Parses a value from exactly the content bytes in `input`.
    fn read_body(input: &mut Input<'_>) -> Result<Self>;

    /// Parses content into an existing value.
    ///
    /// The default replaces `self` wholesale; derived struct implementations
    /// override it to update only the fields present on the wire.
    #[doc(hidden)]
    fn read_body_into(&mut self, input: &mut Input<'_>) -> Result<()> {
        *self = Self::read_body(input)?;
        Ok(())
    }

    /// Appends the full TLV of `self` (type id plus content) to `out`.
    #[doc(hidden)]
    fn write_tlv(&self, out: &mut Vec<u8>) -> Result<()> {
        out.push(Self::TYPE_ID as u8);
        self.write_body(out)
    }
}

macro_rules! impl_relish_numeric {
    ($ty:ty, $type_id:expr) => {
        impl Relish for $ty {
            const TYPE_ID: TypeId = $type_id;

            fn write_body(&self, out: &mut Vec<u8>) -> Result<()> {
                out.extend_from_slice(&self.to_le_bytes());
                Ok(())
            }

            fn read_body(input: &mut Input<'_>) -> Result<Self> {
                const SIZE: usize = mem::size_of::<$ty>();
                let raw: [u8; SIZE] = input.bytes(SIZE)?.try_into().unwrap();
                Ok(<$ty>::from_le_bytes(raw))
            }
        }
    };
}

impl_relish_numeric!(u8, TypeId::U8);
impl_relish_numeric!(u16, TypeId::U16);
impl_relish_numeric!(u32, TypeId::U32);
impl_relish_numeric!(u64, TypeId::U64);
impl_relish_numeric!(u128, TypeId::U128);
impl_relish_numeric!(i8, TypeId::I8);
impl_relish_numeric!(i16, TypeId::I16);
impl_relish_numeric!(i32, TypeId::I32);
impl_relish_numeric!(i64, TypeId::I64);
impl_relish_numeric!(i128, TypeId::I128);
impl_relish_numeric!(f32, TypeId::F32);
impl_relish_numeric!(f64, TypeId::F64);

impl Relish for bool {
    const TYPE_ID: TypeId = TypeId::Bool;

    fn write_body(&self, out: &mut Vec<u8>) -> Result<()> {
        out.push(if *self { 0xFF } else { 0x00 });
        Ok(())
    }

    fn read_body(input: &mut Input<'_>) -> Result<Self> {
        let off = input.offset();
        match input.byte()? {
            0x00 => Ok(false),
            0xFF => Ok(true),
            b => Err(Error::at(ErrorKind::InvalidBool(b), off)),
        }
    }
}

impl Relish for Null {
    const TYPE_ID: TypeId = TypeId::Null;

    fn write_body(&self, _out: &mut Vec<u8>) -> Result<()> {
        Ok(())
    }

    fn read_body(_input: &mut Input<'_>) -> Result<Self> {
        Ok(Null)
    }
}

fn read_str_body<'a>(input: &mut Input<'a>) -> Result<&'a str> {
    let off = input.offset();
    let raw = input.bytes(input.remaining())?;
    std::str::from_utf8(raw)
        .map_err(|e| Error::at(ErrorKind::InvalidUtf8, off + e.valid_up_to() as u64))
}

impl Relish for String {
    const TYPE_ID: TypeId = TypeId::String;

    fn write_body(&self, out: &mut Vec<u8>) -> Result<()> {
        write_len(out, self.len())?;
        out.extend_from_slice(self.as_bytes());
        Ok(())
    }

    fn read_body(input: &mut Input<'_>) -> Result<Self> {
        Ok(read_str_body(input)?.to_owned())
    }
}

impl Relish for Arc<str> {
    const TYPE_ID: TypeId = TypeId::String;

    fn write_body(&self, out: &mut Vec<u8>) -> Result<()> {
        write_len(out, self.len())?;
        out.extend_from_slice(self.as_bytes());
        Ok(())
    }

    fn read_body(input: &mut Input<'_>) -> Result<Self> {
        Ok(Arc::from(read_str_body(input)?))
    }
}

impl<T: Relish> Relish for Vec<T> {
    const TYPE_ID: TypeId = TypeId::Array;

    fn write_body(&self, out: &mut Vec<u8>) -> Result<()> {
        reject_zero_size_element(T::TYPE_ID)?;
        let mut body = Scratch::acquire();
        body.push(T::TYPE_ID as u8);
        for elem in self {
            elem.write_body(&mut body)?;
        }
        write_len(out, body.len())?;
        out.extend_from_slice(&body);
        Ok(())
    }

    fn read_body(input: &mut Input<'_>) -> Result<Self> {
        let elem = read_element_type(input, T::TYPE_ID)?;

        let mut elements = Vec::new();
        if let WireSize::Fixed(size) = elem.wire_size()
            && size > 0
        {
            elements.reserve(input.remaining() / size);
        }
        while !input.is_empty() {
            let mut body = input.body(elem)?;
            elements.push(T::read_body(&mut body)?);
        }
        Ok(elements)
    }
}

impl Relish for bytes::Bytes {
    const TYPE_ID: TypeId = TypeId::Array;

    fn write_body(&self, out: &mut Vec<u8>) -> Result<()> {
        write_len(out, 1 + self.len())?;
        out.push(TypeId::U8 as u8);
        out.extend_from_slice(self);
        Ok(())
    }

    fn read_body(input: &mut Input<'_>) -> Result<Self> {
        read_element_type(input, TypeId::U8)?;
        let raw = input.bytes(input.remaining())?;
        Ok(bytes::Bytes::copy_from_slice(raw))
    }
}

impl<K, V, S> Relish for HashMap<K, V, S>
where
    K: Relish + Eq + Hash,
    V: Relish,
    S: BuildHasher + Default,
{
    const TYPE_ID: TypeId = TypeId::Map;

    fn write_body(&self, out: &mut Vec<u8>) -> Result<()> {
        reject_zero_size_element(K::TYPE_ID)?;
        reject_zero_size_element(V::TYPE_ID)?;
        let mut body = Scratch::acquire();
        body.push(K::TYPE_ID as u8);
        body.push(V::TYPE_ID as u8);
        for (key, value) in self {
            key.write_body(&mut body)?;
            value.write_body(&mut body)?;
        }
        write_len(out, body.len())?;
        out.extend_from_slice(&body);
        Ok(())
    }

    fn read_body(input: &mut Input<'_>) -> Result<Self> {
        let key_ty = read_element_type(input, K::TYPE_ID)?;
        let value_ty = read_element_type(input, V::TYPE_ID)?;

        let mut map = HashMap::default();
        while !input.is_empty() {
            let off = input.offset();
            let mut key_body = input.body(key_ty)?;
            let key = K::read_body(&mut key_body)?;
            let mut value_body = input.body(value_ty)?;
            let value = V::read_body(&mut value_body)?;
            // Key equality coincides with byte-equal payloads for every
            // wire type, so the map insert doubles as the duplicate check.
            if map.insert(key, value).is_some() {
                return Err(Error::at(ErrorKind::DuplicateMapKey, off));
            }
        }
        Ok(map)
    }
}

/// Reads and validates the element-type byte of an array or map header.
fn read_element_type(input: &mut Input<'_>, expected: TypeId) -> Result<TypeId> {
    let off = input.offset();
    let b = input.byte()?;
    let ty = TypeId::from_byte(b).ok_or_else(|| Error::at(ErrorKind::InvalidTypeId(b), off))?;
    if ty != expected {
        return Err(Error::at(
            ErrorKind::TypeMismatch { expected, found: b },
            off,
        ));
    }
    if ty.wire_size() == WireSize::Fixed(0) {
        return Err(Error::at(ErrorKind::InvalidElementType(b), off));
    }
    Ok(ty)
}

/// Rejects zero-size types in container element slots. Such an element
/// contributes no bytes, so a length-delimited container cannot carry its
/// element count and a decode loop over it could never make progress.
pub(crate) fn reject_zero_size_element(ty: TypeId) -> Result<()> {
    if ty.wire_size() == WireSize::Fixed(0) {
        return Err(Error::new(ErrorKind::InvalidElementType(ty as u8)));
    }
    Ok(())
}

#[cfg(feature = "chrono")]
impl Relish for chrono::DateTime<chrono::Utc> {
    const TYPE_ID: TypeId = TypeId::Timestamp;

    fn write_body(&self, out: &mut Vec<u8>) -> Result<()> {
        let secs =
            u64::try_from(self.timestamp()).map_err(|_| Error::new(ErrorKind::TimestampRange))?;
        out.extend_from_slice(&secs.to_le_bytes());
        Ok(())
    }

    fn read_body(input: &mut Input<'_>) -> Result<Self> {
        let off = input.offset();
        let raw: [u8; 8] = input.bytes(8)?.try_into().unwrap();
        let secs = u64::from_le_bytes(raw);
        i64::try_from(secs)
            .ok()
            .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
            .ok_or_else(|| Error::at(ErrorKind::TimestampRange, off))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use bytes::Bytes;

    use super::*;
    use crate::{from_slice, to_vec};

    #[track_caller]
    fn assert_roundtrips<T: Relish + PartialEq + std::fmt::Debug>(value: T, bytes: &[u8]) {
        assert_eq!(to_vec(&value).unwrap(), bytes);
        assert_eq!(from_slice::<T>(bytes).unwrap(), value);
    }

    #[test]
    fn test_null() {
        assert_roundtrips(Null, &[0x00]);
    }

    #[test]
    fn test_bool() {
        assert_roundtrips(true, &[0x01, 0xFF]);
        assert_roundtrips(false, &[0x01, 0x00]);
    }

    #[test]
    fn test_bool_rejects_other_bytes() {
        let err = from_slice::<bool>(&[0x01, 0x42]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidBool(0x42)));
        assert_eq!(err.offset(), Some(1));

        let err = from_slice::<bool>(&[0x01, 0x01]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidBool(0x01)));
    }

    #[test]
    fn test_unsigned_integers() {
        assert_roundtrips(42u8, &[0x02, 0x2A]);
        assert_roundtrips(255u8, &[0x02, 0xFF]);
        assert_roundtrips(0x1234u16, &[0x03, 0x34, 0x12]);
        assert_roundtrips(42u32, &[0x04, 0x2A, 0x00, 0x00, 0x00]);
        assert_roundtrips(
            1u64 << 40,
            &[0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00],
        );
        assert_roundtrips(
            u128::MAX,
            &[
                0x06, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
                0xFF, 0xFF, 0xFF, 0xFF,
            ],
        );
    }

    #[test]
    fn test_signed_integers() {
        assert_roundtrips(-1i8, &[0x07, 0xFF]);
        assert_roundtrips(-2i16, &[0x08, 0xFE, 0xFF]);
        assert_roundtrips(-42i32, &[0x09, 0xD6, 0xFF, 0xFF, 0xFF]);
        assert_roundtrips(
            -1234567890i64,
            &[0x0A, 0x2E, 0xFD, 0x69, 0xB6, 0xFF, 0xFF, 0xFF, 0xFF],
        );
        assert_roundtrips(
            -1i128,
            &[
                0x0B, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
                0xFF, 0xFF, 0xFF, 0xFF,
            ],
        );
    }

    #[test]
    fn test_floats() {
        assert_roundtrips(std::f32::consts::PI, &[0x0C, 0xDB, 0x0F, 0x49, 0x40]);
        assert_roundtrips(
            1.5f64,
            &[0x0D, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xF8, 0x3F],
        );
    }

    #[test]
    fn test_truncated_content() {
        let err = from_slice::<u32>(&[0x04, 0x2A]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnexpectedEof));

        let err = from_slice::<bool>(&[0x01]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnexpectedEof));
    }

    #[test]
    fn test_type_mismatch() {
        let err = from_slice::<bool>(&[0x04, 0x2A, 0x00, 0x00, 0x00]).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::TypeMismatch {
                expected: TypeId::Bool,
                found: 0x04,
            }
        ));
        assert_eq!(err.offset(), Some(0));
    }

    #[test]
    fn test_reserved_type_byte() {
        let err = from_slice::<u8>(&[0x80]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidTypeId(0x80)));
    }

    #[test]
    fn test_string() {
        assert_roundtrips(
            "Hello, Relish!".to_string(),
            &[
                0x0E, 0x1C, b'H', b'e', b'l', b'l', b'o', b',', b' ', b'R', b'e', b'l', b'i',
                b's', b'h', b'!',
            ],
        );
        assert_roundtrips(String::new(), &[0x0E, 0x00]);
    }

    #[test]
    fn test_string_rejects_invalid_utf8() {
        let err = from_slice::<String>(&[0x0E, 0x08, 0xFF, 0xFE, 0xFD, 0xFC]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidUtf8));
        assert_eq!(err.offset(), Some(2));
    }

    #[test]
    fn test_arc_str_matches_string_encoding() {
        let arc: Arc<str> = Arc::from("shared");
        assert_eq!(to_vec(&arc).unwrap(), to_vec(&"shared".to_string()).unwrap());
        assert_roundtrips(arc, &[0x0E, 0x0C, b's', b'h', b'a', b'r', b'e', b'd']);
    }

    #[test]
    fn test_vec_fixed_elements() {
        assert_roundtrips(
            vec![1u32, 2, 3, 4],
            &[
                0x0F, 0x22, 0x04, 0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x03, 0x00,
                0x00, 0x00, 0x04, 0x00, 0x00, 0x00,
            ],
        );
        assert_roundtrips(Vec::<u32>::new(), &[0x0F, 0x02, 0x04]);
    }

    #[test]
    fn test_vec_varsize_elements() {
        assert_roundtrips(
            vec!["foo".to_string(), "bar".to_string(), "baz".to_string()],
            &[
                0x0F, 0x1A, 0x0E, 0x06, b'f', b'o', b'o', 0x06, b'b', b'a', b'r', 0x06, b'b',
                b'a', b'z',
            ],
        );
    }

    #[test]
    fn test_vec_element_type_mismatch() {
        let err = from_slice::<Vec<u32>>(&[0x0F, 0x0A, 0x02, 0x01, 0x02, 0x03, 0x04]).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::TypeMismatch {
                expected: TypeId::U32,
                found: 0x02,
            }
        ));
        assert_eq!(err.offset(), Some(2));
    }

    #[test]
    fn test_bytes_matches_vec_u8() {
        let raw = vec![0xDEu8, 0xAD, 0xBE, 0xEF];
        let fast = Bytes::from(raw.clone());
        assert_eq!(to_vec(&fast).unwrap(), to_vec(&raw).unwrap());
        assert_roundtrips(fast, &[0x0F, 0x0A, 0x02, 0xDE, 0xAD, 0xBE, 0xEF]);
        assert_roundtrips(Bytes::new(), &[0x0F, 0x02, 0x02]);
    }

    #[test]
    fn test_map() {
        let mut map = HashMap::new();
        map.insert(1u32, 10u32);
        assert_roundtrips(
            map,
            &[
                0x10, 0x14, 0x04, 0x04, 0x01, 0x00, 0x00, 0x00, 0x0A, 0x00, 0x00, 0x00,
            ],
        );
        assert_roundtrips(HashMap::<u32, u32>::new(), &[0x10, 0x04, 0x04, 0x04]);

        let mut by_name = HashMap::new();
        by_name.insert(1u32, "foo".to_string());
        assert_roundtrips(
            by_name,
            &[
                0x10, 0x14, 0x04, 0x0E, 0x01, 0x00, 0x00, 0x00, 0x06, b'f', b'o', b'o',
            ],
        );
    }

    #[test]
    fn test_map_rejects_duplicate_keys() {
        let data = [
            0x10, 0x24, 0x04, 0x04, 0x01, 0x00, 0x00, 0x00, 0x0A, 0x00, 0x00, 0x00, 0x01, 0x00,
            0x00, 0x00, 0x14, 0x00, 0x00, 0x00,
        ];
        let err = from_slice::<HashMap<u32, u32>>(&data).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::DuplicateMapKey));
        assert_eq!(err.offset(), Some(12));
    }

    #[test]
    fn test_null_rejected_as_array_element_type() {
        // Zero-size elements contribute no bytes, so the element count
        // cannot survive a round trip. Encoding must refuse outright.
        let err = to_vec(&vec![Null, Null, Null]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidElementType(0x00)));

        let err = from_slice::<Vec<Null>>(&[0x0F, 0x02, 0x00]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidElementType(0x00)));
        assert_eq!(err.offset(), Some(2));

        // A stray content byte after the Null element type must error, not
        // spin on elements that never consume input.
        let err = from_slice::<Vec<Null>>(&[0x0F, 0x04, 0x00, 0xFF]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidElementType(0x00)));
    }

    #[test]
    fn test_null_rejected_as_map_value_type() {
        let mut map = HashMap::new();
        map.insert(1u32, Null);
        let err = to_vec(&map).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidElementType(0x00)));

        let err = from_slice::<HashMap<u32, Null>>(&[0x10, 0x04, 0x04, 0x00]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidElementType(0x00)));
        assert_eq!(err.offset(), Some(3));
    }

    #[cfg(feature = "chrono")]
    #[test]
    fn test_timestamp() {
        use chrono::DateTime;

        // 2009-02-13 23:31:30 UTC.
        assert_roundtrips(
            DateTime::from_timestamp(1234567890, 0).unwrap(),
            &[0x13, 0xD2, 0x02, 0x96, 0x49, 0x00, 0x00, 0x00, 0x00],
        );
        assert_roundtrips(
            DateTime::from_timestamp(0, 0).unwrap(),
            &[0x13, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
        );
    }

    #[cfg(feature = "chrono")]
    #[test]
    fn test_timestamp_out_of_range() {
        use chrono::DateTime;

        let data = [0x13, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
        let err = from_slice::<DateTime<chrono::Utc>>(&data).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::TimestampRange));

        let before_epoch = DateTime::from_timestamp(-1, 0).unwrap();
        let err = to_vec(&before_epoch).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::TimestampRange));
    }
}
