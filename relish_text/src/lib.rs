//! relish_text implements RTR, the human-readable text representation for
//! Relish binary data.
//!
//! An RTR document is an optional preamble of field aliases followed by one
//! top-level struct literal:
//!
//! ```text
//! let id = 1: u64;
//! let name = 2: string;
//! struct {
//!     id: 42u64;
//!     name: "Ada";
//!     3: array<string>["x", "y"];
//! }
//! ```
//!
//! [`compile`] lowers a document to Relish bytes and [`render`] turns any
//! Relish value back into a document the parser accepts. The `rltc` binary
//! wraps both directions for the command line.

mod error;
mod format;
mod lexer;
mod parser;

use relish::Value;

pub use crate::error::TextError;
pub use crate::format::format_value;
pub use crate::parser::parse_document;

/// Parses an RTR document and encodes it as Relish bytes.
pub fn compile(src: &str) -> Result<Vec<u8>, TextError> {
    let value = parse_document(src)?;
    Ok(value.to_vec()?)
}

/// Renders Relish bytes as an RTR document.
pub fn render(data: &[u8]) -> Result<String, TextError> {
    Ok(format_value(&Value::from_slice(data)?))
}

#[cfg(test)]
mod tests {
    use relish::{TypeId, Value};

    use super::*;

    #[test]
    fn test_compile_simple_struct() {
        let src = r#"
            let id = 1: u64;
            let name = 2: string;
            struct { id: 42u64; name: "Ada"; }
        "#;
        assert_eq!(
            compile(src).unwrap(),
            vec![
                0x11, 0x20, 0x01, 0x05, 0x2A, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02,
                0x0E, 0x06, b'A', b'd', b'a',
            ]
        );
    }

    #[test]
    fn test_compile_array_of_strings() {
        let src = r#"struct { 10: array<string>["a", "b", "c"]; }"#;
        assert_eq!(
            compile(src).unwrap(),
            vec![
                0x11, 0x14, 0x0A, 0x0F, 0x0E, 0x0E, 0x02, b'a', 0x02, b'b', 0x02, b'c',
            ]
        );
    }

    #[test]
    fn test_compile_rejects_null_array_elements() {
        let err = compile("struct { 0: array<null>[null, null, null]; }").unwrap_err();
        assert!(matches!(
            err,
            TextError::Codec(e) if matches!(e.kind(), relish::ErrorKind::InvalidElementType(0x00))
        ));
    }

    #[test]
    fn test_compile_rejects_duplicate_map_keys() {
        let src = r#"struct { 0: map<string, string> { "a": "x", "a": "y" }; }"#;
        let err = compile(src).unwrap_err();
        assert!(matches!(
            err,
            TextError::Codec(e) if matches!(e.kind(), relish::ErrorKind::DuplicateMapKey)
        ));
    }

    #[test]
    fn test_render_round_trips() {
        let value = Value::Struct {
            fields: vec![
                (0, Value::U32(42)),
                (1, Value::String("hi \"there\"\n".to_string())),
                (2, Value::F64(1.5e-7)),
                (3, Value::Timestamp(1234567890)),
                (
                    4,
                    Value::Array {
                        element_type: TypeId::String,
                        elements: vec![Value::String("a".to_string())],
                    },
                ),
                (
                    5,
                    Value::Enum {
                        variant_id: 2,
                        value: Box::new(Value::I64(-1)),
                    },
                ),
                (
                    6,
                    Value::Map {
                        key_type: TypeId::String,
                        value_type: TypeId::U32,
                        entries: vec![(Value::String("k".to_string()), Value::U32(1))],
                    },
                ),
                (7, Value::U128(u128::MAX)),
            ],
        };
        let bytes = value.to_vec().unwrap();
        let text = render(&bytes).unwrap();
        assert_eq!(compile(&text).unwrap(), bytes);
    }

    #[test]
    fn test_render_nested_containers() {
        let value = Value::Struct {
            fields: vec![(
                0,
                Value::Array {
                    element_type: TypeId::Array,
                    elements: vec![
                        Value::Array {
                            element_type: TypeId::U8,
                            elements: vec![Value::U8(1)],
                        },
                        Value::Array {
                            element_type: TypeId::U8,
                            elements: vec![Value::U8(2), Value::U8(3)],
                        },
                    ],
                },
            )],
        };
        let bytes = value.to_vec().unwrap();
        let text = render(&bytes).unwrap();
        assert_eq!(compile(&text).unwrap(), bytes);
    }
}
