//! Rendering of [`Value`] trees as RTR text.
//!
//! The output is accepted by the parser and round-trips to the same value,
//! so decoded binary data can be edited by hand and compiled back.

use std::fmt::Write;

use relish::{TypeId, Value};

/// RTR spelling of a type id, as used in casts, suffixes and container
/// headers.
pub(crate) fn type_name(ty: TypeId) -> &'static str {
    match ty {
        TypeId::Null => "null",
        TypeId::Bool => "bool",
        TypeId::U8 => "u8",
        TypeId::U16 => "u16",
        TypeId::U32 => "u32",
        TypeId::U64 => "u64",
        TypeId::U128 => "u128",
        TypeId::I8 => "i8",
        TypeId::I16 => "i16",
        TypeId::I32 => "i32",
        TypeId::I64 => "i64",
        TypeId::I128 => "i128",
        TypeId::F32 => "f32",
        TypeId::F64 => "f64",
        TypeId::String => "string",
        TypeId::Array => "array",
        TypeId::Map => "map",
        TypeId::Struct => "struct",
        TypeId::Enum => "enum",
        TypeId::Timestamp => "timestamp",
    }
}

/// Formats a value as RTR text.
pub fn format_value(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value, 0);
    out
}

fn write_value(out: &mut String, value: &Value, indent: usize) {
    let pad = "  ".repeat(indent);

    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
        Value::U8(v) => write!(out, "{v}u8").unwrap(),
        Value::U16(v) => write!(out, "{v}u16").unwrap(),
        Value::U32(v) => write!(out, "{v}u32").unwrap(),
        Value::U64(v) => write!(out, "{v}u64").unwrap(),
        Value::U128(v) => write!(out, "{v}u128").unwrap(),
        Value::I8(v) => write!(out, "{v}i8").unwrap(),
        Value::I16(v) => write!(out, "{v}i16").unwrap(),
        Value::I32(v) => write!(out, "{v}i32").unwrap(),
        Value::I64(v) => write!(out, "{v}i64").unwrap(),
        Value::I128(v) => write!(out, "{v}i128").unwrap(),
        Value::F32(v) => {
            if v.is_nan() {
                out.push_str("nanf32");
            } else if *v == f32::INFINITY {
                out.push_str("inff32");
            } else if *v == f32::NEG_INFINITY {
                out.push_str("neginff32");
            } else {
                // Debug formatting always keeps a fractional part or an
                // exponent, so the literal stays a float when parsed back.
                write!(out, "{v:?}f32").unwrap();
            }
        }
        Value::F64(v) => {
            if v.is_nan() {
                out.push_str("nanf64");
            } else if *v == f64::INFINITY {
                out.push_str("inff64");
            } else if *v == f64::NEG_INFINITY {
                out.push_str("neginff64");
            } else {
                write!(out, "{v:?}f64").unwrap();
            }
        }
        Value::String(s) => write_quoted(out, s),
        Value::Timestamp(secs) => write!(out, "ts({secs})").unwrap(),

        Value::Array {
            element_type,
            elements,
        } => {
            write!(out, "array<{}> [", type_name(*element_type)).unwrap();
            if elements.is_empty() {
                out.push(']');
            } else {
                out.push('\n');
                for elem in elements {
                    out.push_str(&pad);
                    out.push_str("  ");
                    write_value(out, elem, indent + 1);
                    out.push_str(",\n");
                }
                out.push_str(&pad);
                out.push(']');
            }
        }

        Value::Map {
            key_type,
            value_type,
            entries,
        } => {
            write!(
                out,
                "map<{}, {}> {{",
                type_name(*key_type),
                type_name(*value_type)
            )
            .unwrap();
            if entries.is_empty() {
                out.push('}');
            } else {
                out.push('\n');
                for (key, value) in entries {
                    out.push_str(&pad);
                    out.push_str("  ");
                    write_value(out, key, indent + 1);
                    out.push_str(": ");
                    write_value(out, value, indent + 1);
                    out.push_str(",\n");
                }
                out.push_str(&pad);
                out.push('}');
            }
        }

        Value::Struct { fields } => {
            out.push_str("struct {");
            if fields.is_empty() {
                out.push('}');
            } else {
                out.push('\n');
                for (id, value) in fields {
                    out.push_str(&pad);
                    write!(out, "  {id}: ").unwrap();
                    write_value(out, value, indent + 1);
                    out.push_str(",\n");
                }
                out.push_str(&pad);
                out.push('}');
            }
        }

        Value::Enum { variant_id, value } => {
            write!(out, "enum<{variant_id}>(").unwrap();
            write_value(out, value, indent);
            out.push(')');
        }
    }
}

fn write_quoted(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_ascii_control() => write!(out, "\\x{:02x}", c as u32).unwrap(),
            c => out.push(c),
        }
    }
    out.push('"');
}
