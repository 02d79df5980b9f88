use std::collections::HashMap;

use relish::{TypeId, Value};

use crate::TextError;
use crate::format::type_name;
use crate::lexer::{Lexer, Tok, describe};

/// Parses a complete RTR document: an optional alias preamble followed by
/// one top-level struct literal.
pub fn parse_document(src: &str) -> Result<Value, TextError> {
    let mut parser = Parser {
        lx: Lexer::new(src)?,
    };

    let mut aliases: HashMap<String, Alias> = HashMap::new();
    while parser.lx.tok == Tok::Let {
        let (name, alias) = parser.alias()?;
        if aliases.contains_key(&name) {
            return Err(TextError::DuplicateAlias(name));
        }
        aliases.insert(name, alias);
    }

    let value = parser.struct_literal(&aliases)?;
    if parser.lx.tok != Tok::Eof {
        return Err(parser.unexpected("end of input"));
    }
    Ok(value)
}

/// Type expression in type hints and container headers. Bare composite
/// names are allowed where only the wire type id matters, e.g.
/// `array<array>` for an array whose elements declare their own element
/// types.
#[derive(Clone)]
enum TypeExpr {
    Bare(TypeId),
    Array(Box<TypeExpr>),
    Map(Box<TypeExpr>, Box<TypeExpr>),
}

impl TypeExpr {
    fn type_id(&self) -> TypeId {
        match self {
            TypeExpr::Bare(id) => *id,
            TypeExpr::Array(_) => TypeId::Array,
            TypeExpr::Map(_, _) => TypeId::Map,
        }
    }
}

struct Alias {
    id: u8,
    ty: Option<TypeExpr>,
}

struct Parser<'a> {
    lx: Lexer<'a>,
}

impl Parser<'_> {
    fn unexpected(&self, wanted: &str) -> TextError {
        TextError::Syntax(format!("expected {wanted}, got {}", describe(&self.lx.tok)))
    }

    fn expect(&mut self, tok: Tok, wanted: &str) -> Result<(), TextError> {
        if self.lx.tok != tok {
            return Err(self.unexpected(wanted));
        }
        self.lx.bump()
    }

    /// `let NAME = ID [: TYPE] [;]`
    fn alias(&mut self) -> Result<(String, Alias), TextError> {
        self.lx.bump()?; // let
        let Tok::Ident(name) = self.lx.tok.clone() else {
            return Err(self.unexpected("an alias name after `let`"));
        };
        self.lx.bump()?;
        self.expect(Tok::Eq, "`=`")?;
        let id = self.small_id("a field id")?;
        let ty = if self.lx.tok == Tok::Colon {
            self.lx.bump()?;
            Some(self.type_expr()?)
        } else {
            None
        };
        if self.lx.tok == Tok::Semi {
            self.lx.bump()?;
        }
        Ok((name, Alias { id, ty }))
    }

    /// A decimal integer in 0..=127 (field or variant id).
    fn small_id(&mut self, wanted: &str) -> Result<u8, TextError> {
        let Tok::Int { lit, hex: false } = self.lx.tok.clone() else {
            return Err(self.unexpected(wanted));
        };
        self.lx.bump()?;
        let n: i64 = lit
            .replace('_', "")
            .parse()
            .map_err(|_| TextError::Syntax(format!("invalid id `{lit}`")))?;
        if !(0..=127).contains(&n) {
            return Err(TextError::IdRange(n));
        }
        Ok(n as u8)
    }

    fn type_expr(&mut self) -> Result<TypeExpr, TextError> {
        match self.lx.tok.clone() {
            Tok::Ident(name) => {
                let id = match name.as_str() {
                    "null" => TypeId::Null,
                    "bool" => TypeId::Bool,
                    "u8" => TypeId::U8,
                    "u16" => TypeId::U16,
                    "u32" => TypeId::U32,
                    "u64" => TypeId::U64,
                    "u128" => TypeId::U128,
                    "i8" => TypeId::I8,
                    "i16" => TypeId::I16,
                    "i32" => TypeId::I32,
                    "i64" => TypeId::I64,
                    "i128" => TypeId::I128,
                    "f32" => TypeId::F32,
                    "f64" => TypeId::F64,
                    "string" => TypeId::String,
                    "timestamp" => TypeId::Timestamp,
                    _ => return Err(TextError::UnknownType(name)),
                };
                self.lx.bump()?;
                Ok(TypeExpr::Bare(id))
            }
            Tok::Struct => {
                self.lx.bump()?;
                Ok(TypeExpr::Bare(TypeId::Struct))
            }
            Tok::Enum => {
                self.lx.bump()?;
                Ok(TypeExpr::Bare(TypeId::Enum))
            }
            Tok::Array => {
                self.lx.bump()?;
                if self.lx.tok != Tok::Lt {
                    return Ok(TypeExpr::Bare(TypeId::Array));
                }
                self.lx.bump()?;
                let elem = self.type_expr()?;
                self.expect(Tok::Gt, "`>`")?;
                Ok(TypeExpr::Array(Box::new(elem)))
            }
            Tok::Map => {
                self.lx.bump()?;
                if self.lx.tok != Tok::Lt {
                    return Ok(TypeExpr::Bare(TypeId::Map));
                }
                self.lx.bump()?;
                let key = self.type_expr()?;
                self.expect(Tok::Comma, "`,`")?;
                let value = self.type_expr()?;
                self.expect(Tok::Gt, "`>`")?;
                Ok(TypeExpr::Map(Box::new(key), Box::new(value)))
            }
            _ => Err(self.unexpected("a type name")),
        }
    }

    /// `struct { FIELD* }` where FIELD is `(ID | alias): (VALUE | none)`.
    fn struct_literal(&mut self, aliases: &HashMap<String, Alias>) -> Result<Value, TextError> {
        self.expect(Tok::Struct, "`struct`")?;
        self.expect(Tok::LBrace, "`{`")?;

        let mut fields: Vec<(u8, Value)> = Vec::new();
        while self.lx.tok != Tok::RBrace && self.lx.tok != Tok::Eof {
            let (id, hint) = match self.lx.tok.clone() {
                Tok::Int { .. } => (self.small_id("a field id")?, None),
                Tok::Ident(name) => {
                    let Some(alias) = aliases.get(&name) else {
                        return Err(TextError::UnknownAlias(name));
                    };
                    self.lx.bump()?;
                    (alias.id, alias.ty.as_ref())
                }
                _ => return Err(self.unexpected("a field id or alias")),
            };
            self.expect(Tok::Colon, "`:`")?;
            if self.lx.tok == Tok::None_ {
                // Explicit omission: the field never reaches the wire.
                self.lx.bump()?;
            } else {
                let value = self.value(hint, aliases)?;
                fields.push((id, value));
            }
            if self.lx.tok == Tok::Semi || self.lx.tok == Tok::Comma {
                self.lx.bump()?;
            }
        }
        self.expect(Tok::RBrace, "`}`")?;

        fields.sort_by_key(|(id, _)| *id);
        for window in fields.windows(2) {
            if window[0].0 == window[1].0 {
                return Err(TextError::DuplicateFieldId(window[0].0));
            }
        }
        Ok(Value::Struct { fields })
    }

    fn value(
        &mut self,
        hint: Option<&TypeExpr>,
        aliases: &HashMap<String, Alias>,
    ) -> Result<Value, TextError> {
        match self.lx.tok.clone() {
            // Cast: `(TYPE) VALUE`
            Tok::LParen => {
                self.lx.bump()?;
                let ty = self.type_expr()?;
                self.expect(Tok::RParen, "`)`")?;
                self.value(Some(&ty), aliases)
            }
            Tok::Null => {
                self.lx.bump()?;
                Ok(Value::Null)
            }
            Tok::True => {
                self.lx.bump()?;
                Ok(Value::Bool(true))
            }
            Tok::False => {
                self.lx.bump()?;
                Ok(Value::Bool(false))
            }
            Tok::Str(s) => {
                self.lx.bump()?;
                Ok(Value::String(s))
            }
            Tok::Ts => self.timestamp(),
            Tok::Float(lit) => {
                self.lx.bump()?;
                let ty = self.numeric_suffix()?.or_else(|| hint_scalar(hint));
                self.float_value(&lit, ty)
            }
            Tok::Int { lit, hex } => {
                self.lx.bump()?;
                let ty = self.numeric_suffix()?.or_else(|| hint_scalar(hint));
                self.int_value(&lit, hex, ty)
            }
            Tok::Ident(name) => {
                self.lx.bump()?;
                special_float(&name).ok_or_else(|| {
                    TextError::Syntax(format!("unexpected identifier `{name}` in value position"))
                })
            }
            Tok::Array => self.array_literal(hint, aliases),
            Tok::Map => self.map_literal(aliases),
            Tok::Enum => self.enum_literal(aliases),
            Tok::Struct => self.struct_literal(aliases),
            _ => Err(self.unexpected("a value")),
        }
    }

    /// Consumes a numeric type suffix identifier, if one follows.
    fn numeric_suffix(&mut self) -> Result<Option<TypeId>, TextError> {
        let Tok::Ident(name) = &self.lx.tok else {
            return Ok(None);
        };
        let id = match name.as_str() {
            "u8" => TypeId::U8,
            "u16" => TypeId::U16,
            "u32" => TypeId::U32,
            "u64" => TypeId::U64,
            "u128" => TypeId::U128,
            "i8" => TypeId::I8,
            "i16" => TypeId::I16,
            "i32" => TypeId::I32,
            "i64" => TypeId::I64,
            "i128" => TypeId::I128,
            "f32" => TypeId::F32,
            "f64" => TypeId::F64,
            _ => return Ok(None),
        };
        self.lx.bump()?;
        Ok(Some(id))
    }

    fn float_value(&self, lit: &str, ty: Option<TypeId>) -> Result<Value, TextError> {
        let v: f64 = lit
            .replace('_', "")
            .parse()
            .map_err(|_| TextError::Syntax(format!("invalid float `{lit}`")))?;
        match ty {
            Some(TypeId::F32) => Ok(Value::F32(v as f32)),
            Some(TypeId::F64) | None => Ok(Value::F64(v)),
            Some(other) => Err(TextError::Syntax(format!(
                "float literal cannot have type {}",
                type_name(other)
            ))),
        }
    }

    fn int_value(&self, lit: &str, hex: bool, ty: Option<TypeId>) -> Result<Value, TextError> {
        let Some(ty) = ty else {
            return Err(TextError::AmbiguousInteger);
        };

        // An integer literal with a float suffix or hint is a float.
        if matches!(ty, TypeId::F32 | TypeId::F64) {
            return self.float_value(&lit.replace("0x", "").replace("0X", ""), Some(ty));
        }

        let cleaned = lit.replace('_', "");
        let (negative, digits) = match cleaned.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, cleaned.as_str()),
        };
        let digits = digits
            .strip_prefix("0x")
            .or_else(|| digits.strip_prefix("0X"))
            .unwrap_or(digits);
        let radix = if hex { 16 } else { 10 };
        let name = type_name(ty);
        let magnitude =
            u128::from_str_radix(digits, radix).map_err(|_| TextError::IntRange(name))?;

        let unsigned = |max: u128| {
            if negative || magnitude > max {
                Err(TextError::IntRange(name))
            } else {
                Ok(magnitude)
            }
        };
        let signed = |bits: u32| {
            let bound = if negative {
                1u128 << (bits - 1)
            } else {
                (1u128 << (bits - 1)) - 1
            };
            if magnitude > bound {
                return Err(TextError::IntRange(name));
            }
            let v = magnitude as i128;
            Ok(if negative { v.wrapping_neg() } else { v })
        };

        match ty {
            TypeId::U8 => Ok(Value::U8(unsigned(u8::MAX as u128)? as u8)),
            TypeId::U16 => Ok(Value::U16(unsigned(u16::MAX as u128)? as u16)),
            TypeId::U32 => Ok(Value::U32(unsigned(u32::MAX as u128)? as u32)),
            TypeId::U64 => Ok(Value::U64(unsigned(u64::MAX as u128)? as u64)),
            TypeId::U128 => Ok(Value::U128(unsigned(u128::MAX)?)),
            TypeId::I8 => Ok(Value::I8(signed(8)? as i8)),
            TypeId::I16 => Ok(Value::I16(signed(16)? as i16)),
            TypeId::I32 => Ok(Value::I32(signed(32)? as i32)),
            TypeId::I64 => Ok(Value::I64(signed(64)? as i64)),
            TypeId::I128 => Ok(Value::I128(signed(128)?)),
            other => Err(TextError::Syntax(format!(
                "integer literal cannot have type {}",
                type_name(other)
            ))),
        }
    }

    /// `ts( SECONDS | "RFC3339" )`
    fn timestamp(&mut self) -> Result<Value, TextError> {
        self.lx.bump()?; // ts
        self.expect(Tok::LParen, "`(`")?;
        let secs = match self.lx.tok.clone() {
            Tok::Int { lit, hex: false } => {
                self.lx.bump()?;
                lit.replace('_', "")
                    .parse::<u64>()
                    .map_err(|_| TextError::InvalidTimestamp(lit))?
            }
            Tok::Str(text) => {
                self.lx.bump()?;
                let parsed = chrono::DateTime::parse_from_rfc3339(&text)
                    .map_err(|_| TextError::InvalidTimestamp(text.clone()))?;
                u64::try_from(parsed.timestamp())
                    .map_err(|_| TextError::InvalidTimestamp(text))?
            }
            _ => return Err(self.unexpected("seconds or an RFC3339 string in ts(...)")),
        };
        self.expect(Tok::RParen, "`)`")?;
        Ok(Value::Timestamp(secs))
    }

    /// `array[<TYPE>] [ VALUE* ]`; the element type is inferred from the
    /// first element when not declared.
    fn array_literal(
        &mut self,
        hint: Option<&TypeExpr>,
        aliases: &HashMap<String, Alias>,
    ) -> Result<Value, TextError> {
        self.lx.bump()?; // array
        let mut declared = None;
        if self.lx.tok == Tok::Lt {
            self.lx.bump()?;
            declared = Some(self.type_expr()?);
            self.expect(Tok::Gt, "`>`")?;
        }
        if declared.is_none()
            && let Some(TypeExpr::Array(elem)) = hint
        {
            declared = Some(elem.as_ref().clone());
        }

        self.expect(Tok::LBrack, "`[`")?;
        let mut elements = Vec::new();
        while self.lx.tok != Tok::RBrack && self.lx.tok != Tok::Eof {
            elements.push(self.value(declared.as_ref(), aliases)?);
            if self.lx.tok == Tok::Comma {
                self.lx.bump()?;
            }
        }
        self.expect(Tok::RBrack, "`]`")?;

        let element_type = match &declared {
            Some(ty) => ty.type_id(),
            None => match elements.first() {
                Some(first) => first.type_id(),
                None => TypeId::U8,
            },
        };
        for elem in &elements {
            check_element(element_type, elem)?;
        }
        Ok(Value::Array {
            element_type,
            elements,
        })
    }

    /// `map<KEY, VALUE> { (KEY: VALUE)* }`
    fn map_literal(&mut self, aliases: &HashMap<String, Alias>) -> Result<Value, TextError> {
        self.lx.bump()?; // map
        self.expect(Tok::Lt, "`<`")?;
        let key_ty = self.type_expr()?;
        self.expect(Tok::Comma, "`,`")?;
        let value_ty = self.type_expr()?;
        self.expect(Tok::Gt, "`>`")?;
        self.expect(Tok::LBrace, "`{`")?;

        let mut entries = Vec::new();
        while self.lx.tok != Tok::RBrace && self.lx.tok != Tok::Eof {
            let key = self.value(Some(&key_ty), aliases)?;
            self.expect(Tok::Colon, "`:`")?;
            let value = self.value(Some(&value_ty), aliases)?;
            check_element(key_ty.type_id(), &key)?;
            check_element(value_ty.type_id(), &value)?;
            entries.push((key, value));
            if self.lx.tok == Tok::Comma {
                self.lx.bump()?;
            }
        }
        self.expect(Tok::RBrace, "`}`")?;
        Ok(Value::Map {
            key_type: key_ty.type_id(),
            value_type: value_ty.type_id(),
            entries,
        })
    }

    /// `enum<ID>( VALUE )`
    fn enum_literal(&mut self, aliases: &HashMap<String, Alias>) -> Result<Value, TextError> {
        self.lx.bump()?; // enum
        self.expect(Tok::Lt, "`<`")?;
        let variant_id = self.small_id("a variant id")?;
        self.expect(Tok::Gt, "`>`")?;
        self.expect(Tok::LParen, "`(`")?;
        let inner = self.value(None, aliases)?;
        self.expect(Tok::RParen, "`)`")?;
        Ok(Value::Enum {
            variant_id,
            value: Box::new(inner),
        })
    }
}

fn hint_scalar(hint: Option<&TypeExpr>) -> Option<TypeId> {
    match hint {
        Some(TypeExpr::Bare(id)) => Some(*id),
        _ => None,
    }
}

fn special_float(name: &str) -> Option<Value> {
    let (base, is_f32) = if let Some(base) = name.strip_suffix("f32") {
        (base, true)
    } else if let Some(base) = name.strip_suffix("f64") {
        (base, false)
    } else {
        (name, false)
    };
    let v = match base {
        "nan" => f64::NAN,
        "inf" => f64::INFINITY,
        "neginf" => f64::NEG_INFINITY,
        _ => return None,
    };
    Some(if is_f32 {
        Value::F32(v as f32)
    } else {
        Value::F64(v)
    })
}

fn check_element(expected: TypeId, value: &Value) -> Result<(), TextError> {
    if value.type_id() != expected {
        return Err(TextError::MixedElements {
            expected: type_name(expected),
            found: type_name(value.type_id()),
        });
    }
    Ok(())
}
