use std::io::Write;

use crate::len;
use crate::pool::Scratch;
use crate::{Relish, Result, TypeId, Value};

/// Streaming encoder writing Relish TLVs to an [`io::Write`] sink.
///
/// The encoder holds no state besides the sink. Composite values are staged
/// in a pooled scratch buffer to compute their length prefix, then written
/// in one piece.
///
/// [`io::Write`]: std::io::Write
pub struct Encoder<W: Write> {
    w: W,
}

impl<W: Write> Encoder<W> {
    pub fn new(w: W) -> Self {
        Encoder { w }
    }

    pub fn into_inner(self) -> W {
        self.w
    }

    /// Encodes any [`Relish`] value as one complete TLV.
    pub fn encode<T: Relish>(&mut self, value: &T) -> Result<()> {
        let mut buf = Scratch::acquire();
        value.write_tlv(&mut buf)?;
        self.w.write_all(&buf)?;
        Ok(())
    }

    /// Encodes a dynamic [`Value`] as one complete TLV.
    pub fn write_value(&mut self, value: &Value) -> Result<()> {
        let mut buf = Scratch::acquire();
        value.write_tlv(&mut buf)?;
        self.w.write_all(&buf)?;
        Ok(())
    }

    fn fixed(&mut self, ty: TypeId, content: &[u8]) -> Result<()> {
        self.w.write_all(&[ty as u8])?;
        self.w.write_all(content)?;
        Ok(())
    }

    pub fn write_null(&mut self) -> Result<()> {
        self.fixed(TypeId::Null, &[])
    }

    pub fn write_bool(&mut self, v: bool) -> Result<()> {
        self.fixed(TypeId::Bool, &[if v { 0xFF } else { 0x00 }])
    }

    pub fn write_u8(&mut self, v: u8) -> Result<()> {
        self.fixed(TypeId::U8, &[v])
    }

    pub fn write_u16(&mut self, v: u16) -> Result<()> {
        self.fixed(TypeId::U16, &v.to_le_bytes())
    }

    pub fn write_u32(&mut self, v: u32) -> Result<()> {
        self.fixed(TypeId::U32, &v.to_le_bytes())
    }

    pub fn write_u64(&mut self, v: u64) -> Result<()> {
        self.fixed(TypeId::U64, &v.to_le_bytes())
    }

    pub fn write_u128(&mut self, v: u128) -> Result<()> {
        self.fixed(TypeId::U128, &v.to_le_bytes())
    }

    pub fn write_i8(&mut self, v: i8) -> Result<()> {
        self.fixed(TypeId::I8, &v.to_le_bytes())
    }

    pub fn write_i16(&mut self, v: i16) -> Result<()> {
        self.fixed(TypeId::I16, &v.to_le_bytes())
    }

    pub fn write_i32(&mut self, v: i32) -> Result<()> {
        self.fixed(TypeId::I32, &v.to_le_bytes())
    }

    pub fn write_i64(&mut self, v: i64) -> Result<()> {
        self.fixed(TypeId::I64, &v.to_le_bytes())
    }

    pub fn write_i128(&mut self, v: i128) -> Result<()> {
        self.fixed(TypeId::I128, &v.to_le_bytes())
    }

    pub fn write_f32(&mut self, v: f32) -> Result<()> {
        self.fixed(TypeId::F32, &v.to_le_bytes())
    }

    pub fn write_f64(&mut self, v: f64) -> Result<()> {
        self.fixed(TypeId::F64, &v.to_le_bytes())
    }

    /// Writes a timestamp TLV from raw seconds since the Unix epoch.
    pub fn write_timestamp(&mut self, secs: u64) -> Result<()> {
        self.fixed(TypeId::Timestamp, &secs.to_le_bytes())
    }

    pub fn write_str(&mut self, s: &str) -> Result<()> {
        let (len_buf, used) = len::encode(s.len())?;
        self.w.write_all(&[TypeId::String as u8])?;
        self.w.write_all(&len_buf[..used])?;
        self.w.write_all(s.as_bytes())?;
        Ok(())
    }
}
