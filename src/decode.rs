use std::io::{self, Read};

use crate::pool::Scratch;
use crate::types::WireSize;
use crate::{Error, ErrorKind, Input, Null, Relish, Result, TypeId, Value};

/// Streaming decoder reading Relish TLVs from an [`io::Read`] source.
///
/// The decoder tracks the absolute byte offset of the source so every error
/// reports where in the stream it was detected. Short reads are absorbed by
/// full-read semantics; a source that stops producing bytes mid-value yields
/// [`ErrorKind::UnexpectedEof`] rather than looping.
pub struct Decoder<R: Read> {
    r: R,
    offset: u64,
}

impl<R: Read> Decoder<R> {
    pub fn new(r: R) -> Self {
        Decoder { r, offset: 0 }
    }

    pub fn into_inner(self) -> R {
        self.r
    }

    /// Absolute offset of the next unread byte.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        let at = self.offset;
        match self.r.read_exact(buf) {
            Ok(()) => {
                self.offset += buf.len() as u64;
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Err(Error::at(ErrorKind::UnexpectedEof, at))
            }
            Err(e) => Err(Error::at(ErrorKind::Io(e), at)),
        }
    }

    fn read_byte(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.fill(&mut buf)?;
        Ok(buf[0])
    }

    fn read_len(&mut self) -> Result<usize> {
        let b0 = self.read_byte()?;
        if b0 & 0x01 == 0 {
            return Ok((b0 >> 1) as usize);
        }
        let mut rest = [0u8; 3];
        self.fill(&mut rest)?;
        let n = ((b0 >> 1) as u32)
            | ((rest[0] as u32) << 7)
            | ((rest[1] as u32) << 15)
            | ((rest[2] as u32) << 23);
        Ok(n as usize)
    }

    /// Reads the next type byte, returning the id and the offset it was
    /// read from.
    fn read_type(&mut self) -> Result<(TypeId, u64)> {
        let off = self.offset;
        let b = self.read_byte()?;
        let ty =
            TypeId::from_byte(b).ok_or_else(|| Error::at(ErrorKind::InvalidTypeId(b), off))?;
        Ok((ty, off))
    }

    fn expect_type(&mut self, expected: TypeId) -> Result<()> {
        let off = self.offset;
        let b = self.read_byte()?;
        let ty =
            TypeId::from_byte(b).ok_or_else(|| Error::at(ErrorKind::InvalidTypeId(b), off))?;
        if ty != expected {
            return Err(Error::at(
                ErrorKind::TypeMismatch { expected, found: b },
                off,
            ));
        }
        Ok(())
    }

    fn body_len(&mut self, ty: TypeId) -> Result<usize> {
        match ty.wire_size() {
            WireSize::Fixed(n) => Ok(n),
            WireSize::Var => self.read_len(),
        }
    }

    /// Decodes one complete TLV into a fresh `T`.
    pub fn decode<T: Relish>(&mut self) -> Result<T> {
        self.expect_type(T::TYPE_ID)?;
        let n = self.body_len(T::TYPE_ID)?;
        let base = self.offset;
        let mut buf = Scratch::acquire();
        buf.resize(n, 0);
        self.fill(&mut buf)?;
        let mut input = Input::with_base(&buf, base);
        T::read_body(&mut input)
    }

    /// Decodes one complete TLV into an existing value.
    ///
    /// Fields present on the wire overwrite their slots; absent fields keep
    /// their prior value.
    pub fn decode_into<T: Relish>(&mut self, dst: &mut T) -> Result<()> {
        self.expect_type(T::TYPE_ID)?;
        let n = self.body_len(T::TYPE_ID)?;
        let base = self.offset;
        let mut buf = Scratch::acquire();
        buf.resize(n, 0);
        self.fill(&mut buf)?;
        let mut input = Input::with_base(&buf, base);
        dst.read_body_into(&mut input)
    }

    /// Decodes one complete TLV of any type into a dynamic [`Value`].
    pub fn read_value(&mut self) -> Result<Value> {
        let (ty, _) = self.read_type()?;
        let n = self.body_len(ty)?;
        let base = self.offset;
        let mut buf = Scratch::acquire();
        buf.resize(n, 0);
        self.fill(&mut buf)?;
        let mut input = Input::with_base(&buf, base);
        Value::decode_body(&mut input, ty)
    }

    /// Consumes one complete TLV without materializing it.
    pub fn skip_value(&mut self) -> Result<()> {
        let (ty, _) = self.read_type()?;
        let mut remaining = self.body_len(ty)?;
        let mut buf = Scratch::acquire();
        buf.resize(remaining.min(4096), 0);
        while remaining > 0 {
            let chunk = remaining.min(buf.len());
            self.fill(&mut buf[..chunk])?;
            remaining -= chunk;
        }
        Ok(())
    }

    pub fn read_null(&mut self) -> Result<()> {
        self.decode::<Null>().map(|_| ())
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        self.decode()
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.decode()
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.decode()
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.decode()
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.decode()
    }

    pub fn read_u128(&mut self) -> Result<u128> {
        self.decode()
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        self.decode()
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.decode()
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.decode()
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.decode()
    }

    pub fn read_i128(&mut self) -> Result<i128> {
        self.decode()
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.decode()
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.decode()
    }

    /// Reads a timestamp TLV as raw seconds since the Unix epoch.
    pub fn read_timestamp(&mut self) -> Result<u64> {
        self.expect_type(TypeId::Timestamp)?;
        let mut buf = [0u8; 8];
        self.fill(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    pub fn read_str(&mut self) -> Result<String> {
        self.decode()
    }
}
