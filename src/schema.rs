//! Support types for projecting aggregate schemas onto the wire.
//!
//! The derive macro generates code against this module: [`FieldBind`]
//! abstracts over required and optional field slots, and [`StructReader`]
//! walks a struct payload enforcing field ordering while skipping unknown
//! ids.

use crate::{Error, ErrorKind, Input, Relish, Result};

/// Binding between a struct field slot and its wire representation.
///
/// Implemented for every `T: Relish` (a required field) and for `Option<T>`
/// (an optional field whose presence is signaled by the field appearing in
/// the encoded struct).
pub trait FieldBind: Sized {
    type Wire: Relish;

    /// The wire value to encode, or `None` to omit the field.
    fn bind(&self) -> Option<&Self::Wire>;

    /// Builds the slot from a decoded wire value.
    fn from_wire(wire: Self::Wire) -> Self;

    /// Resolves a field that was absent from the wire.
    fn on_missing(field_id: u8) -> Result<Self>;
}

impl<T: Relish> FieldBind for T {
    type Wire = T;

    fn bind(&self) -> Option<&T> {
        Some(self)
    }

    fn from_wire(wire: T) -> Self {
        wire
    }

    fn on_missing(field_id: u8) -> Result<Self> {
        Err(Error::new(ErrorKind::MissingField(field_id)))
    }
}

impl<T: Relish> FieldBind for Option<T> {
    type Wire = T;

    fn bind(&self) -> Option<&T> {
        self.as_ref()
    }

    fn from_wire(wire: T) -> Self {
        Some(wire)
    }

    fn on_missing(_field_id: u8) -> Result<Self> {
        Ok(None)
    }
}

/// Sequential reader over a struct payload.
///
/// Fields are requested in increasing id order; ids on the wire below the
/// requested one are unknown and skipped, an id above it parks until a later
/// request. Ordering and reserved-bit violations surface on first contact
/// with the offending id byte.
pub struct StructReader<'a, 'b> {
    input: &'b mut Input<'a>,
    prev: Option<u8>,
    parked: Option<u8>,
}

impl<'a, 'b> StructReader<'a, 'b> {
    pub fn new(input: &'b mut Input<'a>) -> Self {
        StructReader {
            input,
            prev: None,
            parked: None,
        }
    }

    fn next_id(&mut self) -> Result<Option<u8>> {
        if let Some(id) = self.parked.take() {
            return Ok(Some(id));
        }
        if self.input.is_empty() {
            return Ok(None);
        }
        let off = self.input.offset();
        let id = self.input.byte()?;
        if id & 0x80 != 0 {
            return Err(Error::at(ErrorKind::InvalidFieldId(id), off));
        }
        if let Some(prev) = self.prev
            && id <= prev
        {
            return Err(Error::at(
                ErrorKind::FieldOrder {
                    previous: prev,
                    current: id,
                },
                off,
            ));
        }
        self.prev = Some(id);
        Ok(Some(id))
    }

    /// Advances to field `id` and decodes it, or returns `None` if the field
    /// is absent.
    pub fn field<F: FieldBind>(&mut self, id: u8) -> Result<Option<F::Wire>> {
        while let Some(next) = self.next_id()? {
            if next < id {
                self.input.skip_value()?;
            } else if next == id {
                return Ok(Some(self.input.read_value::<F::Wire>()?));
            } else {
                self.parked = Some(next);
                return Ok(None);
            }
        }
        Ok(None)
    }

    /// Drains any remaining unknown fields, still enforcing ordering.
    pub fn finish(mut self) -> Result<()> {
        while self.next_id()?.is_some() {
            self.input.skip_value()?;
        }
        Ok(())
    }
}
