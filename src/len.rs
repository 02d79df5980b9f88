//! Tagged-varint length codec.
//!
//! Short form is a single byte with the low bit clear and the length in the
//! upper seven bits (0..=127). Long form sets the low bit and spreads the
//! remaining 31 bits little-endian across the first byte's upper portion and
//! the next three bytes, so the decoded value is bounded by `2^31 - 1` by
//! construction.

use crate::{Error, ErrorKind, Result};

/// Largest encodable length.
pub(crate) const MAX_LEN: usize = (1 << 31) - 1;

/// Number of bytes `encode` will use for `n`: 1 or 4.
pub(crate) fn size_of(n: usize) -> Option<usize> {
    match n {
        0..=0x7F => Some(1),
        _ if n <= MAX_LEN => Some(4),
        _ => None,
    }
}

/// Encodes `n` into a fixed array, returning the array and the number of
/// bytes used.
pub(crate) fn encode(n: usize) -> Result<([u8; 4], usize)> {
    let mut buf = [0u8; 4];
    match size_of(n) {
        Some(1) => {
            buf[0] = (n << 1) as u8 & 0xFE;
            Ok((buf, 1))
        }
        Some(_) => {
            let v = n as u32;
            buf[0] = ((v & 0x7F) << 1) as u8 | 0x01;
            buf[1] = (v >> 7) as u8;
            buf[2] = (v >> 15) as u8;
            buf[3] = (v >> 23) as u8;
            Ok((buf, 4))
        }
        None => Err(Error::new(ErrorKind::LengthOverflow(n as u64))),
    }
}

/// Appends the tagged-varint encoding of `n` to `out`.
#[doc(hidden)]
pub fn write_len(out: &mut Vec<u8>, n: usize) -> Result<()> {
    let (buf, used) = encode(n)?;
    out.extend_from_slice(&buf[..used]);
    Ok(())
}
