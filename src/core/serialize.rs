// Serialization utilities for Bitcoin data structures

use std::io::{self, Write};

use crate::core::DecodeError;

/// Largest value a variable-length integer may decode to.
/// Anything above 2^53 - 1 cannot be represented exactly by a JSON number.
pub const MAX_SAFE_VARINT: u64 = (1 << 53) - 1;

/// Forward-only reader over an immutable byte buffer
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

macro_rules! read_int {
    ($($name:ident => $ty:ty, $from:ident;)*) => {
        $(
            pub fn $name(&mut self) -> Result<$ty, DecodeError> {
                Ok(<$ty>::$from(self.read_array()?))
            }
        )*
    };
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// The whole underlying buffer, independent of the read position
    pub fn buffer(&self) -> &'a [u8] {
        self.buf
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Jump to an absolute offset
    pub fn seek(&mut self, pos: usize) -> Result<(), DecodeError> {
        if pos > self.buf.len() {
            return Err(DecodeError::SeekOutOfBounds {
                offset: pos as isize,
                len: self.buf.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// Move the position by a relative offset (negative rewinds)
    pub fn move_by(&mut self, offset: isize) -> Result<(), DecodeError> {
        let target = self.pos as isize + offset;
        if target < 0 {
            return Err(DecodeError::SeekOutOfBounds {
                offset: target,
                len: self.buf.len(),
            });
        }
        self.seek(target as usize)
    }

    /// Read `n` raw bytes, borrowing them from the buffer
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining() {
            return Err(DecodeError::UnexpectedEndOfBuffer {
                position: self.pos,
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    read_int! {
        read_u8 => u8, from_le_bytes;
        read_i8 => i8, from_le_bytes;
        read_u16_le => u16, from_le_bytes;
        read_u16_be => u16, from_be_bytes;
        read_i16_le => i16, from_le_bytes;
        read_i16_be => i16, from_be_bytes;
        read_u32_le => u32, from_le_bytes;
        read_u32_be => u32, from_be_bytes;
        read_i32_le => i32, from_le_bytes;
        read_i32_be => i32, from_be_bytes;
        read_u64_le => u64, from_le_bytes;
        read_u64_be => u64, from_be_bytes;
        read_i64_le => i64, from_le_bytes;
        read_i64_be => i64, from_be_bytes;
    }

    /// Read a variable-length integer (VarInt)
    pub fn read_varint(&mut self) -> Result<u64, DecodeError> {
        match self.read_u8()? {
            n @ 0..=0xfc => Ok(n as u64),
            0xfd => Ok(self.read_u16_le()? as u64),
            0xfe => Ok(self.read_u32_le()? as u64),
            0xff => {
                let value = self.read_u64_le()?;
                if value > MAX_SAFE_VARINT {
                    return Err(DecodeError::ValueTooLarge(value));
                }
                Ok(value)
            }
        }
    }

    /// Read a VarInt used as a count or length
    pub fn read_varint_usize(&mut self) -> Result<usize, DecodeError> {
        let value = self.read_varint()?;
        usize::try_from(value).map_err(|_| DecodeError::ValueTooLarge(value))
    }

    /// Read bytes with length prefix
    pub fn read_var_bytes(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.read_varint_usize()?;
        self.read_bytes(len)
    }
}

/// Write a variable-length integer (VarInt)
/// Bitcoin uses a compact format for integers
pub fn write_varint<W: Write>(writer: &mut W, value: u64) -> io::Result<()> {
    match value {
        0..=0xfc => {
            writer.write_all(&[value as u8])?;
        }
        0xfd..=0xffff => {
            writer.write_all(&[0xfd])?;
            writer.write_all(&(value as u16).to_le_bytes())?;
        }
        0x10000..=0xffffffff => {
            writer.write_all(&[0xfe])?;
            writer.write_all(&(value as u32).to_le_bytes())?;
        }
        _ => {
            writer.write_all(&[0xff])?;
            writer.write_all(&value.to_le_bytes())?;
        }
    }
    Ok(())
}

/// Write bytes with length prefix (VarInt length + data)
pub fn write_var_bytes<W: Write>(writer: &mut W, data: &[u8]) -> io::Result<()> {
    write_varint(writer, data.len() as u64)?;
    writer.write_all(data)?;
    Ok(())
}
