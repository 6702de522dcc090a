use alloc::string::String;
use alloc::vec::Vec;
use bytes::Bytes;

use crate::buffer::{Buffer, LENGTH_PREFIX};
use crate::reader::ReadInteger;
use crate::writer::WriteInteger;
use crate::{Result, SerializationError, ToBytes};

macro_rules! impl_scalar {
    ($($ty:ty => $write:ident, $read:ident);* $(;)?) => {
        $(
            impl ToBytes for $ty {
                #[inline]
                fn bytes_len(&self) -> usize {
                    size_of::<$ty>()
                }

                #[inline]
                fn to_bytes(&self, buffer: &mut Buffer) -> Result<()> {
                    buffer.$write(*self)
                }

                #[inline]
                fn from_bytes(buffer: &mut Buffer) -> Result<Self> {
                    buffer.$read()
                }
            }
        )*
    };
}

impl_scalar! {
    u8 => write_u8, read_u8;
    i8 => write_i8, read_i8;
    u16 => write_u16, read_u16;
    i16 => write_i16, read_i16;
    u32 => write_u32, read_u32;
    i32 => write_i32, read_i32;
    u64 => write_u64, read_u64;
    i64 => write_i64, read_i64;
    f32 => write_f32, read_f32;
    f64 => write_f64, read_f64;
}

impl ToBytes for bool {
    fn bytes_len(&self) -> usize {
        1
    }

    fn to_bytes(&self, buffer: &mut Buffer) -> Result<()> {
        buffer.write_u8(u8::from(*self))
    }

    /// Any non-zero byte reads as `true`
    fn from_bytes(buffer: &mut Buffer) -> Result<Self> {
        Ok(buffer.read_u8()? != 0)
    }
}

impl ToBytes for String {
    fn bytes_len(&self) -> usize {
        LENGTH_PREFIX + self.len()
    }

    fn to_bytes(&self, buffer: &mut Buffer) -> Result<()> {
        buffer.write_string(self)
    }

    fn from_bytes(buffer: &mut Buffer) -> Result<Self> {
        let raw = buffer.read_sized(true)?;
        core::str::from_utf8(raw)
            .map(String::from)
            .map_err(|_| SerializationError::InvalidUtf8)
    }
}

impl ToBytes for Bytes {
    fn bytes_len(&self) -> usize {
        LENGTH_PREFIX + self.len()
    }

    fn to_bytes(&self, buffer: &mut Buffer) -> Result<()> {
        buffer.write_sized(self)
    }

    fn from_bytes(buffer: &mut Buffer) -> Result<Self> {
        buffer.read_sized(true).map(Bytes::copy_from_slice)
    }
}

/// Element count, then every element with its own rule.
impl<T: ToBytes> ToBytes for Vec<T> {
    fn bytes_len(&self) -> usize {
        LENGTH_PREFIX + self.iter().map(ToBytes::bytes_len).sum::<usize>()
    }

    fn to_bytes(&self, buffer: &mut Buffer) -> Result<()> {
        buffer.write_len(self.len())?;
        self.iter().try_for_each(|item| item.to_bytes(buffer))
    }

    fn from_bytes(buffer: &mut Buffer) -> Result<Self> {
        let len = buffer.read_len()?;
        // every element takes at least one byte, so a count larger than the unread tail is
        // corrupt and must not drive the allocation
        let mut items = Vec::with_capacity(len.min(buffer.unread_len()));
        for _ in 0..len {
            items.push(T::from_bytes(buffer)?);
        }
        Ok(items)
    }
}

/// Presence flag, then the value if present.
impl<T: ToBytes> ToBytes for Option<T> {
    fn bytes_len(&self) -> usize {
        1 + self.as_ref().map_or(0, ToBytes::bytes_len)
    }

    fn to_bytes(&self, buffer: &mut Buffer) -> Result<()> {
        match self {
            Some(value) => {
                true.to_bytes(buffer)?;
                value.to_bytes(buffer)
            }
            None => false.to_bytes(buffer),
        }
    }

    fn from_bytes(buffer: &mut Buffer) -> Result<Self> {
        if bool::from_bytes(buffer)? {
            Ok(Some(T::from_bytes(buffer)?))
        } else {
            Ok(None)
        }
    }
}
