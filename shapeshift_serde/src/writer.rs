//! Little-endian scalar writes
use bytes::BufMut;

use crate::Result;
use crate::buffer::Buffer;

/// Fixed-width little-endian writes. None of these emit a prefix: the reader knows the
/// width from the static type.
pub trait WriteInteger {
    fn write_u8(&mut self, value: u8) -> Result<()>;
    fn write_i8(&mut self, value: i8) -> Result<()>;
    fn write_u16(&mut self, value: u16) -> Result<()>;
    fn write_i16(&mut self, value: i16) -> Result<()>;
    fn write_u32(&mut self, value: u32) -> Result<()>;
    fn write_i32(&mut self, value: i32) -> Result<()>;
    fn write_u64(&mut self, value: u64) -> Result<()>;
    fn write_i64(&mut self, value: i64) -> Result<()>;
    fn write_f32(&mut self, value: f32) -> Result<()>;
    fn write_f64(&mut self, value: f64) -> Result<()>;
}

macro_rules! write_le {
    ($($name:ident: $ty:ty => $put:ident),* $(,)?) => {
        impl WriteInteger for Buffer {
            $(
                #[inline]
                fn $name(&mut self, value: $ty) -> Result<()> {
                    let mut raw = [0u8; size_of::<$ty>()];
                    (&mut raw[..]).$put(value);
                    self.write_bytes(&raw);
                    Ok(())
                }
            )*
        }
    };
}

write_le! {
    write_u8: u8 => put_u8,
    write_i8: i8 => put_i8,
    write_u16: u16 => put_u16_le,
    write_i16: i16 => put_i16_le,
    write_u32: u32 => put_u32_le,
    write_i32: i32 => put_i32_le,
    write_u64: u64 => put_u64_le,
    write_i64: i64 => put_i64_le,
    write_f32: f32 => put_f32_le,
    write_f64: f64 => put_f64_le,
}
