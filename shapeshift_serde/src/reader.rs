//! Little-endian scalar reads
use bytes::Buf;

use crate::Result;
use crate::buffer::Buffer;

/// Fixed-width little-endian reads. Each advances the cursor by the width of the type,
/// or fails with [`BufferUnderrun`](crate::SerializationError::BufferUnderrun) without
/// moving it.
///
/// Use [`Buffer::peek`] to read any of these without advancing.
pub trait ReadInteger {
    fn read_u8(&mut self) -> Result<u8>;
    fn read_i8(&mut self) -> Result<i8>;
    fn read_u16(&mut self) -> Result<u16>;
    fn read_i16(&mut self) -> Result<i16>;
    fn read_u32(&mut self) -> Result<u32>;
    fn read_i32(&mut self) -> Result<i32>;
    fn read_u64(&mut self) -> Result<u64>;
    fn read_i64(&mut self) -> Result<i64>;
    fn read_f32(&mut self) -> Result<f32>;
    fn read_f64(&mut self) -> Result<f64>;
}

macro_rules! read_le {
    ($($name:ident: $ty:ty => $get:ident),* $(,)?) => {
        impl ReadInteger for Buffer {
            $(
                #[inline]
                fn $name(&mut self) -> Result<$ty> {
                    let mut raw = self.read_exact(size_of::<$ty>(), true)?;
                    Ok(raw.$get())
                }
            )*
        }
    };
}

read_le! {
    read_u8: u8 => get_u8,
    read_i8: i8 => get_i8,
    read_u16: u16 => get_u16_le,
    read_i16: i16 => get_i16_le,
    read_u32: u32 => get_u32_le,
    read_i32: i32 => get_i32_le,
    read_u64: u64 => get_u64_le,
    read_i64: i64 => get_i64_le,
    read_f32: f32 => get_f32_le,
    read_f64: f64 => get_f64_le,
}
