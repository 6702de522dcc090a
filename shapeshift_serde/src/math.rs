//! Fixed-arity numeric tuples.
//!
//! Each tuple is its scalar components in a fixed order with no prefix: the reader must
//! know the arity from the static type.
use bevy_color::Srgba;
use bevy_math::{IVec2, IVec3, Quat, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::buffer::Buffer;
use crate::reader::ReadInteger;
use crate::writer::WriteInteger;
use crate::{Result, ToBytes};

/// An 8-bit-per-channel RGBA color.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color32 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color32 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

macro_rules! impl_components {
    ($ty:ty, $scalar:ty, $n:literal, $write:ident, $read:ident) => {
        impl ToBytes for $ty {
            fn bytes_len(&self) -> usize {
                $n * size_of::<$scalar>()
            }

            fn to_bytes(&self, buffer: &mut Buffer) -> Result<()> {
                self.to_array()
                    .into_iter()
                    .try_for_each(|component| buffer.$write(component))
            }

            fn from_bytes(buffer: &mut Buffer) -> Result<Self> {
                let mut components = [<$scalar>::default(); $n];
                for component in components.iter_mut() {
                    *component = buffer.$read()?;
                }
                Ok(<$ty>::from_array(components))
            }
        }
    };
}

impl_components!(Vec2, f32, 2, write_f32, read_f32);
impl_components!(Vec3, f32, 3, write_f32, read_f32);
impl_components!(Vec4, f32, 4, write_f32, read_f32);
impl_components!(IVec2, i32, 2, write_i32, read_i32);
impl_components!(IVec3, i32, 3, write_i32, read_i32);
// x, y, z, w
impl_components!(Quat, f32, 4, write_f32, read_f32);

impl ToBytes for Srgba {
    fn bytes_len(&self) -> usize {
        4 * size_of::<f32>()
    }

    fn to_bytes(&self, buffer: &mut Buffer) -> Result<()> {
        buffer.write_f32(self.red)?;
        buffer.write_f32(self.green)?;
        buffer.write_f32(self.blue)?;
        buffer.write_f32(self.alpha)
    }

    fn from_bytes(buffer: &mut Buffer) -> Result<Self> {
        let red = buffer.read_f32()?;
        let green = buffer.read_f32()?;
        let blue = buffer.read_f32()?;
        let alpha = buffer.read_f32()?;
        Ok(Srgba::new(red, green, blue, alpha))
    }
}

impl ToBytes for Color32 {
    fn bytes_len(&self) -> usize {
        4
    }

    fn to_bytes(&self, buffer: &mut Buffer) -> Result<()> {
        buffer.write_bytes(&[self.r, self.g, self.b, self.a]);
        Ok(())
    }

    fn from_bytes(buffer: &mut Buffer) -> Result<Self> {
        let raw = buffer.read_exact(4, true)?;
        Ok(Self::new(raw[0], raw[1], raw[2], raw[3]))
    }
}
