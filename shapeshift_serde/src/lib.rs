//! Byte buffer and primitive codec for the shapeshift protocol.
//!
//! A [`Buffer`](buffer::Buffer) is a growable little-endian byte stream with an independent
//! read cursor, plus a parallel list of out-of-band [`Handle`](handle::Handle) groups.
//! Every value that goes on the wire implements [`ToBytes`].
//!
//! The format carries no field names or tags: values are read back in exactly the order
//! they were written, and every variable-length value is framed by an `i32` length.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod buffer;
mod error;
pub mod handle;
mod impls;
pub mod math;
pub mod reader;
pub mod writer;

pub use error::{Result, SerializationError};

use crate::buffer::Buffer;

/// A value with a fixed, tag-less binary layout.
///
/// `from_bytes` must consume exactly the bytes that `to_bytes` produced.
pub trait ToBytes {
    /// Number of bytes `to_bytes` will write.
    fn bytes_len(&self) -> usize;

    fn to_bytes(&self, buffer: &mut Buffer) -> Result<()>;

    fn from_bytes(buffer: &mut Buffer) -> Result<Self>
    where
        Self: Sized;
}

pub mod prelude {
    pub use crate::buffer::{Buffer, BufferConfig, HandleGroup};
    pub use crate::handle::Handle;
    pub use crate::math::Color32;
    pub use crate::reader::ReadInteger;
    pub use crate::writer::WriteInteger;
    pub use crate::{SerializationError, ToBytes};
}
