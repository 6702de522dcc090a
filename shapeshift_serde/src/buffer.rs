//! The byte + handle-group carrier shared by writers and readers.
use alloc::vec::Vec;
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::handle::Handle;
use crate::reader::ReadInteger;
use crate::{Result, SerializationError, ToBytes};

/// Size of every length prefix on the wire.
pub const LENGTH_PREFIX: usize = size_of::<i32>();

/// One out-of-band group of host references. `None` is an absent reference.
pub type HandleGroup = Vec<Option<Handle>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferConfig {
    /// Number of bytes to pre-allocate for a fresh write buffer
    pub initial_capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 64,
        }
    }
}

/// Position of a reserved length slot, returned by [`Buffer::begin_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a frame must be closed with Buffer::end_frame"]
pub struct FrameMark(usize);

/// A length-framed region being read, returned by [`Buffer::enter_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadFrame {
    start: usize,
    len: usize,
}

impl ReadFrame {
    /// Declared payload length of the frame
    pub fn len(&self) -> usize {
        self.len
    }

    /// Offset of the first byte after the frame
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Append-only byte store with an independent read cursor, plus an ordered list of
/// [`HandleGroup`]s with their own cursor.
///
/// Writes always append at the end. Reads start at offset 0 and fail with
/// [`SerializationError::BufferUnderrun`] instead of reading past the end.
/// A `Buffer` is single-owner: build it completely, then hand it to the reader.
#[derive(Debug, Clone, Default)]
pub struct Buffer {
    bytes: BytesMut,
    read_pos: usize,
    handle_groups: Vec<HandleGroup>,
    handle_pos: usize,
}

impl PartialEq for Buffer {
    /// Two buffers are equal if they carry the same bytes and handles; cursors are ignored.
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes && self.handle_groups == other.handle_groups
    }
}

impl Buffer {
    pub fn new() -> Self {
        Self::with_config(&BufferConfig::default())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: BytesMut::with_capacity(capacity),
            ..Default::default()
        }
    }

    pub fn with_config(config: &BufferConfig) -> Self {
        Self::with_capacity(config.initial_capacity)
    }

    /// Build a buffer ready for reading from bytes and the handle groups that travelled with them.
    pub fn from_parts(bytes: Bytes, handle_groups: Vec<HandleGroup>) -> Self {
        Self {
            bytes: BytesMut::from(bytes.as_ref()),
            read_pos: 0,
            handle_groups,
            handle_pos: 0,
        }
    }

    /// Split the buffer into its bytes and handle groups
    pub fn into_parts(self) -> (Bytes, Vec<HandleGroup>) {
        (self.bytes.freeze(), self.handle_groups)
    }

    /// Total number of bytes written
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Offset of the read cursor
    pub fn position(&self) -> usize {
        self.read_pos
    }

    /// Number of bytes that have not been read yet
    pub fn unread_len(&self) -> usize {
        self.bytes.len() - self.read_pos
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Snapshot of the written bytes
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.bytes)
    }

    pub fn handle_groups(&self) -> &[HandleGroup] {
        &self.handle_groups
    }

    /// Replace every handle group and rewind the handle cursor.
    pub fn set_handle_groups(&mut self, groups: Vec<HandleGroup>) {
        self.handle_groups = groups;
        self.handle_pos = 0;
    }

    /// Clear bytes, handles and both cursors, keeping the allocation.
    pub fn reset(&mut self) {
        self.bytes.clear();
        self.read_pos = 0;
        self.handle_groups.clear();
        self.handle_pos = 0;
    }

    // ---------------------------------------------------------------------
    // write side
    // ---------------------------------------------------------------------

    /// Append raw bytes without any framing.
    pub fn write_bytes(&mut self, data: &[u8]) {
        self.bytes.put_slice(data);
    }

    /// Write a length or element count as an `i32` prefix.
    pub fn write_len(&mut self, len: usize) -> Result<()> {
        let prefix = i32::try_from(len).map_err(|_| SerializationError::LengthOverflow(len))?;
        self.bytes.put_i32_le(prefix);
        Ok(())
    }

    /// Write an `i32` byte length followed by the bytes.
    pub fn write_sized(&mut self, data: &[u8]) -> Result<()> {
        self.write_len(data.len())?;
        self.write_bytes(data);
        Ok(())
    }

    /// Write a string as its utf-8 byte length followed by the bytes.
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.write_sized(value.as_bytes())
    }

    /// Insert the current byte length at the start of the buffer.
    ///
    /// Only meaningful on a buffer that is still being written.
    pub fn prefix_length(&mut self) -> Result<()> {
        let len = self.len();
        let prefix = i32::try_from(len).map_err(|_| SerializationError::LengthOverflow(len))?;
        self.prefix_i32(prefix);
        Ok(())
    }

    /// Insert an `i32` at the start of the buffer.
    pub fn prefix_i32(&mut self, value: i32) {
        let mut prefixed = BytesMut::with_capacity(self.bytes.len() + LENGTH_PREFIX);
        prefixed.put_i32_le(value);
        prefixed.put_slice(&self.bytes);
        self.bytes = prefixed;
    }

    /// Reserve a length slot for a nested payload written directly after it.
    pub fn begin_frame(&mut self) -> FrameMark {
        let mark = FrameMark(self.bytes.len());
        self.bytes.put_i32_le(0);
        mark
    }

    /// Patch the slot reserved by `begin_frame` with the number of bytes written since.
    ///
    /// The result is byte-identical to `write_sized` of the nested payload.
    pub fn end_frame(&mut self, mark: FrameMark) -> Result<usize> {
        let start = mark.0 + LENGTH_PREFIX;
        let len = self.bytes.len() - start;
        let prefix = i32::try_from(len).map_err(|_| SerializationError::LengthOverflow(len))?;
        self.bytes[mark.0..start].copy_from_slice(&prefix.to_le_bytes());
        trace!(offset = mark.0, len, "closed frame");
        Ok(len)
    }

    /// Append a group of host references, returning its index in this buffer.
    pub fn push_handle_group(&mut self, group: HandleGroup) -> usize {
        self.handle_groups.push(group);
        self.handle_groups.len() - 1
    }

    // ---------------------------------------------------------------------
    // read side
    // ---------------------------------------------------------------------

    /// Return the next `n` unread bytes, moving the cursor only if `advance` is set.
    pub fn read_exact(&mut self, n: usize, advance: bool) -> Result<&[u8]> {
        let remaining = self.unread_len();
        if n > remaining {
            return Err(SerializationError::BufferUnderrun {
                requested: n,
                remaining,
            });
        }
        let start = self.read_pos;
        if advance {
            self.read_pos += n;
        }
        Ok(&self.bytes[start..start + n])
    }

    /// Read an `i32` length or element count, rejecting negative values.
    pub fn read_len(&mut self) -> Result<usize> {
        let len = self.read_i32()?;
        usize::try_from(len).map_err(|_| SerializationError::InvalidLength(len))
    }

    /// Read an `i32` length and then that many bytes.
    ///
    /// With `advance == false` the cursor is left on the length prefix.
    pub fn read_sized(&mut self, advance: bool) -> Result<&[u8]> {
        let start = self.read_pos;
        let len = match self.read_len() {
            Ok(len) => len,
            Err(e) => {
                self.read_pos = start;
                return Err(e);
            }
        };
        let remaining = self.unread_len();
        if len > remaining {
            self.read_pos = start;
            return Err(SerializationError::BufferUnderrun {
                requested: len,
                remaining,
            });
        }
        let payload = self.read_pos;
        self.read_pos = if advance { payload + len } else { start };
        Ok(&self.bytes[payload..payload + len])
    }

    /// Skip `n` bytes.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.read_exact(n, true).map(|_| ())
    }

    /// Skip one length-framed value, returning its payload length.
    pub fn skip_sized(&mut self) -> Result<usize> {
        self.read_sized(true).map(<[u8]>::len)
    }

    /// Decode a value without moving the read cursor.
    pub fn peek<T: ToBytes>(&mut self) -> Result<T> {
        let start = self.read_pos;
        let value = T::from_bytes(self);
        self.read_pos = start;
        value
    }

    /// Move the read cursor back over the last `i32`, so an optional trailing value
    /// can be inspected and then handed back.
    pub fn rewind_last_int(&mut self) -> Result<()> {
        if self.read_pos < LENGTH_PREFIX {
            return Err(SerializationError::CursorUnderflow);
        }
        self.read_pos -= LENGTH_PREFIX;
        Ok(())
    }

    /// Read a length prefix and check that the framed payload is fully present.
    pub fn enter_frame(&mut self) -> Result<ReadFrame> {
        let len = self.read_len()?;
        let remaining = self.unread_len();
        if len > remaining {
            return Err(SerializationError::BufferUnderrun {
                requested: len,
                remaining,
            });
        }
        Ok(ReadFrame {
            start: self.read_pos,
            len,
        })
    }

    /// Check that exactly the framed payload was consumed.
    pub fn exit_frame(&mut self, frame: ReadFrame) -> Result<()> {
        let consumed = self.read_pos.saturating_sub(frame.start);
        if consumed != frame.len {
            return Err(SerializationError::FrameMismatch {
                expected: frame.len,
                consumed,
            });
        }
        Ok(())
    }

    /// Move the cursor to the end of the frame, discarding any unread tail.
    ///
    /// Reading past the end of the frame is still an error.
    pub fn close_frame_lenient(&mut self, frame: ReadFrame) -> Result<()> {
        if self.read_pos > frame.end() {
            return Err(SerializationError::FrameMismatch {
                expected: frame.len,
                consumed: self.read_pos - frame.start,
            });
        }
        self.read_pos = frame.end();
        Ok(())
    }

    /// Return the handle group under the handle cursor.
    pub fn pop_next_handle_group(&mut self, advance: bool) -> Result<HandleGroup> {
        let group = self
            .handle_groups
            .get(self.handle_pos)
            .cloned()
            .ok_or(SerializationError::HandleUnderrun {
                index: self.handle_pos,
                available: self.handle_groups.len(),
            })?;
        if advance {
            self.handle_pos += 1;
        }
        Ok(group)
    }

    /// Return the handle group at `index` and move the handle cursor past it.
    pub fn take_handle_group(&mut self, index: usize) -> Result<HandleGroup> {
        let group =
            self.handle_groups
                .get(index)
                .cloned()
                .ok_or(SerializationError::HandleUnderrun {
                    index,
                    available: self.handle_groups.len(),
                })?;
        self.handle_pos = index + 1;
        Ok(group)
    }
}

impl From<Bytes> for Buffer {
    fn from(value: Bytes) -> Self {
        Self::from_parts(value, Vec::new())
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(value: Vec<u8>) -> Self {
        Self::from(value.as_slice())
    }
}

impl From<&[u8]> for Buffer {
    fn from(value: &[u8]) -> Self {
        Self {
            bytes: BytesMut::from(value),
            ..Default::default()
        }
    }
}
