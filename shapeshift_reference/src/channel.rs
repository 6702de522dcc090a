//! Reference records in the byte stream.
//!
//! Every group of handles is written as a one-byte mode tag followed by the record for
//! that mode:
//! - `0` (direct): an `i32` index into the buffer's handle groups
//! - `1` (identifier): an `i32` count, then per handle a container string and an `i64`
//!   slot. An empty container string is an absent handle.
//!
//! The writer picks the mode from its channel at write time; the reader dispatches on
//! the tag, so a reader never needs to know which mode the writer was in.
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use serde::{Deserialize, Serialize};
use shapeshift_serde::Result;
use shapeshift_serde::prelude::*;
use tracing::{debug, trace, warn};

use crate::UnresolvedReference;
use crate::id::ObjectId;
use crate::resolver::{self, HostResolver};

const DIRECT_TAG: u8 = 0;
const IDENTIFIER_TAG: u8 = 1;

/// How handles are transported when they are written.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceMode {
    /// The handles travel as-is in the buffer's handle groups. Only valid when the
    /// reader lives in the same process as the writer.
    #[default]
    Direct,
    /// The handles are written as `(container, slot)` identifiers and re-resolved by
    /// the reader's [`HostResolver`].
    Identifier,
}

/// Writes and reads reference records.
///
/// In identifier mode the resolver describes handles when writing; when reading it
/// resolves identifier records, whatever the current mode.
#[derive(Clone, Default)]
pub struct ReferenceChannel {
    mode: ReferenceMode,
    resolver: Option<Arc<dyn HostResolver>>,
}

impl fmt::Debug for ReferenceChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceChannel")
            .field("mode", &self.mode)
            .field("has_resolver", &self.resolver.is_some())
            .finish()
    }
}

impl ReferenceChannel {
    /// A direct-mode channel without a resolver
    pub fn direct() -> Self {
        Self::default()
    }

    /// An identifier-mode channel backed by `resolver`
    pub fn identifier(resolver: Arc<dyn HostResolver>) -> Self {
        Self {
            mode: ReferenceMode::Identifier,
            resolver: Some(resolver),
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn HostResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn mode(&self) -> ReferenceMode {
        self.mode
    }

    /// Switch the mode used by subsequent writes.
    pub fn set_mode(&mut self, mode: ReferenceMode) {
        if self.mode != mode {
            debug!(from = ?self.mode, to = ?mode, "reference mode changed");
        }
        self.mode = mode;
    }

    pub fn resolver(&self) -> Option<&dyn HostResolver> {
        self.resolver.as_deref()
    }

    /// Write a record for a group of handles.
    ///
    /// In identifier mode a handle that the host cannot describe (or any handle, if
    /// there is no resolver) is written as absent.
    pub fn write_group(&self, buffer: &mut Buffer, group: &[Option<Handle>]) -> Result<()> {
        match self.mode {
            ReferenceMode::Direct => {
                buffer.write_u8(DIRECT_TAG)?;
                let index = buffer.push_handle_group(group.to_vec());
                trace!(index, len = group.len(), "wrote direct reference record");
                buffer.write_len(index)
            }
            ReferenceMode::Identifier => {
                let ids = self.describe_group(group);
                buffer.write_u8(IDENTIFIER_TAG)?;
                buffer.write_len(ids.len())?;
                for id in &ids {
                    write_object_id(buffer, id.as_ref())?;
                }
                trace!(len = ids.len(), "wrote identifier reference record");
                Ok(())
            }
        }
    }

    /// Read a record written by [`write_group`](Self::write_group).
    ///
    /// Identifier records that the resolver cannot map back are read as absent handles
    /// and pushed to `unresolved`.
    pub fn read_group(
        &self,
        buffer: &mut Buffer,
        unresolved: &mut Vec<UnresolvedReference>,
    ) -> Result<HandleGroup> {
        match buffer.read_u8()? {
            DIRECT_TAG => {
                let index = buffer.read_len()?;
                buffer.take_handle_group(index)
            }
            IDENTIFIER_TAG => {
                let ids = read_object_ids(buffer)?;
                Ok(resolver::resolve_group(self.resolver(), &ids, unresolved))
            }
            tag => Err(SerializationError::InvalidReferenceTag(tag)),
        }
    }

    /// Describe a group with this channel's resolver; without one every handle is absent.
    pub fn describe_group(&self, group: &[Option<Handle>]) -> Vec<Option<ObjectId>> {
        match self.resolver() {
            Some(resolver) => resolver::describe_group(resolver, group),
            None => {
                if group.iter().any(Option::is_some) {
                    warn!("identifier mode without a host resolver, handles are sent as absent");
                }
                group.iter().map(|_| None).collect()
            }
        }
    }
}

fn write_object_id(buffer: &mut Buffer, id: Option<&ObjectId>) -> Result<()> {
    match id {
        Some(id) => {
            buffer.write_string(&id.container)?;
            buffer.write_i64(id.slot)
        }
        None => {
            buffer.write_string("")?;
            buffer.write_i64(0)
        }
    }
}

fn read_object_ids(buffer: &mut Buffer) -> Result<Vec<Option<ObjectId>>> {
    let len = buffer.read_len()?;
    let mut ids = Vec::with_capacity(len.min(buffer.unread_len()));
    for _ in 0..len {
        let container = String::from_bytes(buffer)?;
        let slot = buffer.read_i64()?;
        ids.push((!container.is_empty()).then(|| ObjectId { container, slot }));
    }
    Ok(ids)
}
