//! Transport of host-owned handles.
//!
//! Handles are never written as bytes. Depending on the [`ReferenceMode`](channel::ReferenceMode)
//! of the [`ReferenceChannel`](channel::ReferenceChannel) at write time, a group of handles
//! either travels as-is in the buffer's out-of-band handle groups, or as `(container, slot)`
//! identifiers that a [`HostResolver`](resolver::HostResolver) maps back to live handles
//! on the reading side.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod channel;
mod error;
pub mod id;
pub mod resolver;

pub use error::UnresolvedReference;

pub mod prelude {
    pub use crate::UnresolvedReference;
    pub use crate::channel::{ReferenceChannel, ReferenceMode};
    pub use crate::id::ObjectId;
    pub use crate::resolver::{HostResolver, ObjectTable};
}
