//! Polymorphic entities for the shapeshift protocol.
//!
//! An [`Entity`](entity::Entity) serializes itself as a flat, ordered list of fields and
//! reads itself back in the same order. Fields declared as an interface can hold any
//! variant registered in the [`EntityRegistry`](registry::EntityRegistry): the runtime
//! type travels as a string identifier next to the payload, either inside a parent
//! entity through a [`Polymorph`](polymorph::Polymorph) field, or standalone in an
//! [`Envelope`](envelope::Envelope).

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod config;
pub mod context;
pub mod entity;
pub mod envelope;
mod error;
pub mod polymorph;
pub mod registry;

pub use error::{EntityError, Result};

pub mod prelude {
    pub use crate::config::{DeserializeConfig, UnknownTypePolicy};
    pub use crate::context::{DeserializeContext, SerializeContext};
    pub use crate::entity::{Entity, downcast, downcast_mut, downcast_ref};
    pub use crate::envelope::{Envelope, Instantiated, clone_entity, from_buffer, to_buffer};
    pub use crate::polymorph::Polymorph;
    pub use crate::registry::{EntityRegistry, RegistryHash};
    pub use crate::{EntityError, Result};
}
