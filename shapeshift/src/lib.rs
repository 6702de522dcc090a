/*! # Shapeshift

Binary serialization for graphs of polymorphic entities.

- [`serde`] holds the [`Buffer`](prelude::Buffer): a little-endian byte stream with an
  independent read cursor and out-of-band groups of host [`Handle`](prelude::Handle)s,
  and the codec for primitive values.
- [`reference`] decides how handles travel: as-is in the handle groups, or as
  `(container, slot)` identifiers re-resolved by the host.
- [`entity`] holds the [`Entity`](prelude::Entity) contract, the type registry and the
  envelopes that carry a runtime-substituted variant.

## Feature flags
*/
#![doc = document_features::document_features!()]
#![cfg_attr(not(feature = "std"), no_std)]

pub use shapeshift_reference as reference;
pub use shapeshift_serde as serde;

#[cfg(feature = "entity")]
pub use shapeshift_entity as entity;

/// Prelude containing commonly used types
pub mod prelude {
    pub use shapeshift_reference::prelude::*;
    pub use shapeshift_serde::prelude::*;

    #[cfg(feature = "entity")]
    pub use shapeshift_entity::prelude::*;
}
