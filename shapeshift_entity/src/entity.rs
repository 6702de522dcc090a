//! The contract implemented by every serializable entity.
use alloc::boxed::Box;
use alloc::string::ToString;
use core::any::Any;
use core::fmt::Debug;

use crate::context::{DeserializeContext, SerializeContext};
use crate::{EntityError, Result};

/// Type-erased access to the concrete type behind an entity, also through `dyn` interfaces.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// A value with an explicit, ordered field list.
///
/// `serialize` writes the fields in declaration order and `init` reads them back in the
/// same order; the stream carries no field names or tags. `init` must consume exactly
/// what `serialize` wrote so that sibling fields of a containing entity stay aligned.
///
/// Entities are constructed empty (usually through [`Default`]) without side effects,
/// then populated either directly or through `init`.
///
/// ```rust,ignore
/// #[derive(Debug, Default)]
/// struct Sword {
///     damage: f32,
///     enchantment: Enchantment,
///     wielder: Option<Handle>,
/// }
///
/// impl Entity for Sword {
///     fn type_name(&self) -> &'static str {
///         "Sword"
///     }
///
///     fn serialize(&self, ctx: &mut SerializeContext) -> Result<()> {
///         ctx.write(&self.damage)?;
///         ctx.write_entity(&self.enchantment)?;
///         ctx.write_handle(self.wielder.as_ref())
///     }
///
///     fn init(&mut self, ctx: &mut DeserializeContext) -> Result<()> {
///         self.damage = ctx.read()?;
///         ctx.init_entity(&mut self.enchantment)?;
///         self.wielder = ctx.read_handle()?;
///         Ok(())
///     }
/// }
/// ```
pub trait Entity: AsAny + Send + Sync + Debug {
    /// Identifier of the concrete type, as registered in the
    /// [`EntityRegistry`](crate::registry::EntityRegistry).
    ///
    /// Must be non-empty and unique among the variants of an interface.
    fn type_name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }

    fn serialize(&self, ctx: &mut SerializeContext) -> Result<()>;

    fn init(&mut self, ctx: &mut DeserializeContext) -> Result<()>;
}

/// Downcast a boxed entity to its concrete type.
pub fn downcast<T: Entity, B: ?Sized + Entity>(value: Box<B>) -> Result<Box<T>> {
    let found = value.type_name();
    value
        .into_any()
        .downcast::<T>()
        .map_err(|_| EntityError::IncorrectType {
            expected: core::any::type_name::<T>(),
            found: found.to_string(),
        })
}

/// Borrow an entity as its concrete type
pub fn downcast_ref<T: Entity, B: ?Sized + Entity>(value: &B) -> Option<&T> {
    value.as_any().downcast_ref::<T>()
}

pub fn downcast_mut<T: Entity, B: ?Sized + Entity>(value: &mut B) -> Option<&mut T> {
    value.as_any_mut().downcast_mut::<T>()
}
