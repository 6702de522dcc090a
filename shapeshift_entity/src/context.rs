//! Write and read contexts handed to [`Entity::serialize`] and [`Entity::init`].
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use shapeshift_reference::UnresolvedReference;
use shapeshift_reference::channel::ReferenceChannel;
use shapeshift_serde::prelude::*;
use tracing::{error, trace, warn};

use crate::config::UnknownTypePolicy;
use crate::entity::Entity;
use crate::registry::EntityRegistry;
use crate::{EntityError, Result};

/// Write side: the buffer being filled and the channel that decides how handles travel.
pub struct SerializeContext<'a> {
    buffer: &'a mut Buffer,
    channel: &'a ReferenceChannel,
}

impl<'a> SerializeContext<'a> {
    pub fn new(buffer: &'a mut Buffer, channel: &'a ReferenceChannel) -> Self {
        Self { buffer, channel }
    }

    pub fn buffer(&mut self) -> &mut Buffer {
        self.buffer
    }

    pub fn channel(&self) -> &ReferenceChannel {
        self.channel
    }

    pub fn write<T: ToBytes>(&mut self, value: &T) -> Result<()> {
        value.to_bytes(self.buffer)?;
        Ok(())
    }

    /// Write a nested entity as a length-framed payload, so that a reader can skip it.
    pub fn write_entity<E: ?Sized + Entity>(&mut self, entity: &E) -> Result<()> {
        let mark = self.buffer.begin_frame();
        entity.serialize(self)?;
        self.buffer.end_frame(mark)?;
        Ok(())
    }

    /// Write a nested entity whose runtime type may differ from the declared one:
    /// its type identifier, then its framed payload.
    pub fn write_polymorphic<B: ?Sized + Entity>(&mut self, entity: &B) -> Result<()> {
        self.write_tagged(entity.type_name(), entity)
    }

    /// Write the element count, then every element with its own type identifier.
    pub fn write_entities<B: ?Sized + Entity>(&mut self, entities: &[Box<B>]) -> Result<()> {
        self.buffer.write_len(entities.len())?;
        entities
            .iter()
            .try_for_each(|entity| self.write_polymorphic(&**entity))
    }

    /// Write a single host reference, which may be absent.
    pub fn write_handle(&mut self, handle: Option<&Handle>) -> Result<()> {
        self.channel
            .write_group(self.buffer, &[handle.cloned()])?;
        Ok(())
    }

    /// Write an array of host references as one group.
    pub fn write_handles(&mut self, handles: &[Option<Handle>]) -> Result<()> {
        self.channel.write_group(self.buffer, handles)?;
        Ok(())
    }

    pub(crate) fn write_tagged<B: ?Sized + Entity>(
        &mut self,
        type_name: &str,
        entity: &B,
    ) -> Result<()> {
        self.buffer.write_string(type_name)?;
        self.write_entity(entity)
    }
}

/// Read side: the buffer being consumed, the registry used to build polymorphic fields
/// and the channel used to resolve identifier references.
///
/// References that could not be resolved are collected instead of failing the read,
/// see [`unresolved`](Self::unresolved).
pub struct DeserializeContext<'a> {
    buffer: &'a mut Buffer,
    registry: &'a EntityRegistry,
    channel: &'a ReferenceChannel,
    unresolved: Vec<UnresolvedReference>,
}

impl<'a> DeserializeContext<'a> {
    pub fn new(
        buffer: &'a mut Buffer,
        registry: &'a EntityRegistry,
        channel: &'a ReferenceChannel,
    ) -> Self {
        Self {
            buffer,
            registry,
            channel,
            unresolved: Vec::new(),
        }
    }

    pub fn buffer(&mut self) -> &mut Buffer {
        self.buffer
    }

    pub fn registry(&self) -> &EntityRegistry {
        self.registry
    }

    pub fn channel(&self) -> &ReferenceChannel {
        self.channel
    }

    pub fn read<T: ToBytes>(&mut self) -> Result<T> {
        Ok(T::from_bytes(self.buffer)?)
    }

    /// Read a nested entity of a statically known type.
    pub fn read_entity<E: Entity + Default>(&mut self) -> Result<E> {
        let mut entity = E::default();
        self.init_entity(&mut entity)?;
        Ok(entity)
    }

    /// Populate an existing entity from the next framed payload.
    pub fn init_entity<E: ?Sized + Entity>(&mut self, entity: &mut E) -> Result<()> {
        let frame = self.buffer.enter_frame()?;
        entity.init(self)?;
        let closed = if self.registry.config().verify_frames {
            self.buffer.exit_frame(frame)
        } else {
            self.buffer.close_frame_lenient(frame)
        };
        if let Err(e) = closed {
            error!(entity = entity.type_name(), ?e, "entity did not consume its payload");
            return Err(e.into());
        }
        Ok(())
    }

    /// Skip the next framed entity without materializing it, returning its payload length.
    pub fn skip_entity(&mut self) -> Result<usize> {
        let len = self.buffer.skip_sized()?;
        trace!(len, "skipped nested entity");
        Ok(len)
    }

    /// Skip the next polymorphic entity: its type identifier and its framed payload.
    pub fn skip_polymorphic(&mut self) -> Result<usize> {
        self.buffer.skip_sized()?;
        self.skip_entity()
    }

    /// Read a nested entity written by
    /// [`SerializeContext::write_polymorphic`], building the variant named in the stream.
    ///
    /// An empty identifier builds the declared type with `declared`.
    pub fn read_polymorphic<B: ?Sized + Entity>(
        &mut self,
        declared: fn() -> Box<B>,
    ) -> Result<Box<B>> {
        self.read_tagged(declared).map(|(_, entity)| entity)
    }

    /// Read the element count, then every element with its own variant.
    pub fn read_entities<B: ?Sized + Entity>(
        &mut self,
        declared: fn() -> Box<B>,
    ) -> Result<Vec<Box<B>>> {
        let len = self.buffer.read_len()?;
        let mut entities = Vec::with_capacity(len.min(self.buffer.unread_len()));
        for _ in 0..len {
            entities.push(self.read_polymorphic(declared)?);
        }
        Ok(entities)
    }

    /// Read a single host reference. Unresolved identifiers read as `None`.
    pub fn read_handle(&mut self) -> Result<Option<Handle>> {
        Ok(self.read_handles()?.into_iter().next().flatten())
    }

    pub fn read_handles(&mut self) -> Result<Vec<Option<Handle>>> {
        Ok(self.channel.read_group(self.buffer, &mut self.unresolved)?)
    }

    /// References met so far that the host could not resolve
    pub fn unresolved(&self) -> &[UnresolvedReference] {
        &self.unresolved
    }

    pub fn into_unresolved(self) -> Vec<UnresolvedReference> {
        self.unresolved
    }

    /// Read a type identifier and the framed payload that follows it.
    ///
    /// Returns the identifier that was applied: empty when the declared type was used.
    pub(crate) fn read_tagged<B: ?Sized + Entity>(
        &mut self,
        declared: fn() -> Box<B>,
    ) -> Result<(String, Box<B>)> {
        let type_name = String::from_bytes(self.buffer)?;
        let mut entity = if type_name.is_empty() {
            declared()
        } else {
            match self.registry.instantiate::<B>(&type_name) {
                Ok(entity) => entity,
                Err(EntityError::UnknownType(_))
                    if self.registry.config().unknown_type
                        == UnknownTypePolicy::FallbackToDeclared =>
                {
                    warn!(%type_name, "unknown entity type, falling back to the declared type");
                    self.skip_entity()?;
                    return Ok((String::new(), declared()));
                }
                Err(e) => return Err(e),
            }
        };
        self.init_entity(&mut *entity)?;
        Ok((type_name, entity))
    }
}
