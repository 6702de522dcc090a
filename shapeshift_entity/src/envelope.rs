//! Record an entity with its runtime type, and rebuild it from that record.
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use shapeshift_reference::UnresolvedReference;
use shapeshift_reference::channel::ReferenceChannel;
use shapeshift_reference::id::ObjectId;
use shapeshift_reference::resolver::{self, HostResolver};
use shapeshift_serde::SerializationError;
use shapeshift_serde::buffer::Buffer;
use tracing::{debug, error};

use crate::context::{DeserializeContext, SerializeContext};
use crate::entity::Entity;
use crate::registry::EntityRegistry;
use crate::Result;

/// A type identifier and the payload serialized by that type.
///
/// An empty identifier means "the declared type": instantiating such an envelope
/// ignores the payload and builds a fresh declared instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    type_name: String,
    payload: Buffer,
    /// Identifiers of the payload's handles, parallel to its handle groups
    identifiers: Option<Vec<Vec<Option<ObjectId>>>>,
}

impl Envelope {
    pub fn new(type_name: impl Into<String>, payload: Buffer) -> Self {
        Self {
            type_name: type_name.into(),
            payload,
            identifiers: None,
        }
    }

    /// Serialize `value` under its runtime type identifier.
    pub fn record<B: ?Sized + Entity>(value: &B, channel: &ReferenceChannel) -> Result<Self> {
        Self::record_as(value.type_name(), value, channel)
    }

    /// Serialize `value` under an explicit identifier.
    ///
    /// If the channel has a resolver, the handles of the payload are also described, so
    /// that the envelope can be [`relink`](Self::relink)ed later.
    pub fn record_as<B: ?Sized + Entity>(
        type_name: impl Into<String>,
        value: &B,
        channel: &ReferenceChannel,
    ) -> Result<Self> {
        let payload = to_buffer(value, channel)?;
        let identifiers = channel.resolver().map(|resolver| {
            payload
                .handle_groups()
                .iter()
                .map(|group| resolver::describe_group(resolver, group))
                .collect()
        });
        let envelope = Self {
            type_name: type_name.into(),
            payload,
            identifiers,
        };
        debug!(type_name = %envelope.type_name, len = envelope.payload.len(), "recorded envelope");
        Ok(envelope)
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn payload(&self) -> &Buffer {
        &self.payload
    }

    pub fn identifiers(&self) -> Option<&[Vec<Option<ObjectId>>]> {
        self.identifiers.as_deref()
    }

    pub fn into_parts(self) -> (String, Buffer) {
        (self.type_name, self.payload)
    }

    /// Returns true if this envelope stands for the declared type
    pub fn is_declared(&self) -> bool {
        self.type_name.is_empty()
    }

    /// Rebuild the payload's handle groups from the recorded identifiers, with handles
    /// that are live for `resolver`.
    ///
    /// Misses become absent handles and are returned. Does nothing if no identifiers
    /// were recorded.
    pub fn relink(&mut self, resolver: &dyn HostResolver) -> Vec<UnresolvedReference> {
        let mut unresolved = Vec::new();
        if let Some(identifiers) = &self.identifiers {
            let groups = identifiers
                .iter()
                .map(|ids| resolver::resolve_group(Some(resolver), ids, &mut unresolved))
                .collect();
            self.payload.set_handle_groups(groups);
        }
        unresolved
    }

    /// Build the recorded variant of the interface `B` and feed it the payload.
    ///
    /// An empty identifier builds a fresh instance with `declared` and leaves it
    /// uninitialized. The whole payload must be consumed.
    pub fn instantiate<B: ?Sized + Entity>(
        &self,
        registry: &EntityRegistry,
        channel: &ReferenceChannel,
        declared: fn() -> Box<B>,
    ) -> Result<Instantiated<B>> {
        if self.is_declared() {
            return Ok(Instantiated {
                value: declared(),
                unresolved: Vec::new(),
            });
        }
        let mut value = registry.instantiate::<B>(&self.type_name)?;
        let mut payload = Buffer::from_parts(
            self.payload.to_bytes(),
            self.payload.handle_groups().to_vec(),
        );
        let unresolved = from_buffer(&mut *value, &mut payload, registry, channel)?;
        Ok(Instantiated { value, unresolved })
    }
}

/// An entity rebuilt from an [`Envelope`], with the references that could not be resolved.
#[derive(Debug)]
pub struct Instantiated<B: ?Sized + Entity> {
    pub value: Box<B>,
    pub unresolved: Vec<UnresolvedReference>,
}

/// Serialize `value` into a fresh buffer.
pub fn to_buffer<B: ?Sized + Entity>(value: &B, channel: &ReferenceChannel) -> Result<Buffer> {
    let mut buffer = Buffer::new();
    value.serialize(&mut SerializeContext::new(&mut buffer, channel))?;
    Ok(buffer)
}

/// Populate `value` from the start of `buffer`, returning the references that could
/// not be resolved.
///
/// With [`verify_frames`](crate::config::DeserializeConfig::verify_frames) set, the
/// buffer must be fully consumed.
pub fn from_buffer<B: ?Sized + Entity>(
    value: &mut B,
    buffer: &mut Buffer,
    registry: &EntityRegistry,
    channel: &ReferenceChannel,
) -> Result<Vec<UnresolvedReference>> {
    let mut ctx = DeserializeContext::new(buffer, registry, channel);
    value.init(&mut ctx)?;
    let unresolved = ctx.into_unresolved();
    if registry.config().verify_frames && buffer.unread_len() > 0 {
        let consumed = buffer.position();
        error!(entity = value.type_name(), consumed, len = buffer.len(), "entity did not consume its payload");
        return Err(SerializationError::FrameMismatch {
            expected: buffer.len(),
            consumed,
        }
        .into());
    }
    Ok(unresolved)
}

/// Deep copy an entity by serializing it and instantiating its runtime type.
///
/// Handles are shared with the original, not copied.
pub fn clone_entity<B: ?Sized + Entity>(registry: &EntityRegistry, value: &B) -> Result<Box<B>> {
    let channel = ReferenceChannel::direct();
    let mut buffer = to_buffer(value, &channel)?;
    let mut copy = registry.instantiate::<B>(value.type_name())?;
    from_buffer(&mut *copy, &mut buffer, registry, &channel)?;
    Ok(copy)
}
