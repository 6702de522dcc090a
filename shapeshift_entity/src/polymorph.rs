//! Fields whose runtime type can be swapped for any registered variant.
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use shapeshift_reference::UnresolvedReference;
use shapeshift_reference::channel::ReferenceChannel;
use tracing::debug;

use crate::Result;
use crate::context::{DeserializeContext, SerializeContext};
use crate::entity::Entity;
use crate::envelope::Envelope;
use crate::registry::{EntityRegistry, Factory};

/// A field declared as the interface `B` whose value may be substituted by any variant
/// registered for `B`.
///
/// Without a substitution the value is an instance of the declared type, built by the
/// declared factory. Substituting always starts from a fresh instance of the new variant:
/// fields of the previous value are discarded, not merged.
///
/// Inside a parent entity the field is written as its type identifier (empty without a
/// substitution) followed by the framed value.
pub struct Polymorph<B: ?Sized + Entity> {
    declared: Factory<B>,
    type_identifier: String,
    envelope: Option<Envelope>,
    value: Box<B>,
}

impl<B: ?Sized + Entity> fmt::Debug for Polymorph<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Polymorph")
            .field("type_identifier", &self.type_identifier)
            .field("value", &self.value)
            .finish()
    }
}

impl<B: ?Sized + Entity> Polymorph<B> {
    pub fn new(declared: Factory<B>) -> Self {
        Self {
            declared,
            type_identifier: String::new(),
            envelope: None,
            value: declared(),
        }
    }

    /// Replace the value with a fresh instance of the variant `name`.
    ///
    /// An empty `name` is the same as [`clear_substitution`](Self::clear_substitution).
    pub fn substitute(&mut self, registry: &EntityRegistry, name: &str) -> Result<()> {
        if name.is_empty() {
            self.clear_substitution();
            return Ok(());
        }
        self.value = registry.instantiate::<B>(name)?;
        debug!(from = %self.type_identifier, to = name, "substituted entity type");
        self.type_identifier = String::from(name);
        self.envelope = None;
        Ok(())
    }

    /// Go back to a fresh instance of the declared type.
    pub fn clear_substitution(&mut self) {
        if self.is_substituted() {
            debug!(from = %self.type_identifier, "cleared entity substitution");
        }
        self.type_identifier.clear();
        self.envelope = None;
        self.value = (self.declared)();
    }

    pub fn is_substituted(&self) -> bool {
        !self.type_identifier.is_empty()
    }

    /// Identifier of the substituted variant, empty if there is none
    pub fn type_identifier(&self) -> &str {
        &self.type_identifier
    }

    pub fn value(&self) -> &B {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut B {
        &mut self.value
    }

    pub fn into_inner(self) -> Box<B> {
        self.value
    }

    /// The envelope from the last [`record`](Self::record) or
    /// [`set_envelope`](Self::set_envelope), if it is still current
    pub fn envelope(&self) -> Option<&Envelope> {
        self.envelope.as_ref()
    }

    pub fn envelope_mut(&mut self) -> Option<&mut Envelope> {
        self.envelope.as_mut()
    }

    /// Record the current value under the substitution identifier.
    pub fn record(&mut self, channel: &ReferenceChannel) -> Result<&Envelope> {
        let envelope = Envelope::record_as(self.type_identifier.as_str(), &*self.value, channel)?;
        Ok(self.envelope.insert(envelope))
    }

    /// Adopt an envelope recorded elsewhere.
    ///
    /// The type identifier and the value only change once [`restore`](Self::restore)
    /// succeeds, so serializing in between still writes the current value.
    pub fn set_envelope(&mut self, envelope: Envelope) {
        self.envelope = Some(envelope);
    }

    /// Rebuild the value from the current envelope and take on its type identifier,
    /// returning the references that could not be resolved. Does nothing without an
    /// envelope.
    ///
    /// On error the identifier and the value are left unchanged.
    pub fn restore(
        &mut self,
        registry: &EntityRegistry,
        channel: &ReferenceChannel,
    ) -> Result<Vec<UnresolvedReference>> {
        let Some(envelope) = &self.envelope else {
            return Ok(Vec::new());
        };
        let restored = envelope.instantiate(registry, channel, self.declared)?;
        if self.type_identifier != envelope.type_name() {
            debug!(from = %self.type_identifier, to = envelope.type_name(), "restored entity type");
        }
        self.type_identifier = String::from(envelope.type_name());
        self.value = restored.value;
        Ok(restored.unresolved)
    }

    /// Write the substitution identifier, then the framed value.
    pub fn serialize(&self, ctx: &mut SerializeContext) -> Result<()> {
        ctx.write_tagged(&self.type_identifier, &*self.value)
    }

    /// Read a field written by [`serialize`](Self::serialize), building the variant it names.
    pub fn init(&mut self, ctx: &mut DeserializeContext) -> Result<()> {
        let (type_identifier, value) = ctx.read_tagged(self.declared)?;
        self.type_identifier = type_identifier;
        self.value = value;
        self.envelope = None;
        Ok(())
    }
}

impl<T: Entity + Default> Default for Polymorph<T> {
    fn default() -> Self {
        Self::new(|| Box::new(T::default()))
    }
}
