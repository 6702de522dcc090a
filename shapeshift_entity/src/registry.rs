//! Process-wide mapping from type identifiers to entity constructors.
use alloc::boxed::Box;
use alloc::string::ToString;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::fmt;
use core::hash::{Hash, Hasher};
use hashbrown::HashMap;
use seahash::SeaHasher;
use tracing::debug;

use crate::config::DeserializeConfig;
use crate::entity::Entity;
use crate::{EntityError, Result};

/// Hash of every registered `(interface, identifier)` pair, in registration order.
///
/// Two peers can only exchange polymorphic entities if their hashes match.
pub type RegistryHash = u64;

/// A zero-argument constructor returning a fresh variant as its interface `B`
pub type Factory<B> = fn() -> Box<B>;

/// `Factory<B>` with `B` erased, so that one registry can hold several interfaces
type ErasedFactory = Box<dyn Any + Send + Sync>;

struct Variant {
    name: &'static str,
    factory: Option<ErasedFactory>,
}

#[derive(Default)]
struct Interface {
    name: &'static str,
    variants: Vec<Variant>,
    index: HashMap<&'static str, usize>,
}

/// Maps type identifiers to constructors, per declared interface.
///
/// A polymorphic field is declared as some interface `B` (`dyn Entity`, or `dyn Trait`
/// for a trait that extends [`Entity`]). The variants that may be substituted for it are
/// registered under that interface: the same concrete type can be registered under
/// several interfaces.
///
/// ```rust,ignore
/// let mut registry = EntityRegistry::default();
/// registry.add::<dyn Weapon>(|| Box::new(Sword::default()))?;
/// registry.add::<dyn Weapon>(|| Box::new(Bow::default()))?;
/// registry.validate()?;
/// let hash = registry.finish();
/// ```
pub struct EntityRegistry {
    interfaces: HashMap<TypeId, Interface>,
    config: DeserializeConfig,
    hasher: SeaHasher,
    hash: Option<RegistryHash>,
}

impl fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for interface in self.interfaces.values() {
            let names: Vec<_> = interface.variants.iter().map(|v| v.name).collect();
            map.entry(&interface.name, &names);
        }
        map.finish()
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new(DeserializeConfig::default())
    }
}

impl EntityRegistry {
    pub fn new(config: DeserializeConfig) -> Self {
        Self {
            interfaces: HashMap::default(),
            config,
            hasher: SeaHasher::new(),
            hash: None,
        }
    }

    pub fn config(&self) -> &DeserializeConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: DeserializeConfig) {
        self.config = config;
    }

    /// Register a constructible variant for the interface `B`.
    ///
    /// The identifier is the [`Entity::type_name`] of the instance built by `factory`;
    /// it is returned.
    ///
    /// # Panics
    /// If called after [`finish`](Self::finish), or if the identifier is empty.
    pub fn add<B: ?Sized + Entity>(&mut self, factory: Factory<B>) -> Result<&'static str> {
        let name = factory().type_name();
        self.insert::<B>(name, Some(Box::new(factory)))?;
        debug!(interface = core::any::type_name::<B>(), name, "registered entity type");
        Ok(name)
    }

    /// List a variant for the interface `B` without a constructor.
    ///
    /// It shows up in [`variants`](Self::variants), but [`validate`](Self::validate) and
    /// any attempt to instantiate it fail with [`EntityError::MissingFactory`].
    pub fn declare<B: ?Sized + Entity>(&mut self, name: &'static str) -> Result<()> {
        self.insert::<B>(name, None)?;
        debug!(interface = core::any::type_name::<B>(), name, "declared entity type without a constructor");
        Ok(())
    }

    fn insert<B: ?Sized + Entity>(
        &mut self,
        name: &'static str,
        factory: Option<ErasedFactory>,
    ) -> Result<()> {
        let interface_name = core::any::type_name::<B>();
        if self.hash.is_some() {
            panic!("Tried to register type {name:?} for {interface_name} after the registry was finished");
        }
        if name.is_empty() {
            panic!("Entity types registered for {interface_name} must have a non-empty identifier");
        }
        let interface = self
            .interfaces
            .entry(TypeId::of::<B>())
            .or_insert_with(|| Interface {
                name: interface_name,
                ..Default::default()
            });
        if interface.index.contains_key(name) {
            return Err(EntityError::AlreadyRegistered(name.to_string()));
        }
        interface.index.insert(name, interface.variants.len());
        interface.variants.push(Variant { name, factory });
        interface_name.hash(&mut self.hasher);
        name.hash(&mut self.hasher);
        Ok(())
    }

    /// Returns true if `name` is registered for the interface `B`, with or without a constructor
    pub fn contains<B: ?Sized + Entity>(&self, name: &str) -> bool {
        self.interfaces
            .get(&TypeId::of::<B>())
            .is_some_and(|interface| interface.index.contains_key(name))
    }

    /// Identifiers registered for the interface `B`, in registration order.
    pub fn variants<B: ?Sized + Entity>(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.interfaces
            .get(&TypeId::of::<B>())
            .into_iter()
            .flat_map(|interface| interface.variants.iter().map(|v| v.name))
    }

    /// Check that every registered variant can be constructed.
    pub fn validate(&self) -> Result<()> {
        for interface in self.interfaces.values() {
            if let Some(variant) = interface.variants.iter().find(|v| v.factory.is_none()) {
                return Err(EntityError::MissingFactory(variant.name.to_string()));
            }
        }
        Ok(())
    }

    /// Freeze the registry and return its hash. Later calls return the same hash.
    pub fn finish(&mut self) -> RegistryHash {
        *self.hash.get_or_insert_with(|| self.hasher.finish())
    }

    /// The hash, if [`finish`](Self::finish) was called
    pub fn hash(&self) -> Option<RegistryHash> {
        self.hash
    }

    /// Build a fresh, empty instance of the variant `name` of the interface `B`.
    pub fn instantiate<B: ?Sized + Entity>(&self, name: &str) -> Result<Box<B>> {
        let variant = self
            .interfaces
            .get(&TypeId::of::<B>())
            .and_then(|interface| {
                interface
                    .index
                    .get(name)
                    .map(|&i| &interface.variants[i])
            })
            .ok_or_else(|| EntityError::UnknownType(name.to_string()))?;
        let factory = variant
            .factory
            .as_ref()
            .and_then(|factory| factory.downcast_ref::<Factory<B>>())
            .ok_or_else(|| EntityError::MissingFactory(name.to_string()))?;
        Ok(factory())
    }
}
