//! Lookup between live handles and their host identifiers.
use alloc::string::String;
use alloc::vec::Vec;
use hashbrown::HashMap;
use shapeshift_serde::buffer::HandleGroup;
use shapeshift_serde::handle::Handle;
use tracing::{trace, warn};

use crate::UnresolvedReference;
use crate::id::ObjectId;

/// The host side of identifier mode.
pub trait HostResolver: Send + Sync {
    /// Find the live object at `slot` in `container`
    fn resolve(&self, container: &str, slot: i64) -> Option<Handle>;

    /// Find the identifier of a live object
    fn describe(&self, handle: &Handle) -> Option<ObjectId>;
}

/// Describe every handle of a group. Absent handles, and handles the host cannot
/// describe, become `None`.
pub fn describe_group(resolver: &dyn HostResolver, group: &[Option<Handle>]) -> Vec<Option<ObjectId>> {
    group
        .iter()
        .map(|handle| {
            let handle = handle.as_ref()?;
            let id = resolver.describe(handle);
            if id.is_none() {
                warn!(?handle, "host could not describe handle, it will be sent as absent");
            }
            id
        })
        .collect()
}

/// Resolve a group of identifiers. Misses become absent handles and are pushed to `unresolved`.
pub fn resolve_group(
    resolver: Option<&dyn HostResolver>,
    ids: &[Option<ObjectId>],
    unresolved: &mut Vec<UnresolvedReference>,
) -> HandleGroup {
    ids.iter()
        .map(|id| {
            let id = id.as_ref()?;
            match resolver.and_then(|r| r.resolve(&id.container, id.slot)) {
                Some(handle) => {
                    trace!(%id, ?handle, "resolved reference");
                    Some(handle)
                }
                None => {
                    warn!(%id, "unresolved reference, reading it as absent");
                    unresolved.push(UnresolvedReference { id: id.clone() });
                    None
                }
            }
        })
        .collect()
}

/// An in-memory [`HostResolver`]: containers of slotted handles.
#[derive(Debug, Default, Clone)]
pub struct ObjectTable {
    containers: HashMap<String, HashMap<i64, Handle>>,
    ids: HashMap<Handle, ObjectId>,
}

impl ObjectTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handle` at `slot` in `container`, replacing any previous object there.
    ///
    /// # Panics
    /// If `container` is empty, since an empty container marks an absent reference on the wire.
    pub fn insert(&mut self, container: impl Into<String>, slot: i64, handle: Handle) {
        let id = ObjectId::new(container, slot);
        if id.container.is_empty() {
            panic!("Object containers must have a non-empty name");
        }
        if let Some(previous) = self
            .containers
            .entry(id.container.clone())
            .or_default()
            .insert(slot, handle.clone())
        {
            self.ids.remove(&previous);
        }
        self.ids.insert(handle, id);
    }

    /// Drop every object of a container, as when the host unloads it.
    pub fn remove_container(&mut self, container: &str) {
        if let Some(objects) = self.containers.remove(container) {
            for handle in objects.values() {
                self.ids.remove(handle);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl HostResolver for ObjectTable {
    fn resolve(&self, container: &str, slot: i64) -> Option<Handle> {
        self.containers.get(container)?.get(&slot).cloned()
    }

    fn describe(&self, handle: &Handle) -> Option<ObjectId> {
        self.ids.get(handle).cloned()
    }
}
