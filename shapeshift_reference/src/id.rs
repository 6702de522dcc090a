use alloc::string::String;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Identity of a host-owned object: the container that owns it and its slot inside that
/// container.
///
/// An empty `container` is reserved on the wire for an absent reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId {
    pub container: String,
    pub slot: i64,
}

impl ObjectId {
    pub fn new(container: impl Into<String>, slot: i64) -> Self {
        Self {
            container: container.into(),
            slot,
        }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.container, self.slot)
    }
}
