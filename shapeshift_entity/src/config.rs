use serde::{Deserialize, Serialize};

/// What to do when a polymorphic field names a type that is not registered.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnknownTypePolicy {
    /// Fail the whole read with [`EntityError::UnknownType`](crate::EntityError::UnknownType)
    #[default]
    Fail,
    /// Skip the payload and use a fresh instance of the declared type
    FallbackToDeclared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeserializeConfig {
    pub unknown_type: UnknownTypePolicy,
    /// If true, every nested entity must consume exactly its framed payload.
    /// If false, an unread tail of a frame is skipped.
    pub verify_frames: bool,
}

impl Default for DeserializeConfig {
    fn default() -> Self {
        Self {
            unknown_type: UnknownTypePolicy::default(),
            verify_frames: true,
        }
    }
}
