use crate::id::ObjectId;

/// An identifier-mode reference that the host could not map to a live object.
///
/// This is not propagated as an error: the field reads as an absent handle and the
/// reference is collected so the caller can report or retry it.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("no live object for reference {id}")]
pub struct UnresolvedReference {
    pub id: ObjectId,
}
