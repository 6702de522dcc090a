use alloc::string::String;

pub type Result<T> = core::result::Result<T, EntityError>;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EntityError {
    #[error(transparent)]
    Serialization(#[from] shapeshift_serde::SerializationError),
    #[error("type {0:?} is not registered for this interface")]
    UnknownType(String),
    #[error("type {0:?} is declared but has no constructor")]
    MissingFactory(String),
    #[error("type {0:?} is already registered for this interface")]
    AlreadyRegistered(String),
    #[error("expected an entity of type {expected} but found {found}")]
    IncorrectType { expected: &'static str, found: String },
}
