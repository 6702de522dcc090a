pub type Result<T> = core::result::Result<T, SerializationError>;

/// Errors raised while writing to or reading from a [`Buffer`](crate::buffer::Buffer).
///
/// All of them are fatal for the value being reconstructed: the payload is either corrupt
/// or was produced by a writer with a different field order.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SerializationError {
    #[error("buffer underrun: requested {requested} bytes but only {remaining} remain")]
    BufferUnderrun { requested: usize, remaining: usize },
    #[error("handle group {index} requested but the buffer only holds {available}")]
    HandleUnderrun { index: usize, available: usize },
    #[error("invalid length prefix {0}")]
    InvalidLength(i32),
    #[error("length {0} does not fit in an i32 prefix")]
    LengthOverflow(usize),
    #[error("string payload is not valid utf-8")]
    InvalidUtf8,
    #[error("unknown reference record tag {0}")]
    InvalidReferenceTag(u8),
    #[error("frame declared {expected} bytes but {consumed} were consumed")]
    FrameMismatch { expected: usize, consumed: usize },
    #[error("cannot rewind: fewer than 4 bytes have been read")]
    CursorUnderflow,
}
