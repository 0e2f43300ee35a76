use serde::Serialize;
use thiserror::Error;

/// Flat error kinds recorded on messages and values.
///
/// There is no "ok" variant: a healthy object carries `None` where an
/// `Option<OscError>` is stored.
///
/// # Examples
/// ```
/// use oscwire_core::OscError;
///
/// let err = OscError::IndexOutOfBounds;
/// assert!(err.to_string().contains("out of bounds"));
/// ```
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OscError {
    /// A bounded buffer refused to grow past its configured limit.
    #[error("buffer full")]
    BufferFull,
    /// The value is a placeholder that has not been resolved yet.
    #[error("invalid or pending value")]
    Invalid,
    /// A payload, argument list or decode buffer could not be allocated.
    #[error("allocation failed")]
    AllocFailed,
    /// A position past the end of the argument list was requested.
    #[error("index out of bounds")]
    IndexOutOfBounds,
    /// Strict decoding saw bytes that do not form a valid message.
    #[error("malformed OSC input")]
    Malformed,
}
