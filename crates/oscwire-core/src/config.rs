use serde::{Deserialize, Serialize};

/// Bytes reserved at a time by the decode buffer.
pub const DECODE_CHUNK: usize = 16;

/// Resource limits and decode options for one message.
///
/// # Examples
/// ```
/// use oscwire_core::Limits;
///
/// let limits: Limits = serde_json::from_str(r#"{"strict": true}"#).unwrap();
/// assert!(limits.strict);
/// assert_eq!(limits.max_payload_bytes, None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Largest string/blob payload a value may allocate. Larger payloads
    /// are treated as an allocation failure.
    pub max_payload_bytes: Option<usize>,
    /// Largest number of bytes the decoder buffers before reporting
    /// `BufferFull`.
    pub max_decode_buffer: Option<usize>,
    /// Reject malformed input instead of stalling on it.
    pub strict: bool,
}

impl Limits {
    /// Limits with a payload cap and everything else at defaults.
    pub fn with_max_payload(max_payload_bytes: usize) -> Self {
        Self {
            max_payload_bytes: Some(max_payload_bytes),
            ..Self::default()
        }
    }

    pub(crate) fn allows_payload(&self, len: usize) -> bool {
        self.max_payload_bytes.is_none_or(|max| len <= max)
    }

    pub(crate) fn allows_decode_buffer(&self, len: usize) -> bool {
        self.max_decode_buffer.is_none_or(|max| len <= max)
    }
}
