use crate::config::Limits;
use crate::error::OscError;
use crate::timing::OscTime;

/// Argument type tag as it appears in the type-tag string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Int,
    Float,
    String,
    Blob,
    Double,
    Time,
    True,
    False,
    /// A tag byte this codec has no payload rule for.
    Other(u8),
}

impl Tag {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            b'i' => Tag::Int,
            b'f' => Tag::Float,
            b's' => Tag::String,
            b'b' => Tag::Blob,
            b'd' => Tag::Double,
            b't' => Tag::Time,
            b'T' => Tag::True,
            b'F' => Tag::False,
            other => Tag::Other(other),
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Tag::Int => b'i',
            Tag::Float => b'f',
            Tag::String => b's',
            Tag::Blob => b'b',
            Tag::Double => b'd',
            Tag::Time => b't',
            Tag::True => b'T',
            Tag::False => b'F',
            Tag::Other(byte) => byte,
        }
    }

    pub fn as_char(self) -> char {
        char::from(self.as_byte())
    }

    /// Payload width for fixed-size tags; `None` for strings, blobs and
    /// unknown tags.
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            Tag::Int | Tag::Float => Some(4),
            Tag::Double | Tag::Time => Some(8),
            Tag::True | Tag::False => Some(0),
            Tag::String | Tag::Blob | Tag::Other(_) => None,
        }
    }

    pub fn is_supported(self) -> bool {
        !matches!(self, Tag::Other(_))
    }
}

/// Resolved argument payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f32),
    Double(f64),
    /// String payload (including its NUL terminator) or blob contents.
    Bytes(Vec<u8>),
    Time(OscTime),
    /// Booleans: the truth value lives in the tag.
    Unit,
}

#[derive(Debug, Clone, PartialEq)]
enum Slot {
    Ready(Value),
    Failed(OscError),
}

/// One OSC argument.
///
/// # Examples
/// ```
/// use oscwire_core::{Tag, TypedValue};
///
/// let v = TypedValue::string("hello");
/// assert_eq!(v.tag(), Tag::String);
/// assert_eq!(v.bytes(), 6);
/// assert_eq!(v.get_str(), Some("hello"));
/// assert_eq!(v.get_int(), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TypedValue {
    tag: Tag,
    bytes: usize,
    slot: Slot,
}

impl TypedValue {
    pub fn int(value: i32) -> Self {
        Self::ready(Tag::Int, 4, Value::Int(value))
    }

    pub fn float(value: f32) -> Self {
        Self::ready(Tag::Float, 4, Value::Float(value))
    }

    pub fn double(value: f64) -> Self {
        Self::ready(Tag::Double, 8, Value::Double(value))
    }

    pub fn time(value: OscTime) -> Self {
        Self::ready(Tag::Time, 8, Value::Time(value))
    }

    pub fn boolean(value: bool) -> Self {
        let tag = if value { Tag::True } else { Tag::False };
        Self::ready(tag, 0, Value::Unit)
    }

    /// String argument. The payload ends at the first NUL, if any.
    pub fn string(value: &str) -> Self {
        Self::string_with_limits(value.as_bytes(), &Limits::default())
    }

    pub fn blob(data: &[u8]) -> Self {
        Self::blob_with_limits(data, &Limits::default())
    }

    pub fn string_with_limits(raw: &[u8], limits: &Limits) -> Self {
        let content = match raw.iter().position(|&b| b == 0) {
            Some(nul) => &raw[..nul],
            None => raw,
        };
        match copy_payload(content, true, limits) {
            Ok(buf) => Self::ready(Tag::String, buf.len(), Value::Bytes(buf)),
            Err(err) => Self::failed(Tag::String, err),
        }
    }

    pub fn blob_with_limits(data: &[u8], limits: &Limits) -> Self {
        // the wire length prefix is a u32
        if u32::try_from(data.len()).is_err() {
            return Self::failed(Tag::Blob, OscError::AllocFailed);
        }
        match copy_payload(data, false, limits) {
            Ok(buf) => Self::ready(Tag::Blob, buf.len() + 4, Value::Bytes(buf)),
            Err(err) => Self::failed(Tag::Blob, err),
        }
    }

    /// Deep copy that re-checks payload allocation against `limits`.
    pub fn copy_with_limits(&self, limits: &Limits) -> Self {
        match (&self.slot, self.tag) {
            (Slot::Ready(Value::Bytes(content)), Tag::String) => {
                let text = content.strip_suffix(&[0]).unwrap_or(content);
                Self::string_with_limits(text, limits)
            }
            (Slot::Ready(Value::Bytes(data)), Tag::Blob) => Self::blob_with_limits(data, limits),
            _ => self.clone(),
        }
    }

    /// Placeholder created while decoding the type-tag string.
    pub(crate) fn pending(tag: Tag) -> Self {
        Self::failed(tag, OscError::Invalid)
    }

    fn ready(tag: Tag, bytes: usize, value: Value) -> Self {
        Self {
            tag,
            bytes,
            slot: Slot::Ready(value),
        }
    }

    fn failed(tag: Tag, err: OscError) -> Self {
        Self {
            tag,
            bytes: 0,
            slot: Slot::Failed(err),
        }
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Wire payload length in bytes, before padding.
    pub fn bytes(&self) -> usize {
        self.bytes
    }

    pub fn error(&self) -> Option<OscError> {
        match self.slot {
            Slot::Ready(_) => None,
            Slot::Failed(err) => Some(err),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.slot == Slot::Failed(OscError::Invalid)
    }

    pub fn value(&self) -> Option<&Value> {
        match &self.slot {
            Slot::Ready(value) => Some(value),
            Slot::Failed(_) => None,
        }
    }

    pub fn get_int(&self) -> Option<i32> {
        match (self.tag, self.value()?) {
            (Tag::Int, Value::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_float(&self) -> Option<f32> {
        match (self.tag, self.value()?) {
            (Tag::Float, Value::Float(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_double(&self) -> Option<f64> {
        match (self.tag, self.value()?) {
            (Tag::Double, Value::Double(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_time(&self) -> Option<OscTime> {
        match (self.tag, self.value()?) {
            (Tag::Time, Value::Time(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_boolean(&self) -> Option<bool> {
        self.value()?;
        match self.tag {
            Tag::True => Some(true),
            Tag::False => Some(false),
            _ => None,
        }
    }

    /// String contents without the terminator.
    pub fn string_bytes(&self) -> Option<&[u8]> {
        let payload = self.payload_for(Tag::String)?;
        Some(payload.strip_suffix(&[0]).unwrap_or(payload))
    }

    pub fn get_str(&self) -> Option<&str> {
        std::str::from_utf8(self.string_bytes()?).ok()
    }

    /// Copy the string payload (terminator included) into `dst`, truncating
    /// to whichever is shorter. Returns the number of bytes copied.
    pub fn string_into(&self, dst: &mut [u8]) -> Option<usize> {
        let payload = self.payload_for(Tag::String)?;
        Some(copy_range(payload, dst, 0, payload.len()))
    }

    /// Copy `len` payload bytes starting at `offset` into `dst`.
    pub fn string_range_into(&self, dst: &mut [u8], offset: usize, len: usize) -> Option<usize> {
        let payload = self.payload_for(Tag::String)?;
        Some(copy_range(payload, dst, offset, len))
    }

    pub fn get_blob(&self) -> Option<&[u8]> {
        self.payload_for(Tag::Blob)
    }

    pub fn blob_len(&self) -> Option<usize> {
        self.get_blob().map(<[u8]>::len)
    }

    pub fn blob_into(&self, dst: &mut [u8]) -> Option<usize> {
        let data = self.get_blob()?;
        Some(copy_range(data, dst, 0, data.len()))
    }

    pub fn blob_range_into(&self, dst: &mut [u8], offset: usize, len: usize) -> Option<usize> {
        let data = self.get_blob()?;
        Some(copy_range(data, dst, offset, len))
    }

    fn payload_for(&self, tag: Tag) -> Option<&[u8]> {
        match self.value()? {
            Value::Bytes(buf) if self.tag == tag => Some(buf),
            _ => None,
        }
    }
}

/// Conversion used by `Message::add` and `Message::set`.
///
/// Payload-carrying conversions allocate through `limits`, so a capped
/// message records an allocation failure instead of growing.
pub trait IntoTypedValue {
    fn into_typed_value(self, limits: &Limits) -> TypedValue;
}

impl IntoTypedValue for i32 {
    fn into_typed_value(self, _: &Limits) -> TypedValue {
        TypedValue::int(self)
    }
}

impl IntoTypedValue for f32 {
    fn into_typed_value(self, _: &Limits) -> TypedValue {
        TypedValue::float(self)
    }
}

impl IntoTypedValue for f64 {
    fn into_typed_value(self, _: &Limits) -> TypedValue {
        TypedValue::double(self)
    }
}

impl IntoTypedValue for bool {
    fn into_typed_value(self, _: &Limits) -> TypedValue {
        TypedValue::boolean(self)
    }
}

impl IntoTypedValue for OscTime {
    fn into_typed_value(self, _: &Limits) -> TypedValue {
        TypedValue::time(self)
    }
}

impl IntoTypedValue for &str {
    fn into_typed_value(self, limits: &Limits) -> TypedValue {
        TypedValue::string_with_limits(self.as_bytes(), limits)
    }
}

impl IntoTypedValue for &String {
    fn into_typed_value(self, limits: &Limits) -> TypedValue {
        TypedValue::string_with_limits(self.as_bytes(), limits)
    }
}

impl IntoTypedValue for &[u8] {
    fn into_typed_value(self, limits: &Limits) -> TypedValue {
        TypedValue::blob_with_limits(self, limits)
    }
}

impl<const N: usize> IntoTypedValue for &[u8; N] {
    fn into_typed_value(self, limits: &Limits) -> TypedValue {
        TypedValue::blob_with_limits(self, limits)
    }
}

impl IntoTypedValue for &TypedValue {
    fn into_typed_value(self, limits: &Limits) -> TypedValue {
        self.copy_with_limits(limits)
    }
}

impl IntoTypedValue for TypedValue {
    fn into_typed_value(self, limits: &Limits) -> TypedValue {
        let over_limit = matches!(
            self.value(),
            Some(Value::Bytes(buf)) if !limits.allows_payload(buf.len())
        );
        if over_limit {
            TypedValue::failed(self.tag, OscError::AllocFailed)
        } else {
            self
        }
    }
}

fn copy_payload(src: &[u8], terminate: bool, limits: &Limits) -> Result<Vec<u8>, OscError> {
    let len = src.len() + usize::from(terminate);
    if !limits.allows_payload(len) {
        return Err(OscError::AllocFailed);
    }
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| OscError::AllocFailed)?;
    buf.extend_from_slice(src);
    if terminate {
        buf.push(0);
    }
    Ok(buf)
}

fn copy_range(src: &[u8], dst: &mut [u8], offset: usize, len: usize) -> usize {
    let start = offset.min(src.len());
    let end = start.saturating_add(len).min(src.len());
    let count = (end - start).min(dst.len());
    dst[..count].copy_from_slice(&src[start..start + count]);
    count
}
