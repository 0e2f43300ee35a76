use log::warn;

use crate::config::Limits;
use crate::error::OscError;
use crate::pattern::{MatchResult, match_pattern};
use crate::timing::{OscTime, TimeSource};
use crate::value::{IntoTypedValue, Tag, TypedValue};
use crate::wire::decoder::DecodeScratch;

/// Handler invoked with the whole message on an exact match.
pub trait Dispatch {
    fn dispatch(&mut self, message: &Message);
}

impl<F: FnMut(&Message)> Dispatch for F {
    fn dispatch(&mut self, message: &Message) {
        self(message)
    }
}

/// Handler invoked on a prefix match with the address offset at which the
/// unmatched remainder starts.
pub trait Route {
    fn route(&mut self, message: &Message, offset: usize);
}

impl<F: FnMut(&Message, usize)> Route for F {
    fn route(&mut self, message: &Message, offset: usize) {
        self(message, offset)
    }
}

/// One OSC message.
///
/// # Examples
/// ```
/// use oscwire_core::Message;
///
/// let mut msg = Message::new("/synth/1/freq");
/// msg.add(440.0f32).add("sine");
/// assert_eq!(msg.len(), 2);
/// assert_eq!(msg.get_float(0), Some(440.0));
/// assert_eq!(msg.get_str(1), Some("sine"));
/// assert!(msg.full_match("/synth/*/freq", 0));
/// ```
#[derive(Debug)]
pub struct Message {
    pub(crate) address: Option<String>,
    pub(crate) args: Vec<TypedValue>,
    pub(crate) error: Option<OscError>,
    pub(crate) limits: Limits,
    pub(crate) decoder: DecodeScratch,
}

impl Message {
    pub fn new(address: &str) -> Self {
        Self::with_limits(address, Limits::default())
    }

    pub fn with_limits(address: &str, limits: Limits) -> Self {
        let mut msg = Self::receiver_with_limits(limits);
        msg.error = None;
        msg.set_address(address);
        msg
    }

    /// An address-less message waiting for `fill`.
    ///
    /// Until an address has been decoded the message reports
    /// `OscError::Invalid`, so it can't be encoded by accident.
    pub fn receiver_with_limits(limits: Limits) -> Self {
        Self {
            address: None,
            args: Vec::new(),
            error: Some(OscError::Invalid),
            limits,
            decoder: DecodeScratch::default(),
        }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// Address tail starting at `offset`; `None` past the end or off a
    /// character boundary.
    pub fn address_from(&self, offset: usize) -> Option<&str> {
        self.address()?.get(offset..)
    }

    /// Copy `address` into the message. On allocation failure the address
    /// is cleared and the message records `AllocFailed`.
    pub fn set_address(&mut self, address: &str) -> &mut Self {
        let mut owned = String::new();
        if owned.try_reserve_exact(address.len()).is_err() {
            warn!("could not allocate address of {} bytes", address.len());
            self.address = None;
            self.error = Some(OscError::AllocFailed);
            return self;
        }
        owned.push_str(address);
        self.address = Some(owned);
        self
    }

    /// Append an argument.
    ///
    /// A value that failed to allocate is still appended so the failure is
    /// visible on it, and the message records `AllocFailed`.
    pub fn add<V: IntoTypedValue>(&mut self, value: V) -> &mut Self {
        let value = value.into_typed_value(&self.limits);
        if self.args.try_reserve(1).is_err() {
            warn!("could not grow argument list past {}", self.args.len());
            self.error = Some(OscError::AllocFailed);
            return self;
        }
        self.note_value_error(&value);
        self.args.push(value);
        self
    }

    /// Replace the argument at `position`, or append when `position` equals
    /// the argument count. Further out records `IndexOutOfBounds` and leaves
    /// the arguments untouched.
    pub fn set<V: IntoTypedValue>(&mut self, position: usize, value: V) -> &mut Self {
        match position.cmp(&self.args.len()) {
            std::cmp::Ordering::Less => {
                let value = value.into_typed_value(&self.limits);
                self.note_value_error(&value);
                self.args[position] = value;
                self
            }
            std::cmp::Ordering::Equal => self.add(value),
            std::cmp::Ordering::Greater => {
                warn!("set at {position} but message has {} arguments", self.args.len());
                self.error = Some(OscError::IndexOutOfBounds);
                self
            }
        }
    }

    /// Append a time tag for "now" as reported by `clock`.
    pub fn add_time_now<C: TimeSource + ?Sized>(&mut self, clock: &C) -> &mut Self {
        self.add(clock.now())
    }

    /// Drop every argument and reset the error and decoder state. The
    /// address is kept.
    pub fn empty(&mut self) -> &mut Self {
        self.args = Vec::new();
        self.error = None;
        self.reset_decoder();
        self
    }

    fn note_value_error(&mut self, value: &TypedValue) {
        if let Some(err) = value.error() {
            warn!("{} argument holds an error: {err}", value.tag().as_char());
            self.error = Some(err);
        }
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn args(&self) -> &[TypedValue] {
        &self.args
    }

    pub fn arg(&self, position: usize) -> Option<&TypedValue> {
        self.args.get(position)
    }

    /// The message's own error flag.
    pub fn error(&self) -> Option<OscError> {
        self.error
    }

    /// The message's own error or, failing that, the first argument error.
    pub fn aggregate_error(&self) -> Option<OscError> {
        self.error.or_else(|| self.args.iter().find_map(TypedValue::error))
    }

    pub fn has_error(&self) -> bool {
        self.aggregate_error().is_some()
    }

    pub fn get_type(&self, position: usize) -> Option<Tag> {
        self.arg(position).map(TypedValue::tag)
    }

    /// Wire payload length of an argument, before padding.
    pub fn get_data_length(&self, position: usize) -> Option<usize> {
        self.arg(position).map(TypedValue::bytes)
    }

    pub fn get_int(&self, position: usize) -> Option<i32> {
        self.arg(position)?.get_int()
    }

    pub fn get_float(&self, position: usize) -> Option<f32> {
        self.arg(position)?.get_float()
    }

    pub fn get_double(&self, position: usize) -> Option<f64> {
        self.arg(position)?.get_double()
    }

    pub fn get_boolean(&self, position: usize) -> Option<bool> {
        self.arg(position)?.get_boolean()
    }

    pub fn get_time(&self, position: usize) -> Option<OscTime> {
        self.arg(position)?.get_time()
    }

    pub fn get_str(&self, position: usize) -> Option<&str> {
        self.arg(position)?.get_str()
    }

    pub fn get_string_into(&self, position: usize, dst: &mut [u8]) -> Option<usize> {
        self.arg(position)?.string_into(dst)
    }

    pub fn get_string_range_into(
        &self,
        position: usize,
        dst: &mut [u8],
        offset: usize,
        len: usize,
    ) -> Option<usize> {
        self.arg(position)?.string_range_into(dst, offset, len)
    }

    pub fn get_blob(&self, position: usize) -> Option<&[u8]> {
        self.arg(position)?.get_blob()
    }

    pub fn get_blob_len(&self, position: usize) -> Option<usize> {
        self.arg(position)?.blob_len()
    }

    pub fn get_blob_into(&self, position: usize, dst: &mut [u8]) -> Option<usize> {
        self.arg(position)?.blob_into(dst)
    }

    pub fn get_blob_range_into(
        &self,
        position: usize,
        dst: &mut [u8],
        offset: usize,
        len: usize,
    ) -> Option<usize> {
        self.arg(position)?.blob_range_into(dst, offset, len)
    }

    fn tag_is(&self, position: usize, tags: &[Tag]) -> bool {
        self.get_type(position).is_some_and(|tag| tags.contains(&tag))
    }

    pub fn is_int(&self, position: usize) -> bool {
        self.tag_is(position, &[Tag::Int])
    }

    pub fn is_float(&self, position: usize) -> bool {
        self.tag_is(position, &[Tag::Float])
    }

    pub fn is_double(&self, position: usize) -> bool {
        self.tag_is(position, &[Tag::Double])
    }

    pub fn is_string(&self, position: usize) -> bool {
        self.tag_is(position, &[Tag::String])
    }

    pub fn is_blob(&self, position: usize) -> bool {
        self.tag_is(position, &[Tag::Blob])
    }

    pub fn is_boolean(&self, position: usize) -> bool {
        self.tag_is(position, &[Tag::True, Tag::False])
    }

    pub fn is_time(&self, position: usize) -> bool {
        self.tag_is(position, &[Tag::Time])
    }

    /// Match `pattern` against the address starting at `offset`.
    ///
    /// Offsets in the result are relative to `offset`. A message without
    /// an address, or an offset past its end, never matches.
    pub fn match_pattern(&self, pattern: &str, offset: usize) -> MatchResult {
        match self.address_from(offset) {
            Some(address) => match_pattern(pattern, address),
            None => MatchResult::default(),
        }
    }

    pub fn full_match(&self, pattern: &str, offset: usize) -> bool {
        self.match_pattern(pattern, offset).is_full()
    }

    /// Address bytes (from `offset`) covered by a full or routable prefix
    /// match.
    pub fn match_prefix(&self, pattern: &str, offset: usize) -> Option<usize> {
        let address = self.address_from(offset)?;
        match_pattern(pattern, address).route_offset(address)
    }

    /// Call `handler` with this message when `pattern` fully matches the
    /// address from `offset`. Returns whether it was called.
    pub fn dispatch<H: Dispatch + ?Sized>(
        &self,
        pattern: &str,
        handler: &mut H,
        offset: usize,
    ) -> bool {
        if !self.full_match(pattern, offset) {
            return false;
        }
        handler.dispatch(self);
        true
    }

    /// Call `handler` when `pattern` matches a prefix of the address from
    /// `offset`, passing the absolute offset of the unmatched remainder.
    ///
    /// # Examples
    /// ```
    /// use oscwire_core::Message;
    ///
    /// let msg = Message::new("/mixer/ch/3/gain");
    /// let mut seen = Vec::new();
    /// msg.route("/mixer", &mut |m: &Message, offset: usize| {
    ///     m.route("/ch/*", &mut |m: &Message, offset: usize| {
    ///         seen.push(m.address_from(offset).unwrap_or_default().to_owned());
    ///     }, offset);
    /// }, 0);
    /// assert_eq!(seen, ["/gain"]);
    /// ```
    pub fn route<H: Route + ?Sized>(&self, pattern: &str, handler: &mut H, offset: usize) -> bool {
        let Some(matched) = self.match_prefix(pattern, offset) else {
            return false;
        };
        handler.route(self, offset + matched);
        true
    }
}

impl Default for Message {
    fn default() -> Self {
        Self::receiver_with_limits(Limits::default())
    }
}

/// Deep copy. Payloads are re-allocated under the copy's limits and the
/// copy starts with a fresh decoder.
impl Clone for Message {
    fn clone(&self) -> Self {
        let mut copy = Self {
            address: None,
            args: Vec::new(),
            error: self.error,
            limits: self.limits,
            decoder: DecodeScratch::default(),
        };
        if let Some(address) = &self.address {
            copy.set_address(address);
        }
        for arg in &self.args {
            copy.add(arg);
        }
        copy
    }
}

/// Messages are equal when their addresses and arguments are; decoder
/// state and limits are ignored.
impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address && self.args == other.args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::FixedClock;

    #[test]
    fn new_message_is_healthy_and_empty() {
        let msg = Message::new("/a");
        assert_eq!(msg.address(), Some("/a"));
        assert!(msg.is_empty());
        assert!(!msg.has_error());
    }

    #[test]
    fn default_receiver_is_invalid_until_decoded() {
        let rx = Message::default();
        assert_eq!(rx.address(), None);
        assert_eq!(rx.error(), Some(OscError::Invalid));
        assert!(rx.to_bytes().is_empty());
    }

    #[test]
    fn set_replaces_appends_or_rejects() {
        let mut msg = Message::new("/s");
        msg.add(1i32);
        msg.set(0, 5i32);
        assert_eq!(msg.get_int(0), Some(5));
        msg.set(1, "x");
        assert_eq!(msg.len(), 2);
        assert_eq!(msg.get_str(1), Some("x"));
        msg.set(3, 9i32);
        assert_eq!(msg.len(), 2);
        assert_eq!(msg.error(), Some(OscError::IndexOutOfBounds));
    }

    #[test]
    fn failed_payload_marks_value_and_message() {
        let mut msg = Message::with_limits("/big", Limits::with_max_payload(4));
        msg.add(1i32).add("too long for the cap");
        assert_eq!(msg.len(), 2);
        assert_eq!(msg.get_int(0), Some(1));
        assert_eq!(msg.arg(1).and_then(TypedValue::error), Some(OscError::AllocFailed));
        assert_eq!(msg.error(), Some(OscError::AllocFailed));
        assert!(msg.to_bytes().is_empty());
    }

    #[test]
    fn empty_resets_arguments_and_error() {
        let mut msg = Message::new("/e");
        msg.add(1i32);
        msg.set(5, 1i32);
        msg.empty();
        assert!(msg.is_empty());
        assert_eq!(msg.error(), None);
        assert_eq!(msg.address(), Some("/e"));
    }

    #[test]
    fn type_tests_follow_tags() {
        let mut msg = Message::new("/t");
        msg.add(1i32).add(true).add(&[1u8, 2]).add(OscTime::new(1, 0));
        assert!(msg.is_int(0));
        assert!(!msg.is_float(0));
        assert!(msg.is_boolean(1));
        assert!(msg.is_blob(2));
        assert!(msg.is_time(3));
        assert!(!msg.is_string(9));
        assert_eq!(msg.get_type(2), Some(Tag::Blob));
        assert_eq!(msg.get_data_length(2), Some(6));
    }

    #[test]
    fn add_time_now_uses_clock() {
        let mut msg = Message::new("/clock");
        msg.add_time_now(&FixedClock(OscTime::new(3, 4)));
        assert_eq!(msg.get_time(0), Some(OscTime::new(3, 4)));
    }

    #[test]
    fn clone_is_deep_and_equal() {
        let mut msg = Message::new("/c");
        msg.add("abc").add(2.0f64);
        let mut copy = msg.clone();
        assert_eq!(copy, msg);
        copy.set(0, "xyz");
        assert_eq!(msg.get_str(0), Some("abc"));
        assert_eq!(copy.get_str(0), Some("xyz"));
    }

    #[test]
    fn dispatch_requires_full_match() {
        let msg = Message::new("/foo/bar");
        let mut calls = 0;
        assert!(msg.dispatch("/foo/*", &mut |_: &Message| calls += 1, 0));
        assert!(!msg.dispatch("/foo", &mut |_: &Message| calls += 1, 0));
        assert_eq!(calls, 1);
    }

    #[test]
    fn route_passes_remainder_offset() {
        let msg = Message::new("/foo/bar/baz");
        let mut offsets = Vec::new();
        assert!(msg.route("/foo/*", &mut |_: &Message, at: usize| offsets.push(at), 0));
        assert!(!msg.route("/fo", &mut |_: &Message, at: usize| offsets.push(at), 0));
        assert_eq!(offsets, [8]);
        assert_eq!(msg.address_from(8), Some("/baz"));
    }

    #[test]
    fn matching_from_offset() {
        let msg = Message::new("/foo/bar");
        assert!(msg.full_match("/bar", 4));
        assert_eq!(msg.match_prefix("/foo", 0), Some(4));
        assert!(!msg.full_match("/bar", 42));
    }
}
