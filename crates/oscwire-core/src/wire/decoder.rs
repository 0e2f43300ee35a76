use log::{debug, trace, warn};
use serde::Serialize;

use super::layout;
use super::reader::WireReader;
use crate::config::DECODE_CHUNK;
use crate::error::OscError;
use crate::message::Message;
use crate::value::{Tag, TypedValue};

/// Decoder progress through the wire segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeState {
    /// Waiting for the leading `/`.
    #[default]
    Standby,
    Address,
    AddressPadding,
    Types,
    TypesPadding,
    Data,
    DataPadding,
    /// Every argument is resolved and its padding consumed.
    Done,
}

/// Snapshot of the decoder for callers polling a byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DecodeStatus {
    pub state: DecodeState,
    /// Bytes fed since the last state change or resolved argument.
    pub bytes_since_progress: usize,
    /// Bytes currently held in the scratch buffer.
    pub buffered: usize,
    /// Decoding stopped on an error and ignores further input.
    pub halted: bool,
}

#[derive(Debug, Default)]
pub(crate) struct DecodeScratch {
    state: DecodeState,
    buffer: Vec<u8>,
    tag_count: usize,
    padding: usize,
    since_progress: usize,
    halted: bool,
}

impl Message {
    /// Feed one byte to the decoder and return the resulting state.
    ///
    /// Bytes fed after `Done`, or after the decoder halted on an error,
    /// are ignored.
    ///
    /// # Examples
    /// ```
    /// use oscwire_core::{DecodeState, Message};
    ///
    /// let mut rx = Message::default();
    /// for &byte in b"/a\0\0,i\0\0\0\0\0\x07" {
    ///     rx.fill(byte);
    /// }
    /// assert_eq!(rx.decode_state(), DecodeState::Done);
    /// assert_eq!(rx.get_int(0), Some(7));
    /// ```
    pub fn fill(&mut self, byte: u8) -> DecodeState {
        if self.decoder.state != DecodeState::Done {
            self.decoder.since_progress += 1;
            if !self.decoder.halted {
                self.decode_byte(byte);
            }
        }
        self.decoder.state
    }

    /// Feed bytes until the message is complete.
    ///
    /// Returns how many bytes were consumed; anything after that belongs to
    /// the next message in the stream.
    pub fn fill_slice(&mut self, bytes: &[u8]) -> usize {
        for (consumed, &byte) in bytes.iter().enumerate() {
            if self.is_complete() {
                return consumed;
            }
            self.fill(byte);
        }
        bytes.len()
    }

    pub fn decode_state(&self) -> DecodeState {
        self.decoder.state
    }

    pub fn is_complete(&self) -> bool {
        self.decoder.state == DecodeState::Done
    }

    /// Bytes fed without any state change or newly resolved argument.
    ///
    /// A receiver stuck on an unsupported tag keeps counting up; callers
    /// use this to give up on a stream.
    pub fn bytes_since_progress(&self) -> usize {
        self.decoder.since_progress
    }

    pub fn decode_status(&self) -> DecodeStatus {
        DecodeStatus {
            state: self.decoder.state,
            bytes_since_progress: self.decoder.since_progress,
            buffered: self.decoder.buffer.len(),
            halted: self.decoder.halted,
        }
    }

    pub(crate) fn reset_decoder(&mut self) {
        self.decoder = DecodeScratch::default();
    }

    fn decode_byte(&mut self, byte: u8) {
        if self.decoder.state == DecodeState::Standby {
            if byte != layout::ADDRESS_PREFIX {
                if self.limits.strict {
                    self.halt(OscError::Malformed, "input does not start with '/'");
                }
                return;
            }
            self.transition(DecodeState::Address);
        }

        if !self.buffer_byte(byte) {
            return;
        }

        match self.decoder.state {
            DecodeState::Standby | DecodeState::Done => {}
            DecodeState::Address => {
                if byte == layout::TERMINATOR {
                    self.finish_address();
                }
            }
            DecodeState::AddressPadding => self.address_padding(byte),
            DecodeState::Types => {
                if byte == layout::TERMINATOR {
                    self.transition(DecodeState::TypesPadding);
                    self.types_padding();
                } else {
                    self.push_tag(byte);
                }
            }
            DecodeState::TypesPadding => {
                if byte != layout::TERMINATOR && self.limits.strict {
                    self.halt(OscError::Malformed, "non-zero type tag padding");
                    return;
                }
                self.types_padding();
            }
            DecodeState::Data => self.data(byte),
            DecodeState::DataPadding => {
                if byte != layout::TERMINATOR && self.limits.strict {
                    self.halt(OscError::Malformed, "non-zero argument padding");
                    return;
                }
                if self.decoder.buffer.len() == self.decoder.padding {
                    self.clear_buffer();
                    self.resume_data();
                }
            }
        }
    }

    fn buffer_byte(&mut self, byte: u8) -> bool {
        let len = self.decoder.buffer.len();
        if !self.limits.allows_decode_buffer(len + 1) {
            self.halt(OscError::BufferFull, "decode buffer limit reached");
            return false;
        }
        let buffer = &mut self.decoder.buffer;
        if len == buffer.capacity() && buffer.try_reserve_exact(DECODE_CHUNK).is_err() {
            self.halt(OscError::AllocFailed, "decode buffer could not grow");
            return false;
        }
        self.decoder.buffer.push(byte);
        true
    }

    fn clear_buffer(&mut self) {
        self.decoder.buffer.clear();
        self.decoder.buffer.shrink_to(DECODE_CHUNK);
    }

    fn transition(&mut self, next: DecodeState) {
        trace!("decode: {:?} -> {:?}", self.decoder.state, next);
        self.decoder.state = next;
        self.decoder.since_progress = 0;
    }

    fn halt(&mut self, err: OscError, reason: &str) {
        warn!("decode halted in {:?}: {reason}", self.decoder.state);
        self.decoder.halted = true;
        self.error = Some(err);
    }

    fn finish_address(&mut self) {
        let buffer = &self.decoder.buffer;
        let raw = &buffer[..buffer.len() - 1];
        let decoded = std::str::from_utf8(raw)
            .map(str::to_owned)
            .map_err(|_| String::from_utf8_lossy(raw).into_owned());
        let address = match decoded {
            Ok(address) => address,
            Err(_) if self.limits.strict => {
                self.halt(OscError::Malformed, "address is not valid UTF-8");
                return;
            }
            Err(lossy) => lossy,
        };
        debug!("decoded address {address}");
        self.set_address(&address);
        if self.error == Some(OscError::Invalid) {
            self.error = None;
        }
        self.clear_buffer();
        self.transition(DecodeState::AddressPadding);
    }

    fn address_padding(&mut self, byte: u8) {
        let buffered = self.decoder.buffer.len();
        if byte == layout::TYPE_TAG_PREFIX {
            if self.limits.strict {
                let address_len = self.address().map_or(0, str::len);
                let expected = layout::address_segment_len(address_len) - address_len - 1;
                if buffered - 1 != expected {
                    self.halt(OscError::Malformed, "misaligned address padding");
                    return;
                }
            }
            self.clear_buffer();
            self.transition(DecodeState::Types);
        } else if byte != layout::TERMINATOR && self.limits.strict {
            self.halt(OscError::Malformed, "non-zero address padding");
        }
    }

    fn push_tag(&mut self, byte: u8) {
        let tag = Tag::from_byte(byte);
        if !tag.is_supported() {
            if self.limits.strict {
                self.halt(OscError::Malformed, "unsupported type tag");
                return;
            }
            warn!("unsupported type tag '{}' will stall decoding", tag.as_char());
        }
        if self.args.try_reserve(1).is_err() {
            self.halt(OscError::AllocFailed, "argument list could not grow");
            return;
        }
        self.args.push(TypedValue::pending(tag));
        self.decoder.tag_count += 1;
        self.decoder.since_progress = 0;
    }

    fn types_padding(&mut self) {
        // the buffer holds the tags, the terminator and any padding so far
        let tags = self.decoder.tag_count;
        if self.decoder.buffer.len() == tags + layout::type_tag_padding(tags) {
            self.clear_buffer();
            self.resume_data();
        }
    }

    fn next_pending(&self) -> Option<usize> {
        self.args.iter().position(TypedValue::is_pending)
    }

    /// Resolve leading zero-width arguments, then wait for the next payload
    /// or finish.
    fn resume_data(&mut self) {
        while let Some(index) = self.next_pending() {
            let tag = self.args[index].tag();
            if tag.fixed_width() != Some(0) {
                break;
            }
            debug!("decoded argument {index}: {}", tag.as_char());
            self.args[index] = TypedValue::boolean(tag == Tag::True);
        }
        if self.next_pending().is_some() {
            self.transition(DecodeState::Data);
        } else {
            self.transition(DecodeState::Done);
        }
    }

    fn data(&mut self, byte: u8) {
        let Some(index) = self.next_pending() else {
            self.transition(DecodeState::Done);
            return;
        };
        let tag = self.args[index].tag();
        let limits = self.limits;
        let buffer = &self.decoder.buffer;
        let buffered = buffer.len();
        let reader = WireReader::new(buffer);

        let resolved = match tag {
            Tag::Int if buffered == 4 => reader.read_i32_be(0).map(TypedValue::int),
            Tag::Float if buffered == 4 => reader.read_f32_be(0).map(TypedValue::float),
            Tag::Double if buffered == 8 => reader.read_f64_be(0).map(TypedValue::double),
            Tag::Time if buffered == 8 => reader.read_time(0).map(TypedValue::time),
            Tag::String if byte == layout::TERMINATOR => Some(TypedValue::string_with_limits(
                &buffer[..buffered - 1],
                &limits,
            )),
            Tag::Blob if buffered >= layout::BLOB_LENGTH_WIDTH => {
                let declared = reader.read_u32_be(0).map(|len| len as usize);
                let body = reader.read_slice(layout::BLOB_LENGTH_WIDTH..buffered);
                match (declared, body) {
                    (Some(len), Some(body)) if len == body.len() => {
                        Some(TypedValue::blob_with_limits(body, &limits))
                    }
                    _ => None,
                }
            }
            _ => None,
        };

        let Some(value) = resolved else {
            return;
        };
        if let Some(err) = value.error() {
            warn!("argument {index} could not be stored: {err}");
            self.error = Some(err);
        } else {
            debug!("decoded argument {index}: {}", tag.as_char());
        }
        self.args[index] = value;

        let padding = match tag {
            Tag::String | Tag::Blob => layout::pad_size(buffered),
            _ => 0,
        };
        self.clear_buffer();
        if padding == 0 {
            self.resume_data();
        } else {
            self.decoder.padding = padding;
            self.transition(DecodeState::DataPadding);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Limits;

    fn feed(msg: &mut Message, bytes: &[u8]) {
        for &byte in bytes {
            msg.fill(byte);
        }
    }

    fn strict_receiver() -> Message {
        Message::receiver_with_limits(Limits {
            strict: true,
            ..Limits::default()
        })
    }

    fn assert_halted(rx: &Message, state: DecodeState) {
        assert_eq!(rx.decode_state(), state);
        assert_eq!(rx.error(), Some(OscError::Malformed));
        assert!(rx.decode_status().halted);
    }

    #[test]
    fn walks_every_state() {
        let mut rx = Message::default();
        assert_eq!(rx.fill(b'/'), DecodeState::Address);
        assert_eq!(rx.fill(b'a'), DecodeState::Address);
        assert_eq!(rx.fill(0), DecodeState::AddressPadding);
        assert_eq!(rx.fill(0), DecodeState::AddressPadding);
        assert_eq!(rx.fill(b','), DecodeState::Types);
        assert_eq!(rx.fill(b's'), DecodeState::Types);
        assert_eq!(rx.fill(0), DecodeState::TypesPadding);
        assert_eq!(rx.fill(0), DecodeState::Data);
        assert_eq!(rx.fill(b'x'), DecodeState::Data);
        assert_eq!(rx.fill(0), DecodeState::DataPadding);
        assert_eq!(rx.fill(0), DecodeState::DataPadding);
        assert_eq!(rx.fill(0), DecodeState::Done);
        assert_eq!(rx.get_str(0), Some("x"));
        assert_eq!(rx.error(), None);
    }

    #[test]
    fn skips_bytes_before_address() {
        let mut rx = Message::default();
        feed(&mut rx, b"\0\0junk/a\0\0,\0\0\0");
        assert!(rx.is_complete());
        assert_eq!(rx.address(), Some("/a"));
        assert!(rx.is_empty());
    }

    #[test]
    fn strict_rejects_leading_junk() {
        let mut rx = strict_receiver();
        rx.fill(b'x');
        assert!(rx.decode_status().halted);
        assert_eq!(rx.error(), Some(OscError::Malformed));
        assert_eq!(rx.fill(b'/'), DecodeState::Standby);
    }

    #[test]
    fn booleans_resolve_without_payload() {
        let mut rx = Message::default();
        feed(&mut rx, b"/t\0\0,TiF\0\0\0\0");
        assert_eq!(rx.decode_state(), DecodeState::Data);
        assert_eq!(rx.get_boolean(0), Some(true));
        feed(&mut rx, &[0, 0, 0, 9]);
        assert!(rx.is_complete());
        assert_eq!(rx.get_int(1), Some(9));
        assert_eq!(rx.get_boolean(2), Some(false));
    }

    #[test]
    fn only_booleans_complete_after_type_padding() {
        let mut rx = Message::default();
        feed(&mut rx, b"/t\0\0,TF\0");
        assert!(rx.is_complete());
        assert_eq!(rx.len(), 2);
    }

    #[test]
    fn empty_blob_resolves_on_length() {
        let mut rx = Message::default();
        feed(&mut rx, b"/b\0\0,b\0\0\0\0\0\0");
        assert!(rx.is_complete());
        assert_eq!(rx.get_blob_len(0), Some(0));
    }

    #[test]
    fn unknown_tag_stalls_and_counts() {
        let mut rx = Message::default();
        feed(&mut rx, b"/u\0\0,x\0\0");
        assert_eq!(rx.decode_state(), DecodeState::Data);
        feed(&mut rx, &[1, 2, 3, 4, 5]);
        assert_eq!(rx.decode_state(), DecodeState::Data);
        assert_eq!(rx.bytes_since_progress(), 5);
        assert_eq!(rx.decode_status().buffered, 5);
    }

    #[test]
    fn strict_rejects_unknown_tag() {
        let mut rx = strict_receiver();
        feed(&mut rx, b"/u\0\0,x");
        assert_halted(&rx, DecodeState::Types);
    }

    #[test]
    fn strict_accepts_well_formed_message() {
        let mut msg = Message::new("/abc");
        msg.add(5i32).add("hi").add(&[1u8, 2, 3]).add(true).add("");
        let bytes = msg.to_bytes();

        let mut rx = strict_receiver();
        assert_eq!(rx.fill_slice(&bytes), bytes.len());
        assert!(rx.is_complete());
        assert_eq!(rx.error(), None);
        assert!(!rx.decode_status().halted);
        assert_eq!(rx, msg);
    }

    #[test]
    fn strict_rejects_non_zero_address_padding() {
        let mut rx = strict_receiver();
        feed(&mut rx, b"/a\0\x01,");
        assert_halted(&rx, DecodeState::AddressPadding);
        assert_eq!(rx.address(), Some("/a"));
    }

    #[test]
    fn strict_rejects_misaligned_address_padding() {
        let mut rx = strict_receiver();
        feed(&mut rx, b"/abc\0,i\0\0");
        assert_halted(&rx, DecodeState::AddressPadding);

        let mut lenient = Message::default();
        feed(&mut lenient, b"/abc\0,\0\0\0");
        assert!(lenient.is_complete());
    }

    #[test]
    fn strict_rejects_non_utf8_address() {
        let mut rx = strict_receiver();
        feed(&mut rx, b"/\xff\0\0,\0\0\0");
        assert_halted(&rx, DecodeState::Address);
        assert_eq!(rx.address(), None);

        let mut lenient = Message::default();
        feed(&mut lenient, b"/\xff\0\0,\0\0\0");
        assert!(lenient.is_complete());
        assert_eq!(lenient.address(), Some("/\u{fffd}"));
    }

    #[test]
    fn strict_rejects_non_zero_type_tag_padding() {
        let mut rx = strict_receiver();
        feed(&mut rx, b"/a\0\0,i\0\x05\0\0\0\x01");
        assert_halted(&rx, DecodeState::TypesPadding);
        assert_eq!(rx.get_int(0), None);
    }

    #[test]
    fn strict_rejects_non_zero_argument_padding() {
        let mut rx = strict_receiver();
        feed(&mut rx, b"/a\0\0,s\0\0x\0\x09\0");
        assert_halted(&rx, DecodeState::DataPadding);
        assert_eq!(rx.get_str(0), Some("x"));
        assert!(!rx.is_complete());
    }

    #[test]
    fn decode_buffer_limit_halts() {
        let mut rx = Message::receiver_with_limits(Limits {
            max_decode_buffer: Some(4),
            ..Limits::default()
        });
        feed(&mut rx, b"/long");
        assert_eq!(rx.error(), Some(OscError::BufferFull));
        assert_eq!(rx.decode_state(), DecodeState::Address);
    }

    #[test]
    fn payload_limit_marks_value_and_keeps_sync() {
        let mut rx = Message::receiver_with_limits(Limits::with_max_payload(2));
        feed(&mut rx, b"/s\0\0,si\0hello\0\0\0\0\0\0\x01");
        assert!(rx.is_complete());
        assert_eq!(rx.error(), Some(OscError::AllocFailed));
        assert_eq!(rx.arg(0).and_then(TypedValue::error), Some(OscError::AllocFailed));
        assert_eq!(rx.get_int(1), Some(1));
    }

    #[test]
    fn fill_slice_stops_at_message_end() {
        let mut rx = Message::default();
        let stream = b"/a\0\0,\0\0\0/next";
        assert_eq!(rx.fill_slice(stream), 8);
        assert!(rx.is_complete());
        assert_eq!(rx.fill(b'/'), DecodeState::Done);
    }
}
