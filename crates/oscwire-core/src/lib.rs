//! oscwire core library: Open Sound Control messages on the wire.
//!
//! The crate provides three pieces that fit together:
//! - `Message` encoding into a `ByteSink`, with 4-byte aligned segments and
//!   big-endian payloads;
//! - an incremental decoder that is fed one byte at a time and tolerates any
//!   input chunking;
//! - an address pattern matcher (`*`, `?`, `[a-z]`, `[!a-z]`, `{a,b}`) used
//!   for dispatch and hierarchical routing.
//!
//! Nothing here performs I/O on its own: output goes through `ByteSink`,
//! input is whatever the caller feeds to `Message::fill`, and "now" comes
//! from a `TimeSource`. Failures never panic; they are recorded on the
//! message or argument as an `OscError`.
//!
//! Invariants:
//! - `Message::total_byte_length` equals the number of bytes `encode` writes.
//! - Every encoded segment is a multiple of four bytes.
//! - A message holding any error encodes to nothing.
//!
//! OSC bundles are not supported.
//!
//! # Examples
//! ```
//! use oscwire_core::Message;
//!
//! let mut msg = Message::new("/synth/1/freq");
//! msg.add(440.0f32);
//! let bytes = msg.to_bytes();
//!
//! let mut rx = Message::default();
//! assert_eq!(rx.fill_slice(&bytes), bytes.len());
//! assert!(rx.is_complete());
//! assert_eq!(rx, msg);
//! ```

mod config;
mod error;
mod message;
mod pattern;
mod report;
mod timing;
mod value;
mod wire;

pub use config::{DECODE_CHUNK, Limits};
pub use error::OscError;
pub use message::{Dispatch, Message, Route};
pub use pattern::{MatchResult, match_pattern};
pub use report::{
    ArgSummary, DEFAULT_GENERATED_AT, InputInfo, MessageSummary, PendingSummary, REPORT_VERSION,
    StreamReport, ToolInfo, decode_stream, to_hex,
};
pub use timing::{FixedClock, NTP_UNIX_OFFSET, OscTime, SystemClock, TimeSource};
pub use value::{IntoTypedValue, Tag, TypedValue, Value};
pub use wire::layout::{pad_size, type_tag_padding};
pub use wire::{ByteSink, DecodeState, DecodeStatus, IoSink};
