//! OSC message wire format.
//!
//! - `layout`: framing constants and padding rules (source of truth)
//! - `reader`: big-endian reads over buffered bytes
//! - `writer`: encoding into a `ByteSink`
//! - `decoder`: the incremental, byte-at-a-time decode state machine
//!
//! Encoding and decoding share the same padding rules so that
//! `Message::total_byte_length` always equals the encoded length.
//!
//! A receiver moves through `Standby -> Address -> AddressPadding -> Types
//! -> TypesPadding -> Data <-> DataPadding -> Done`. Permissive decoding
//! skips bytes before the leading `/` and stalls in `Data` on an unknown
//! tag; with `Limits::strict` those cases, and non-zero padding, record
//! `Malformed` and stop the decoder.

pub mod decoder;
pub mod layout;
pub mod reader;
pub mod writer;

pub use decoder::{DecodeState, DecodeStatus};
pub use writer::{ByteSink, IoSink};
