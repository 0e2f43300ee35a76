use std::convert::Infallible;
use std::io::Write;

use log::warn;

use super::layout;
use crate::message::Message;
use crate::value::{Tag, TypedValue, Value};

/// Output collaborator for encoding.
///
/// `transmit` hands over every byte of `bytes`, blocking until the
/// transport accepted them.
pub trait ByteSink {
    type Error;

    fn transmit(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}

impl ByteSink for Vec<u8> {
    type Error = Infallible;

    fn transmit(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

/// Adapter sending encoded bytes to any `std::io::Write`.
#[derive(Debug)]
pub struct IoSink<W>(pub W);

impl<W: Write> ByteSink for IoSink<W> {
    type Error = std::io::Error;

    fn transmit(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.0.write_all(bytes)
    }
}

impl Message {
    /// Write the wire form of this message to `sink`.
    ///
    /// Returns the number of bytes written; a message with an error (or no
    /// address) writes nothing and returns `Ok(0)`.
    ///
    /// # Examples
    /// ```
    /// use oscwire_core::Message;
    ///
    /// let mut msg = Message::new("/a");
    /// msg.add(1i32);
    /// let mut out = Vec::new();
    /// let written = msg.encode(&mut out).unwrap();
    /// assert_eq!(written, 12);
    /// assert_eq!(out, b"/a\0\0,i\0\0\0\0\0\x01");
    /// ```
    pub fn encode<S: ByteSink>(&self, sink: &mut S) -> Result<usize, S::Error> {
        let Some(address) = self.address() else {
            warn!("refusing to encode a message without an address");
            return Ok(0);
        };
        if self.has_error() {
            warn!("refusing to encode {address}: message holds an error");
            return Ok(0);
        }

        let mut written = write_padded(sink, &[address.as_bytes(), &[layout::TERMINATOR]])?;

        let tags: Vec<u8> = self.args().iter().map(|arg| arg.tag().as_byte()).collect();
        sink.transmit(&[layout::TYPE_TAG_PREFIX])?;
        sink.transmit(&tags)?;
        let tag_padding = layout::type_tag_padding(tags.len());
        sink.transmit(&layout::PADDING[..tag_padding])?;
        written += 1 + tags.len() + tag_padding;

        for arg in self.args() {
            written += write_value(sink, arg)?;
        }
        Ok(written)
    }

    /// Encode into a fresh buffer; empty when encoding is refused.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.total_byte_length());
        match self.encode(&mut out) {
            Ok(_) => out,
            Err(never) => match never {},
        }
    }

    /// Exact encoded size, computed without encoding. Zero when `encode`
    /// would refuse the message.
    pub fn total_byte_length(&self) -> usize {
        let Some(address) = self.address() else {
            return 0;
        };
        if self.has_error() {
            return 0;
        }
        let address_len = address.len();
        let args: usize = self
            .args()
            .iter()
            .map(|arg| arg.bytes() + layout::pad_size(arg.bytes()))
            .sum();
        layout::address_segment_len(address_len) + layout::type_tag_segment_len(self.len()) + args
    }
}

fn write_value<S: ByteSink>(sink: &mut S, arg: &TypedValue) -> Result<usize, S::Error> {
    let Some(value) = arg.value() else {
        return Ok(0);
    };
    match value {
        Value::Int(v) => write_all(sink, &v.to_be_bytes()),
        Value::Float(v) => write_all(sink, &v.to_be_bytes()),
        Value::Double(v) => write_all(sink, &v.to_be_bytes()),
        Value::Time(t) => {
            sink.transmit(&t.seconds.to_be_bytes())?;
            sink.transmit(&t.fraction.to_be_bytes())?;
            Ok(8)
        }
        Value::Bytes(buf) if arg.tag() == Tag::Blob => {
            let len = buf.len() as u32;
            write_padded(sink, &[&len.to_be_bytes(), buf])
        }
        Value::Bytes(buf) => write_padded(sink, &[buf]),
        Value::Unit => Ok(0),
    }
}

fn write_all<S: ByteSink>(sink: &mut S, bytes: &[u8]) -> Result<usize, S::Error> {
    sink.transmit(bytes)?;
    Ok(bytes.len())
}

/// Write the parts back to back, then pad the total to a word boundary.
fn write_padded<S: ByteSink>(sink: &mut S, parts: &[&[u8]]) -> Result<usize, S::Error> {
    let mut len = 0;
    for part in parts {
        sink.transmit(part)?;
        len += part.len();
    }
    let pad = layout::pad_size(len);
    sink.transmit(&layout::PADDING[..pad])?;
    Ok(len + pad)
}
