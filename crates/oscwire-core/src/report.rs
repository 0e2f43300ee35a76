use serde::Serialize;
use serde_json::json;

use crate::config::Limits;
use crate::error::OscError;
use crate::message::Message;
use crate::value::{Tag, TypedValue, Value};
use crate::wire::DecodeState;

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Placeholder timestamp until a caller stamps the report.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Decode report for one byte stream.
///
/// # Examples
/// ```
/// use oscwire_core::{Limits, decode_stream};
///
/// let report = decode_stream(b"/a\0\0,i\0\0\0\0\0\x01", &Limits::default());
/// assert_eq!(report.messages.len(), 1);
/// assert_eq!(report.messages[0].address, "/a");
/// assert!(report.pending.is_none());
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct StreamReport {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    /// RFC3339 timestamp representing the report generation time.
    pub generated_at: String,
    /// Tool identification, filled in by the caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<ToolInfo>,
    /// Input metadata, filled in by the caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<InputInfo>,
    /// Limits the receivers were created with.
    pub limits: Limits,
    /// Total bytes examined.
    pub total_bytes: usize,
    /// Fully decoded messages in stream order.
    pub messages: Vec<MessageSummary>,
    /// The message still being decoded when the input ran out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<PendingSummary>,
    /// Bytes after the last message that never reached a leading `/`.
    pub trailing_bytes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputInfo {
    /// Input path as provided on the command line.
    pub path: String,
    pub bytes: u64,
}

/// One decoded message.
#[derive(Debug, Clone, Serialize)]
pub struct MessageSummary {
    /// Stream offset of the first byte fed to this message's receiver.
    pub offset: usize,
    /// Bytes consumed, including any skipped before the address.
    pub length: usize,
    pub address: String,
    /// Type tags in order, without the leading comma.
    pub type_tags: String,
    pub args: Vec<ArgSummary>,
    /// Aggregate error, e.g. a payload over the configured limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<OscError>,
}

/// One argument of a decoded message.
#[derive(Debug, Clone, Serialize)]
pub struct ArgSummary {
    pub tag: char,
    /// Wire payload length before padding.
    pub bytes: usize,
    /// JSON rendering of the value; blobs are hex encoded.
    pub value: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<OscError>,
}

/// A message that did not complete before the end of input.
#[derive(Debug, Clone, Serialize)]
pub struct PendingSummary {
    pub offset: usize,
    pub state: DecodeState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Arguments declared so far.
    pub declared_args: usize,
    /// Bytes fed without progress when the input ran out.
    pub bytes_since_progress: usize,
    /// The decoder stopped on an error.
    pub halted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<OscError>,
}

/// Decode every message in `bytes`.
///
/// Decoding stops at the first message that does not complete; with
/// `Limits::strict` that includes the first malformed one.
pub fn decode_stream(bytes: &[u8], limits: &Limits) -> StreamReport {
    let mut report = StreamReport {
        report_version: REPORT_VERSION,
        generated_at: DEFAULT_GENERATED_AT.to_string(),
        tool: None,
        input: None,
        limits: *limits,
        total_bytes: bytes.len(),
        messages: Vec::new(),
        pending: None,
        trailing_bytes: 0,
    };

    let mut offset = 0;
    while offset < bytes.len() {
        let mut rx = Message::receiver_with_limits(*limits);
        let consumed = rx.fill_slice(&bytes[offset..]);
        if rx.is_complete() {
            report.messages.push(summarize(&rx, offset, consumed));
            offset += consumed;
            continue;
        }

        let status = rx.decode_status();
        if status.state == DecodeState::Standby && !status.halted {
            report.trailing_bytes = consumed;
        } else {
            report.pending = Some(PendingSummary {
                offset,
                state: status.state,
                address: rx.address().map(str::to_owned),
                declared_args: rx.len(),
                bytes_since_progress: status.bytes_since_progress,
                halted: status.halted,
                error: rx.error(),
            });
        }
        break;
    }
    report
}

fn summarize(msg: &Message, offset: usize, length: usize) -> MessageSummary {
    MessageSummary {
        offset,
        length,
        address: msg.address().unwrap_or_default().to_string(),
        type_tags: msg.args().iter().map(|arg| arg.tag().as_char()).collect(),
        args: msg.args().iter().map(summarize_arg).collect(),
        error: msg.aggregate_error(),
    }
}

fn summarize_arg(arg: &TypedValue) -> ArgSummary {
    ArgSummary {
        tag: arg.tag().as_char(),
        bytes: arg.bytes(),
        value: json_value(arg),
        error: arg.error(),
    }
}

fn json_value(arg: &TypedValue) -> serde_json::Value {
    let Some(value) = arg.value() else {
        return serde_json::Value::Null;
    };
    match (arg.tag(), value) {
        (_, Value::Int(v)) => json!(v),
        (_, Value::Float(v)) => json!(v),
        (_, Value::Double(v)) => json!(v),
        (_, Value::Time(t)) => json!({ "seconds": t.seconds, "fraction": t.fraction }),
        (Tag::Blob, Value::Bytes(data)) => json!(to_hex(data)),
        (_, Value::Bytes(_)) => {
            let text = arg.string_bytes().unwrap_or_default();
            json!(String::from_utf8_lossy(text))
        }
        (tag, Value::Unit) => json!(tag == Tag::True),
    }
}

/// Lowercase hex without separators.
pub fn to_hex(data: &[u8]) -> String {
    data.iter().map(|byte| format!("{byte:02x}")).collect()
}
