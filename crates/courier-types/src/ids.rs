use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical inbound mailbox, grouping messages from a particular peer or route.
///
/// The value is opaque to Courier; it is only interpreted when deriving
/// a filesystem path segment (see [`encode_path_segment`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Identifies a message within a channel for the lifetime of a transmission.
///
/// Two files on disk are derived from it (metadata and payload); their
/// coupled existence is the store's atomicity unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for MessageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Encode an identifier for use as a single filesystem path segment.
///
/// `%`, `:` and `/` are escaped percent-style, so the mapping is
/// reversible even for ids that already contain `_` or `%`.
pub fn encode_path_segment(id: &str) -> String {
    // A dot-only id would resolve to the directory itself or its
    // parent, escaping the store root.
    if id == "." || id == ".." {
        return id.replace('.', "%2E");
    }
    let mut out = String::with_capacity(id.len());
    for c in id.chars() {
        match c {
            '%' => out.push_str("%25"),
            ':' => out.push_str("%3A"),
            '/' => out.push_str("%2F"),
            _ => out.push(c),
        }
    }
    out
}

/// Reverse of [`encode_path_segment`]. Returns `None` for a segment that
/// was not produced by it (stray `%` not followed by a known escape).
pub fn decode_path_segment(segment: &str) -> Option<String> {
    let mut out = String::with_capacity(segment.len());
    let mut chars = segment.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let escape: String = chars.by_ref().take(2).collect();
        match escape.as_str() {
            "25" => out.push('%'),
            "3A" => out.push(':'),
            "2F" => out.push('/'),
            "2E" => out.push('.'),
            _ => return None,
        }
    }
    Some(out)
}
