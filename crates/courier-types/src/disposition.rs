use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome classification of a received message.
///
/// This drives both the narrative and the machine-readable fields of an
/// MDN. It is built per acknowledgment and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Disposition {
    /// The message was processed, possibly with a qualifier.
    Processed(Option<DispositionModifier>),
    /// Processing did not happen at all; carries the failure text.
    Failed(String),
}

/// Qualifier attached to a `processed` disposition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispositionModifier {
    Warning(String),
    Error(String),
    Failed(String),
}

impl Disposition {
    pub fn processed() -> Self {
        Disposition::Processed(None)
    }

    pub fn processed_with_warning(text: impl Into<String>) -> Self {
        Disposition::Processed(Some(DispositionModifier::Warning(text.into())))
    }

    pub fn processed_with_error(text: impl Into<String>) -> Self {
        Disposition::Processed(Some(DispositionModifier::Error(text.into())))
    }

    pub fn failed(text: impl Into<String>) -> Self {
        Disposition::Failed(text.into())
    }
}

impl DispositionModifier {
    /// The free text carried by the modifier.
    pub fn text(&self) -> &str {
        match self {
            DispositionModifier::Warning(t)
            | DispositionModifier::Error(t)
            | DispositionModifier::Failed(t) => t,
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            DispositionModifier::Warning(_) => "warning",
            DispositionModifier::Error(_) => "error",
            DispositionModifier::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for DispositionModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.prefix(), self.text())
    }
}

/// Renders the AS2 `Disposition` field, e.g.
/// `automatic-action/MDN-sent-automatically; processed/warning: duplicate`.
impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("automatic-action/MDN-sent-automatically; ")?;
        match self {
            Disposition::Processed(None) => f.write_str("processed"),
            Disposition::Processed(Some(modifier)) => write!(f, "processed/{modifier}"),
            Disposition::Failed(text) => write!(f, "failed/failed: {text}"),
        }
    }
}

/// Message Integrity Check: digest of the received content, echoed in
/// the MDN to prove what was verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mic {
    pub digest: String,
    pub algorithm: String,
}

impl Mic {
    pub fn new(digest: impl Into<String>, algorithm: impl Into<String>) -> Self {
        Self {
            digest: digest.into(),
            algorithm: algorithm.into(),
        }
    }
}

impl fmt::Display for Mic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.digest, self.algorithm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disposition_field_rendering() {
        assert_eq!(
            Disposition::processed().to_string(),
            "automatic-action/MDN-sent-automatically; processed"
        );
        assert_eq!(
            Disposition::processed_with_warning("duplicate message").to_string(),
            "automatic-action/MDN-sent-automatically; processed/warning: duplicate message"
        );
        assert_eq!(
            Disposition::processed_with_error("unknown recipient").to_string(),
            "automatic-action/MDN-sent-automatically; processed/error: unknown recipient"
        );
        assert_eq!(
            Disposition::failed("bad signature").to_string(),
            "automatic-action/MDN-sent-automatically; failed/failed: bad signature"
        );
    }

    #[test]
    fn mic_rendering() {
        let mic = Mic::new("eeWNkOTx7yJYr2EW8CR85I7QJQY=", "sha1");
        assert_eq!(mic.to_string(), "eeWNkOTx7yJYr2EW8CR85I7QJQY=, sha1");
    }
}
