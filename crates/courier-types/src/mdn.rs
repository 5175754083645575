use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::disposition::{Disposition, Mic};
use crate::ids::MessageId;

/// Everything the assembler needs to build one disposition report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MdnData {
    /// Id of the original message being acknowledged.
    pub message_id: MessageId,
    /// System id of the sending peer (AS2-From of the original message).
    pub as2_from: String,
    /// System id of the receiving side (AS2-To); may be absent when the
    /// original message was missing the header.
    pub as2_to: Option<String>,
    pub subject: String,
    /// When the original message was received.
    pub date: DateTime<Utc>,
    pub disposition: Disposition,
    /// Digest of the received content, present when integrity was verified.
    pub mic: Option<Mic>,
}

impl MdnData {
    pub fn new(
        message_id: impl Into<MessageId>,
        as2_from: impl Into<String>,
        as2_to: Option<String>,
        subject: impl Into<String>,
        date: DateTime<Utc>,
        disposition: Disposition,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            as2_from: as2_from.into(),
            as2_to,
            subject: subject.into(),
            date,
            disposition,
            mic: None,
        }
    }

    pub fn with_mic(mut self, mic: Mic) -> Self {
        self.mic = Some(mic);
        self
    }
}
