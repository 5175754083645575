use std::path::PathBuf;

use thiserror::Error;

use courier_types::{ChannelId, MessageId};

/// Faults surfaced by the inbox store.
#[derive(Debug, Error)]
pub enum InboxError {
    /// A message with this id is already stored in the channel. The
    /// caller should reject the specific transmission, not retry it.
    #[error("message {message} already exists in channel {channel}")]
    Duplicate {
        channel: ChannelId,
        message: MessageId,
    },

    /// Metadata or payload is absent, possibly because it expired.
    #[error("message {message} not found in channel {channel}")]
    NotFound {
        channel: ChannelId,
        message: MessageId,
    },

    /// The stored document could not be parsed back.
    #[error("stored document at {path} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Directory or file fault not attributable to duplication.
    #[error("inbox I/O failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl InboxError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        InboxError::Io {
            path: path.into(),
            source,
        }
    }
}
