use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use courier_types::{ChannelId, MessageId, decode_path_segment, encode_path_segment};

use crate::config::InboxConfig;
use crate::error::InboxError;

const INBOX_DIR: &str = "inbox";
const EXT_METADATA: &str = ".metadata";
const EXT_PAYLOAD: &str = ".payload";

/// Per-file result of a [`Inbox::delete`] call, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub metadata_removed: bool,
    pub payload_removed: bool,
}

/// On-disk store of inbound messages, one directory per channel.
///
/// Each message is the file pair `{id}.metadata` / `{id}.payload`; at
/// any observable instant either both exist or neither does. Exclusive
/// file creation is the only synchronization primitive: concurrent
/// saves of the same id race on it and exactly one wins.
pub struct Inbox {
    root: PathBuf,
    expiry: std::time::Duration,
}

impl Inbox {
    pub async fn open(config: &InboxConfig) -> Result<Self, InboxError> {
        let root = config.base_dir.join(INBOX_DIR);
        fs::create_dir_all(&root)
            .await
            .map_err(|e| InboxError::io(&root, e))?;
        info!("Inbox store rooted at {}", root.display());
        Ok(Self {
            root,
            expiry: config.expiry,
        })
    }

    fn channel_dir(&self, channel: &ChannelId) -> PathBuf {
        self.root.join(encode_path_segment(channel.as_str()))
    }

    fn metadata_path(&self, channel: &ChannelId, message: &MessageId) -> PathBuf {
        self.channel_dir(channel)
            .join(format!("{}{EXT_METADATA}", encode_path_segment(message.as_str())))
    }

    fn payload_path(&self, channel: &ChannelId, message: &MessageId) -> PathBuf {
        self.channel_dir(channel)
            .join(format!("{}{EXT_PAYLOAD}", encode_path_segment(message.as_str())))
    }

    /// Store a message. Fully succeeds or leaves the store absent of it:
    /// the metadata file is created first with exclusive semantics, then
    /// the payload file; any later fault rolls back whatever was created.
    pub async fn save(
        &self,
        channel: &ChannelId,
        message: &MessageId,
        metadata: &Value,
        payload: &Value,
    ) -> Result<(), InboxError> {
        let dir = self.channel_dir(channel);
        // Race-tolerant: a concurrent creator winning first is fine.
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| InboxError::io(&dir, e))?;

        let metadata_path = self.metadata_path(channel, message);
        let payload_path = self.payload_path(channel, message);

        let metadata_file = match create_new(&metadata_path).await {
            Ok(file) => file,
            Err(e) => return Err(self.creation_error(channel, message, &metadata_path, e)),
        };

        let payload_file = match create_new(&payload_path).await {
            Ok(file) => file,
            Err(e) => {
                // Restore the both-or-neither invariant before failing.
                remove_best_effort(&metadata_path).await;
                return Err(self.creation_error(channel, message, &payload_path, e));
            }
        };

        let write_result = write_documents(
            metadata_file,
            &metadata_path,
            metadata,
            payload_file,
            &payload_path,
            payload,
        )
        .await;

        if let Err(e) = write_result {
            remove_best_effort(&metadata_path).await;
            remove_best_effort(&payload_path).await;
            return Err(e);
        }

        info!("Stored message {} in channel {}", message, channel);
        Ok(())
    }

    fn creation_error(
        &self,
        channel: &ChannelId,
        message: &MessageId,
        path: &Path,
        source: std::io::Error,
    ) -> InboxError {
        if source.kind() == ErrorKind::AlreadyExists {
            debug!(
                "Rejecting duplicate message {} for channel {}",
                message, channel
            );
            InboxError::Duplicate {
                channel: channel.clone(),
                message: message.clone(),
            }
        } else {
            InboxError::io(path, source)
        }
    }

    /// Remove a message's files. Idempotent per file: absence is
    /// reported in the outcome, never as an error.
    pub async fn delete(
        &self,
        channel: &ChannelId,
        message: &MessageId,
    ) -> Result<DeleteOutcome, InboxError> {
        let metadata_removed = remove_if_present(&self.metadata_path(channel, message)).await?;
        let payload_removed = remove_if_present(&self.payload_path(channel, message)).await?;
        if metadata_removed || payload_removed {
            info!("Deleted message {} from channel {}", message, channel);
        }
        Ok(DeleteOutcome {
            metadata_removed,
            payload_removed,
        })
    }

    /// Ids of the messages currently stored in a channel.
    ///
    /// Messages older than the configured expiry are deleted as a side
    /// effect of the listing and excluded from the result. Expiry is
    /// deliberately coupled to this call; there is no background sweep.
    pub async fn list_message_ids(
        &self,
        channel: &ChannelId,
    ) -> Result<Vec<MessageId>, InboxError> {
        let dir = self.channel_dir(channel);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            // A channel nothing was ever saved to is simply empty.
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(InboxError::io(&dir, e)),
        };

        let now = SystemTime::now();
        let mut ids = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => return Err(InboxError::io(&dir, e)),
            };

            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(stem) = name.strip_suffix(EXT_PAYLOAD) else {
                continue;
            };
            let Some(id) = decode_path_segment(stem) else {
                warn!("Skipping foreign file in {}: {}", dir.display(), name);
                continue;
            };
            let message = MessageId::new(id);

            let modified = match entry.metadata().await.and_then(|m| m.modified()) {
                Ok(modified) => modified,
                // A concurrent lister may have expired this entry
                // between enumeration and stat; it is simply gone.
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(InboxError::io(entry.path(), e)),
            };
            let age = now.duration_since(modified).unwrap_or_default();

            if age > self.expiry {
                debug!(
                    "Expiring message {} from channel {} (age {:?})",
                    message, channel, age
                );
                self.delete(channel, &message).await?;
            } else {
                ids.push(message);
            }
        }
        Ok(ids)
    }

    /// Parse and return the stored metadata document.
    pub async fn get_metadata(
        &self,
        channel: &ChannelId,
        message: &MessageId,
    ) -> Result<Value, InboxError> {
        self.read_document(self.metadata_path(channel, message), channel, message)
            .await
    }

    /// Parse and return the stored payload document.
    pub async fn get_payload(
        &self,
        channel: &ChannelId,
        message: &MessageId,
    ) -> Result<Value, InboxError> {
        self.read_document(self.payload_path(channel, message), channel, message)
            .await
    }

    /// Payload size in whole kilobytes, rounded up.
    pub async fn get_size_kb(
        &self,
        channel: &ChannelId,
        message: &MessageId,
    ) -> Result<u64, InboxError> {
        let metadata = self.payload_fs_metadata(channel, message).await?;
        Ok((metadata.len() + 1023) / 1024)
    }

    /// When the message was stored, taken from the payload file's
    /// last-modified timestamp.
    pub async fn get_creation_time(
        &self,
        channel: &ChannelId,
        message: &MessageId,
    ) -> Result<DateTime<Utc>, InboxError> {
        let path = self.payload_path(channel, message);
        let modified = self
            .payload_fs_metadata(channel, message)
            .await?
            .modified()
            .map_err(|e| InboxError::io(&path, e))?;
        Ok(modified.into())
    }

    async fn payload_fs_metadata(
        &self,
        channel: &ChannelId,
        message: &MessageId,
    ) -> Result<std::fs::Metadata, InboxError> {
        let path = self.payload_path(channel, message);
        match fs::metadata(&path).await {
            Ok(metadata) => Ok(metadata),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(self.not_found(channel, message)),
            Err(e) => Err(InboxError::io(&path, e)),
        }
    }

    async fn read_document(
        &self,
        path: PathBuf,
        channel: &ChannelId,
        message: &MessageId,
    ) -> Result<Value, InboxError> {
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(self.not_found(channel, message));
            }
            Err(e) => return Err(InboxError::io(&path, e)),
        };
        serde_json::from_slice(&bytes).map_err(|source| InboxError::Malformed { path, source })
    }

    fn not_found(&self, channel: &ChannelId, message: &MessageId) -> InboxError {
        InboxError::NotFound {
            channel: channel.clone(),
            message: message.clone(),
        }
    }
}

/// Exclusive creation: fails with `AlreadyExists` if the file is
/// present. This, not an existence check, is the duplicate guard.
async fn create_new(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
}

async fn write_documents(
    mut metadata_file: fs::File,
    metadata_path: &Path,
    metadata: &Value,
    mut payload_file: fs::File,
    payload_path: &Path,
    payload: &Value,
) -> Result<(), InboxError> {
    write_document(&mut metadata_file, metadata_path, metadata).await?;
    debug!("Metadata written: {}", metadata_path.display());
    write_document(&mut payload_file, payload_path, payload).await?;
    debug!("Payload written: {}", payload_path.display());
    Ok(())
}

async fn write_document(
    file: &mut fs::File,
    path: &Path,
    document: &Value,
) -> Result<(), InboxError> {
    let bytes =
        serde_json::to_vec(document).map_err(|e| InboxError::io(path, std::io::Error::other(e)))?;
    file.write_all(&bytes)
        .await
        .map_err(|e| InboxError::io(path, e))?;
    file.flush().await.map_err(|e| InboxError::io(path, e))?;
    Ok(())
}

/// Rollback helper. Its own failure is logged, never re-raised, so the
/// original fault stays the one reported.
async fn remove_best_effort(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => info!("Rolled back {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Could not roll back {}: {}", path.display(), e),
    }
}

async fn remove_if_present(path: &Path) -> Result<bool, InboxError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(InboxError::io(path, e)),
    }
}
