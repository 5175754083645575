//! Durable per-channel inbox for inbound business documents.
//!
//! Each message is stored as a metadata/payload file pair with atomic
//! both-or-neither semantics; the filesystem's exclusive-create flag is
//! the only lock. Listing a channel expires messages past the
//! configured age as a side effect.

pub mod config;
pub mod error;
mod inbox;

pub use config::{DEFAULT_EXPIRY, InboxConfig};
pub use error::InboxError;
pub use inbox::{DeleteOutcome, Inbox};
