use std::path::PathBuf;
use std::time::Duration;

/// Messages older than this are removed during listing.
pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(2 * 60 * 60);

const DEFAULT_STORE_DIR: &str = "./courier-store";

/// Inbox location and expiry threshold.
#[derive(Debug, Clone)]
pub struct InboxConfig {
    /// Base directory; the store lives under `{base_dir}/inbox`.
    pub base_dir: PathBuf,
    pub expiry: Duration,
}

impl Default for InboxConfig {
    fn default() -> Self {
        Self {
            base_dir: DEFAULT_STORE_DIR.into(),
            expiry: DEFAULT_EXPIRY,
        }
    }
}

impl InboxConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.expiry = expiry;
        self
    }

    /// Read `COURIER_STORE_DIR` and `COURIER_EXPIRY_HOURS` from the
    /// environment, falling back to the defaults.
    pub fn from_env() -> Self {
        let base_dir: PathBuf = std::env::var("COURIER_STORE_DIR")
            .unwrap_or_else(|_| DEFAULT_STORE_DIR.into())
            .into();
        let expiry = std::env::var("COURIER_EXPIRY_HOURS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(|hours| Duration::from_secs(hours * 3600))
            .unwrap_or(DEFAULT_EXPIRY);
        Self { base_dir, expiry }
    }
}
