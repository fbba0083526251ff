use crate::{copy::POLL_INTERVAL, BlobLocator, CopyRequest};
use azure_automation::{lenient, module::ModuleArgs, poll::PollPolicy};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Seconds to wait for the copy when `timeout` is not given.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10_000;

const REQUIRED: &[&str] = &[
    "source_uri",
    "source_key",
    "destination_account",
    "destination_key",
    "destination_container",
    "destination_blob",
];

/// Task parameters of the `azure_copy_blob` module.
#[derive(Clone, Deserialize)]
pub struct CopyBlobParams {
    pub source_uri: String,
    pub source_key: String,
    pub destination_account: String,
    pub destination_key: String,
    pub destination_container: String,
    pub destination_blob: String,
    #[serde(default, deserialize_with = "lenient::bool")]
    pub wait: Option<bool>,
    /// Seconds.
    #[serde(default, deserialize_with = "lenient::u64")]
    pub timeout: Option<u64>,
}

impl CopyBlobParams {
    pub fn from_args(args: &ModuleArgs) -> azure_core::Result<Self> {
        args.require(REQUIRED)?;
        args.parse()
    }

    pub fn wait(&self) -> bool {
        self.wait.unwrap_or(false)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn request(&self) -> azure_core::Result<CopyRequest> {
        Ok(CopyRequest {
            source: BlobLocator::parse(&self.source_uri)?,
            destination_container: self.destination_container.clone(),
            destination_blob: self.destination_blob.clone(),
            wait: self
                .wait()
                .then(|| PollPolicy::new(POLL_INTERVAL, self.timeout())),
        })
    }
}

// keys stay out of logs
impl fmt::Debug for CopyBlobParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CopyBlobParams")
            .field("source_uri", &self.source_uri)
            .field("source_key", &"<redacted>")
            .field("destination_account", &self.destination_account)
            .field("destination_key", &"<redacted>")
            .field("destination_container", &self.destination_container)
            .field("destination_blob", &self.destination_blob)
            .field("wait", &self.wait)
            .field("timeout", &self.timeout)
            .finish()
    }
}
