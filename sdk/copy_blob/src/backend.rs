use crate::BlobLocator;
use async_trait::async_trait;
use std::fmt;
use time::OffsetDateTime;
use url::Url;

/// Copy state of a destination blob as reported by the storage service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyState {
    Pending,
    Success,
    Aborted,
    Failed,
    /// The blob carries no copy status (or one this crate does not know).
    Unknown,
}

impl CopyState {
    pub fn is_success(self) -> bool {
        self == CopyState::Success
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CopyState::Pending => "pending",
            CopyState::Success => "success",
            CopyState::Aborted => "aborted",
            CopyState::Failed => "failed",
            CopyState::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CopyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The storage calls the copy procedure needs.
///
/// The destination side is always addressed by container and blob name in
/// the destination account the backend was built for.
#[async_trait]
pub trait CopyBackend: Send + Sync {
    /// A URL for `source` carrying a read-only, blob-scoped shared access
    /// signature valid until `expiry`.
    async fn signed_source_url(
        &self,
        source: &BlobLocator,
        expiry: OffsetDateTime,
    ) -> azure_core::Result<Url>;

    /// Creates `container` unless it already exists.
    async fn ensure_container(&self, container: &str) -> azure_core::Result<()>;

    /// Starts an asynchronous server-side copy of `source` into
    /// `container/blob`, returning the state the service reported.
    async fn start_copy(
        &self,
        container: &str,
        blob: &str,
        source: Url,
    ) -> azure_core::Result<CopyState>;

    async fn copy_state(&self, container: &str, blob: &str) -> azure_core::Result<CopyState>;

    /// The unsigned URL of `container/blob`.
    fn blob_url(&self, container: &str, blob: &str) -> azure_core::Result<Url>;
}
