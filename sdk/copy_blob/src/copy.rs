use crate::{BlobLocator, CopyBackend, CopyState};
use azure_automation::poll::{poll_until, PollPolicy};
use serde_json::{json, Value};
use std::time::Duration;
use time::OffsetDateTime;
use url::Url;

/// Time between copy status checks when waiting.
pub const POLL_INTERVAL: Duration = Duration::from_secs(30);
/// Lifetime of the source blob's read signature.
pub const SOURCE_SIGNATURE_TTL: time::Duration = time::Duration::hours(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyRequest {
    pub source: BlobLocator,
    pub destination_container: String,
    pub destination_blob: String,
    /// Poll until the copy succeeds; `None` returns once it is started.
    pub wait: Option<PollPolicy>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyProgress {
    Started,
    Completed,
}

impl CopyProgress {
    pub fn as_str(self) -> &'static str {
        match self {
            CopyProgress::Started => "started",
            CopyProgress::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyOutcome {
    pub progress: CopyProgress,
    pub destination_uri: Url,
}

impl CopyOutcome {
    /// The module result: `{changed, status, destination_uri}`.
    pub fn to_value(&self) -> Value {
        json!({
            "changed": true,
            "status": self.progress.as_str(),
            "destination_uri": self.destination_uri.as_str(),
        })
    }
}

/// Copies `request.source` into the destination container and blob.
///
/// The destination container is created when missing. Without
/// `request.wait` this returns as soon as the service accepts the copy;
/// otherwise the destination's copy status is polled until it reads
/// `success`. Any other state, terminal or not, keeps the poll going until
/// the policy's timeout.
pub async fn copy_blob<B>(backend: &B, request: &CopyRequest) -> azure_core::Result<CopyOutcome>
where
    B: CopyBackend + ?Sized,
{
    let container = request.destination_container.as_str();
    let blob = request.destination_blob.as_str();

    let expiry = OffsetDateTime::now_utc() + SOURCE_SIGNATURE_TTL;
    let source_url = backend.signed_source_url(&request.source, expiry).await?;
    trace!("signed read url issued for {}", request.source);

    backend.ensure_container(container).await?;

    let state = backend.start_copy(container, blob, source_url).await?;
    info!(
        "copy of {} into {container}/{blob} started ({state})",
        request.source
    );

    let destination_uri = backend.blob_url(container, blob)?;

    let policy = match request.wait {
        Some(policy) => policy,
        None => {
            return Ok(CopyOutcome {
                progress: CopyProgress::Started,
                destination_uri,
            })
        }
    };

    poll_until(policy, "async copy", move || async move {
        let state = backend.copy_state(container, blob).await?;
        match state {
            CopyState::Aborted | CopyState::Failed => {
                warn!("copy into {container}/{blob} reports {state}; still waiting for success")
            }
            _ => debug!("copy into {container}/{blob} is {state}"),
        }
        Ok(state.is_success())
    })
    .await?;

    Ok(CopyOutcome {
        progress: CopyProgress::Completed,
        destination_uri,
    })
}
