//! Server-side copy of an Azure Storage blob between accounts.
//!
//! The source blob is read through a one-hour, read-only shared access
//! signature, so the copy runs entirely inside the storage service; the
//! module only starts it and, when asked to, polls the destination until the
//! service reports `success`.

#[macro_use]
extern crate log;

mod azure_backend;
mod backend;
mod blob_locator;
mod copy;
mod params;
pub mod prelude;

pub use azure_backend::AzureCopyBackend;
pub use backend::{CopyBackend, CopyState};
pub use blob_locator::BlobLocator;
pub use copy::{copy_blob, CopyOutcome, CopyProgress, CopyRequest, POLL_INTERVAL};
pub use params::{CopyBlobParams, DEFAULT_TIMEOUT_SECS};

use azure_automation::module::ModuleArgs;
use serde_json::Value;

/// The `azure_copy_blob` module body.
pub async fn run_module(args: ModuleArgs) -> azure_core::Result<Value> {
    let params = CopyBlobParams::from_args(&args)?;
    let request = params.request()?;
    let backend = AzureCopyBackend::new(
        &request.source.account,
        &params.source_key,
        &params.destination_account,
        &params.destination_key,
    );

    let outcome = copy_blob(&backend, &request).await?;
    Ok(outcome.to_value())
}
