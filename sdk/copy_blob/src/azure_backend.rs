use crate::{BlobLocator, CopyBackend, CopyState};
use async_trait::async_trait;
use azure_core::auth::Secret;
use azure_core::error::{Error, ErrorKind};
use azure_core::StatusCode;
use azure_storage::prelude::*;
use azure_storage_blobs::blob::CopyStatus;
use azure_storage_blobs::prelude::*;
use std::fmt;
use time::OffsetDateTime;
use url::Url;

/// [`CopyBackend`] over `azure_storage_blobs`, authenticated with account
/// keys on both sides.
#[derive(Clone)]
pub struct AzureCopyBackend {
    source: BlobServiceClient,
    destination: BlobServiceClient,
}

impl AzureCopyBackend {
    pub fn new(
        source_account: &str,
        source_key: &str,
        destination_account: &str,
        destination_key: &str,
    ) -> Self {
        Self {
            source: service_client(source_account, source_key),
            destination: service_client(destination_account, destination_key),
        }
    }

    fn destination_blob(&self, container: &str, blob: &str) -> BlobClient {
        self.destination.container_client(container).blob_client(blob)
    }
}

fn service_client(account: &str, key: &str) -> BlobServiceClient {
    let storage_credentials =
        StorageCredentials::access_key(account.to_owned(), Secret::new(key.to_owned()));
    ClientBuilder::new(account.to_owned(), storage_credentials).blob_service_client()
}

impl fmt::Debug for AzureCopyBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureCopyBackend").finish_non_exhaustive()
    }
}

/// Container creation's `409 ContainerAlreadyExists`. Other conflicts,
/// such as `ContainerBeingDeleted`, still fail.
fn is_already_exists(error: &Error) -> bool {
    match error.kind() {
        ErrorKind::HttpResponse {
            status: StatusCode::Conflict,
            error_code,
        } => matches!(error_code.as_deref(), None | Some("ContainerAlreadyExists")),
        _ => false,
    }
}

impl From<&CopyStatus> for CopyState {
    fn from(status: &CopyStatus) -> Self {
        #[allow(unreachable_patterns)]
        match status {
            CopyStatus::Pending => CopyState::Pending,
            CopyStatus::Success => CopyState::Success,
            CopyStatus::Aborted => CopyState::Aborted,
            CopyStatus::Failed => CopyState::Failed,
            _ => CopyState::Unknown,
        }
    }
}

#[async_trait]
impl CopyBackend for AzureCopyBackend {
    async fn signed_source_url(
        &self,
        source: &BlobLocator,
        expiry: OffsetDateTime,
    ) -> azure_core::Result<Url> {
        let blob_client = self
            .source
            .container_client(&source.container)
            .blob_client(&source.blob);

        let sas = blob_client
            .shared_access_signature(
                BlobSasPermissions {
                    read: true,
                    ..Default::default()
                },
                expiry,
            )
            .await?;

        blob_client.generate_signed_blob_url(&sas)
    }

    async fn ensure_container(&self, container: &str) -> azure_core::Result<()> {
        // create unconditionally: a concurrent run may create it between an
        // existence check and our create
        match self.destination.container_client(container).create().await {
            Ok(_) => {
                debug!("created container {container}");
                Ok(())
            }
            Err(error) if is_already_exists(&error) => {
                trace!("container {container} already exists");
                Ok(())
            }
            Err(error) => Err(error),
        }
    }

    async fn start_copy(
        &self,
        container: &str,
        blob: &str,
        source: Url,
    ) -> azure_core::Result<CopyState> {
        let response = self.destination_blob(container, blob).copy(source).await?;
        Ok(CopyState::from(&response.copy_status))
    }

    async fn copy_state(&self, container: &str, blob: &str) -> azure_core::Result<CopyState> {
        let properties = self
            .destination_blob(container, blob)
            .get_properties()
            .await?
            .blob
            .properties;

        Ok(properties
            .copy_status
            .as_ref()
            .map_or(CopyState::Unknown, CopyState::from))
    }

    fn blob_url(&self, container: &str, blob: &str) -> azure_core::Result<Url> {
        self.destination_blob(container, blob).url()
    }
}
