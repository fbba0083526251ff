use crate::{CaptureConfig, CaptureParameters, ComputeBackend, OperationState};
use async_trait::async_trait;
use azure_core::auth::{TokenCredential, DEFAULT_SCOPE_SUFFIX};
use azure_core::error::{ErrorKind, ResultExt};
use azure_core::lro::location::{get_location, FinalState};
use azure_core::lro::LroStatus;
use azure_core::{headers, HttpClient, Method, Request, StatusCode};
use azure_identity::ClientSecretCredential;
use azure_mgmt_compute::models::VirtualMachineCaptureParameters;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// [`ComputeBackend`] over `azure_mgmt_compute`, signed in as a service
/// principal.
pub struct AzureComputeBackend {
    client: azure_mgmt_compute::Client,
    subscription_id: String,
    // long-running operation monitors are followed outside the compute client
    credential: Arc<dyn TokenCredential>,
    http_client: Arc<dyn HttpClient>,
    scopes: Vec<String>,
}

impl AzureComputeBackend {
    pub fn new(config: &CaptureConfig) -> azure_core::Result<Self> {
        let http_client = azure_core::new_http_client();
        let credential = ClientSecretCredential::new(
            http_client.clone(),
            azure_core::authority_hosts::AZURE_PUBLIC_CLOUD.clone(),
            config.credentials.tenant_id.clone(),
            config.credentials.client_id.clone(),
            config.credentials.client_secret.clone(),
        );
        let credential: Arc<dyn TokenCredential> = Arc::new(credential);

        let endpoint = match &config.azure_url {
            Some(endpoint) => {
                debug!("using resource manager endpoint {endpoint}");
                endpoint.clone()
            }
            None => azure_core::resource_manager_endpoint::AZURE_PUBLIC_CLOUD.clone(),
        };
        let scope = endpoint
            .join(DEFAULT_SCOPE_SUFFIX)
            .context(ErrorKind::DataConversion, "invalid resource manager endpoint")?;

        let client = azure_mgmt_compute::Client::builder(credential.clone())
            .endpoint(endpoint)
            .build()?;

        Ok(Self {
            client,
            subscription_id: config.subscription_id.clone(),
            credential,
            http_client,
            scopes: vec![scope.to_string()],
        })
    }
}

impl fmt::Debug for AzureComputeBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureComputeBackend")
            .field("subscription_id", &self.subscription_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ComputeBackend for AzureComputeBackend {
    async fn deallocate(
        &self,
        resource_group: &str,
        vm_name: &str,
    ) -> azure_core::Result<Option<Url>> {
        let response = self
            .client
            .virtual_machines_client()
            .deallocate(resource_group, vm_name, &self.subscription_id)
            .send()
            .await?;

        let headers = response.as_raw_response().headers();
        match get_location(headers, FinalState::AzureAsyncOperation)? {
            Some(monitor) => Ok(Some(monitor)),
            None => get_location(headers, FinalState::Location),
        }
    }

    async fn operation_state(&self, monitor: &Url) -> azure_core::Result<OperationState> {
        let scopes: Vec<&str> = self.scopes.iter().map(String::as_str).collect();
        let token = self.credential.get_token(&scopes).await?;

        let mut request = Request::new(monitor.clone(), Method::Get);
        request.insert_header(
            headers::AUTHORIZATION,
            format!("Bearer {}", token.token.secret()),
        );
        let response = self
            .http_client
            .execute_request_check_status(&request)
            .await?;

        // a Location monitor answers 202 until the operation is over
        if *response.status() == StatusCode::Accepted {
            return Ok(OperationState::InProgress);
        }
        Ok(operation_state_from_body(response.body()))
    }

    async fn power_state(
        &self,
        resource_group: &str,
        vm_name: &str,
    ) -> azure_core::Result<Option<String>> {
        let instance_view = self
            .client
            .virtual_machines_client()
            .instance_view(resource_group, vm_name, &self.subscription_id)
            .await?;
        let instance_view = serde_json::to_value(instance_view)
            .context(ErrorKind::DataConversion, "failed to read instance view")?;

        Ok(instance_view["statuses"]
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|status| status["code"].as_str())
            .find(|code| code.starts_with("PowerState/"))
            .map(str::to_owned))
    }

    async fn generalize(&self, resource_group: &str, vm_name: &str) -> azure_core::Result<()> {
        self.client
            .virtual_machines_client()
            .generalize(resource_group, vm_name, &self.subscription_id)
            .send()
            .await?;
        Ok(())
    }

    async fn capture(
        &self,
        resource_group: &str,
        vm_name: &str,
        parameters: &CaptureParameters,
    ) -> azure_core::Result<Value> {
        let parameters = VirtualMachineCaptureParameters::new(
            parameters.vhd_prefix.clone(),
            parameters.destination_container.clone(),
            parameters.overwrite_vhds,
        );

        let result = self
            .client
            .virtual_machines_client()
            .capture(resource_group, vm_name, parameters, &self.subscription_id)
            .await?;

        serde_json::to_value(result).context(ErrorKind::DataConversion, "failed to read capture result")
    }
}

#[derive(Deserialize)]
struct OperationBody {
    status: Option<String>,
    error: Option<OperationError>,
}

#[derive(Deserialize)]
struct OperationError {
    code: Option<String>,
    message: Option<String>,
}

/// Reads an `Azure-AsyncOperation` status document. A body without a
/// status is the final resource of a `Location` monitor, so the operation
/// is over.
fn operation_state_from_body(body: &[u8]) -> OperationState {
    let body: OperationBody = match serde_json::from_slice(body) {
        Ok(body) => body,
        Err(_) => return OperationState::Succeeded,
    };
    let status = match body.status {
        Some(status) => LroStatus::from(status.as_str()),
        None => return OperationState::Succeeded,
    };

    let reason = || {
        body.error
            .as_ref()
            .and_then(|error| error.message.clone().or_else(|| error.code.clone()))
    };
    match status {
        LroStatus::Succeeded => OperationState::Succeeded,
        LroStatus::Failed => {
            OperationState::Failed(reason().unwrap_or_else(|| "operation failed".to_owned()))
        }
        LroStatus::Canceled => {
            OperationState::Failed(reason().unwrap_or_else(|| "operation canceled".to_owned()))
        }
        LroStatus::InProgress | LroStatus::Other(_) => OperationState::InProgress,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_async_operation_documents() {
        assert_eq!(
            operation_state_from_body(br#"{"status":"InProgress","name":"op"}"#),
            OperationState::InProgress
        );
        assert_eq!(
            operation_state_from_body(br#"{"status":"Succeeded","endTime":"2024-07-01T10:00:00Z"}"#),
            OperationState::Succeeded
        );
        assert_eq!(
            operation_state_from_body(
                br#"{"status":"Failed","error":{"code":"OperationNotAllowed","message":"VM is in a failed state"}}"#
            ),
            OperationState::Failed("VM is in a failed state".to_owned())
        );
        assert_eq!(
            operation_state_from_body(br#"{"status":"Canceled","error":{"code":"Canceled"}}"#),
            OperationState::Failed("Canceled".to_owned())
        );
        assert_eq!(
            operation_state_from_body(br#"{"status":"Cancelled"}"#),
            OperationState::Failed("operation canceled".to_owned())
        );
    }

    #[test]
    fn final_location_resource_means_done() {
        assert_eq!(operation_state_from_body(b""), OperationState::Succeeded);
        assert_eq!(
            operation_state_from_body(br#"{"name":"MyUbuntuVM","properties":{}}"#),
            OperationState::Succeeded
        );
    }
}
