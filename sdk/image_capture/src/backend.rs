use async_trait::async_trait;
use serde_json::Value;
use url::Url;

/// Destination of a capture (`VirtualMachineCaptureParameters`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureParameters {
    pub vhd_prefix: String,
    pub destination_container: String,
    pub overwrite_vhds: bool,
}

/// State of a Resource Manager long-running operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationState {
    InProgress,
    Succeeded,
    /// Failed or canceled, with the provider's reason.
    Failed(String),
}

/// The virtual machine operations a capture needs, scoped to one
/// subscription.
#[async_trait]
pub trait ComputeBackend: Send + Sync {
    /// Requests deallocation and returns once the request is accepted,
    /// with the URL the operation can be followed at if the provider sent
    /// one.
    async fn deallocate(&self, resource_group: &str, vm_name: &str)
        -> azure_core::Result<Option<Url>>;

    /// Current state of the operation behind `monitor`.
    async fn operation_state(&self, monitor: &Url) -> azure_core::Result<OperationState>;

    /// The `PowerState/...` status code from the instance view, if any.
    async fn power_state(
        &self,
        resource_group: &str,
        vm_name: &str,
    ) -> azure_core::Result<Option<String>>;

    async fn generalize(&self, resource_group: &str, vm_name: &str) -> azure_core::Result<()>;

    /// Captures the virtual machine and returns the capture result document
    /// once the operation has finished.
    async fn capture(
        &self,
        resource_group: &str,
        vm_name: &str,
        parameters: &CaptureParameters,
    ) -> azure_core::Result<Value>;
}
