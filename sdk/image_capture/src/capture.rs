use crate::{CaptureConfig, CaptureParameters, ComputeBackend, OperationState};
use azure_automation::poll::{poll_until, PollPolicy};
use azure_core::error::{Error, ErrorKind};
use serde_json::{json, Value};
use std::time::Duration;

/// Time between power state checks while waiting for deallocation.
pub const DEALLOCATE_POLL_INTERVAL: Duration = Duration::from_secs(15);
pub const DEALLOCATED_POWER_STATE: &str = "PowerState/deallocated";

const VHD_URI_POINTER: &str = "/resources/0/properties/storageProfile/osDisk/image/uri";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOutcome {
    pub destination_container: String,
    pub vhd_uri: String,
}

impl CaptureOutcome {
    /// The module result: `{changed, msg, vhd_uri}`.
    pub fn to_value(&self) -> Value {
        json!({
            "changed": true,
            "msg": format!(
                "Successfully captured image to container:{}",
                self.destination_container
            ),
            "vhd_uri": self.vhd_uri,
        })
    }
}

/// Deallocates, generalizes and captures `config.vm_name`.
///
/// Each step completes before the next begins: the deallocation operation
/// is followed until it succeeds and the instance view reports the machine
/// deallocated, and generalization is awaited so the capture never races
/// it. Both deallocation waits are bounded by `config.timeout`; a failed or
/// canceled deallocation ends the capture.
pub async fn capture_image<B>(backend: &B, config: &CaptureConfig) -> azure_core::Result<CaptureOutcome>
where
    B: ComputeBackend + ?Sized,
{
    let resource_group = config.resource_group_name.as_str();
    let vm_name = config.vm_name.as_str();

    info!("deallocating {resource_group}/{vm_name}");
    let monitor = backend.deallocate(resource_group, vm_name).await?;

    let policy = PollPolicy::new(
        DEALLOCATE_POLL_INTERVAL,
        config.timeout.unwrap_or(Duration::MAX),
    );
    if let Some(monitor) = &monitor {
        poll_until(policy, "deallocation", move || async move {
            match backend.operation_state(monitor).await? {
                OperationState::InProgress => Ok(false),
                OperationState::Succeeded => Ok(true),
                OperationState::Failed(reason) => Err(Error::with_message(ErrorKind::Other, || {
                    format!("deallocation of {resource_group}/{vm_name} failed: {reason}")
                })),
            }
        })
        .await?;
    }

    poll_until(policy, "deallocation", move || async move {
        let state = backend.power_state(resource_group, vm_name).await?;
        debug!("{resource_group}/{vm_name} power state: {state:?}");
        Ok(state.as_deref() == Some(DEALLOCATED_POWER_STATE))
    })
    .await?;

    info!("generalizing {resource_group}/{vm_name}");
    backend.generalize(resource_group, vm_name).await?;

    let parameters = CaptureParameters {
        vhd_prefix: config.vhd_prefix.clone(),
        destination_container: config.destination_container.clone(),
        overwrite_vhds: config.overwrite,
    };
    info!(
        "capturing {resource_group}/{vm_name} into container {}",
        parameters.destination_container
    );
    let result = backend.capture(resource_group, vm_name, &parameters).await?;

    Ok(CaptureOutcome {
        destination_container: parameters.destination_container,
        vhd_uri: extract_vhd_uri(&result)?,
    })
}

/// The OS disk VHD URI of the first resource in a capture result
/// (`resources[0].properties.storageProfile.osDisk.image.uri`).
pub fn extract_vhd_uri(result: &Value) -> azure_core::Result<String> {
    match result.pointer(VHD_URI_POINTER).and_then(Value::as_str) {
        Some(uri) if !uri.is_empty() => Ok(uri.to_owned()),
        _ => Err(Error::message(
            ErrorKind::DataConversion,
            "capture result has no resources[0].properties.storageProfile.osDisk.image.uri",
        )),
    }
}
