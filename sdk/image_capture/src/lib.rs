//! Capture of a generalized Azure virtual machine image.
//!
//! The virtual machine is deallocated, marked as generalized and captured
//! into a container of its own storage account; the module reports the URI
//! of the resulting OS disk VHD.

#[macro_use]
extern crate log;

mod azure_backend;
mod backend;
mod capture;
mod config;
mod params;
pub mod prelude;

pub use azure_backend::AzureComputeBackend;
pub use backend::{CaptureParameters, ComputeBackend, OperationState};
pub use capture::{
    capture_image, extract_vhd_uri, CaptureOutcome, DEALLOCATED_POWER_STATE,
    DEALLOCATE_POLL_INTERVAL,
};
pub use config::{CaptureConfig, ServicePrincipal};
pub use params::CaptureParams;

use azure_automation::environment::{Environment, ProcessEnvironment};
use azure_automation::module::ModuleArgs;
use serde_json::Value;

/// The `azure_image_capture` module body, resolving settings against the
/// process environment.
pub async fn run_module(args: ModuleArgs) -> azure_core::Result<Value> {
    run_module_with_env(args, &ProcessEnvironment).await
}

pub async fn run_module_with_env(
    args: ModuleArgs,
    env: &dyn Environment,
) -> azure_core::Result<Value> {
    let params = CaptureParams::from_args(&args)?;
    let config = CaptureConfig::resolve(params, env)?;
    let backend = AzureComputeBackend::new(&config)?;

    let outcome = capture_image(&backend, &config).await?;
    Ok(outcome.to_value())
}
