use azure_automation::{lenient, module::ModuleArgs};
use serde::Deserialize;
use std::fmt;

pub const DEFAULT_VHD_PREFIX: &str = "vm-osdisk";

/// Task parameters of the `azure_image_capture` module.
///
/// Everything but `vm_name` may instead come from the environment, so
/// presence is checked after [`CaptureConfig::resolve`](crate::CaptureConfig::resolve).
#[derive(Clone, Default, Deserialize)]
pub struct CaptureParams {
    pub azure_url: Option<String>,
    pub subscription_id: Option<String>,
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub resource_group_name: Option<String>,
    pub vm_name: Option<String>,
    pub destination_container: Option<String>,
    pub vhd_prefix: Option<String>,
    #[serde(default, deserialize_with = "lenient::bool")]
    pub overwrite: Option<bool>,
    /// Seconds to wait for deallocation; unbounded when absent.
    #[serde(default, deserialize_with = "lenient::u64")]
    pub timeout: Option<u64>,
}

impl CaptureParams {
    pub fn from_args(args: &ModuleArgs) -> azure_core::Result<Self> {
        args.require(&["vm_name"])?;
        args.parse()
    }
}

impl fmt::Debug for CaptureParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureParams")
            .field("azure_url", &self.azure_url)
            .field("subscription_id", &self.subscription_id)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("resource_group_name", &self.resource_group_name)
            .field("vm_name", &self.vm_name)
            .field("destination_container", &self.destination_container)
            .field("vhd_prefix", &self.vhd_prefix)
            .field("overwrite", &self.overwrite)
            .field("timeout", &self.timeout)
            .finish()
    }
}
