use crate::params::{CaptureParams, DEFAULT_VHD_PREFIX};
use azure_automation::environment::Environment;
use azure_core::error::{Error, ErrorKind, ResultExt};
use std::fmt;
use std::time::Duration;
use url::Url;

pub const AZURE_URL: &str = "AZURE_URL";
pub const AZURE_RESOURCE_GROUP_NAME: &str = "AZURE_RESOURCE_GROUP_NAME";
pub const DESTINATION_CONTAINER: &str = "DESTINATION_CONTAINER";
pub const AZURE_SUBSCRIPTION_ID: &str = "AZURE_SUBSCRIPTION_ID";
pub const AZURE_TENANT: &str = "AZURE_TENANT";
pub const AZURE_CLIENT_ID: &str = "AZURE_CLIENT_ID";
pub const AZURE_SECRET: &str = "AZURE_SECRET";

const MISSING_CREDENTIALS: &str =
    "security token or client_id, client_secret, subscription_id and tenant_id is required";

/// Azure AD application used to sign in to Resource Manager.
#[derive(Clone, PartialEq, Eq)]
pub struct ServicePrincipal {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for ServicePrincipal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServicePrincipal")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Fully resolved settings for one capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    pub credentials: ServicePrincipal,
    pub subscription_id: String,
    /// Resource Manager endpoint; the public cloud when `None`.
    pub azure_url: Option<Url>,
    pub resource_group_name: String,
    pub vm_name: String,
    pub destination_container: String,
    pub vhd_prefix: String,
    pub overwrite: bool,
    /// Bound on the wait for deallocation; `None` waits as long as it takes.
    pub timeout: Option<Duration>,
}

impl CaptureConfig {
    /// Fills every setting the task left out from `env`, then checks that
    /// the capture can be attempted.
    ///
    /// Nothing here talks to Azure: a missing credential fails before any
    /// credential object or client is built.
    pub fn resolve(params: CaptureParams, env: &dyn Environment) -> azure_core::Result<Self> {
        let azure_url = env.or_var(params.azure_url, AZURE_URL);
        let resource_group_name = env.or_var(params.resource_group_name, AZURE_RESOURCE_GROUP_NAME);
        let destination_container =
            env.or_var(params.destination_container, DESTINATION_CONTAINER);
        let subscription_id = env.or_var(params.subscription_id, AZURE_SUBSCRIPTION_ID);
        let tenant_id = env.or_var(params.tenant_id, AZURE_TENANT);
        let client_id = env.or_var(params.client_id, AZURE_CLIENT_ID);
        let client_secret = env.or_var(params.client_secret, AZURE_SECRET);
        let vm_name = params.vm_name.filter(|name| !name.is_empty());

        let missing: Vec<&str> = [
            ("resource_group_name", resource_group_name.is_none()),
            ("vm_name", vm_name.is_none()),
            ("destination_container", destination_container.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();
        if !missing.is_empty() {
            return Err(Error::with_message(ErrorKind::Other, || {
                format!("missing required arguments: {}", missing.join(", "))
            }));
        }

        let (subscription_id, tenant_id, client_id, client_secret) =
            match (subscription_id, tenant_id, client_id, client_secret) {
                (Some(subscription_id), Some(tenant_id), Some(client_id), Some(client_secret)) => {
                    (subscription_id, tenant_id, client_id, client_secret)
                }
                _ => return Err(Error::message(ErrorKind::Credential, MISSING_CREDENTIALS)),
            };

        let azure_url = azure_url
            .map(|url| {
                Url::parse(&url).with_context(ErrorKind::DataConversion, || {
                    format!("azure_url '{url}' is not a valid url")
                })
            })
            .transpose()?;

        Ok(Self {
            credentials: ServicePrincipal {
                tenant_id,
                client_id,
                client_secret,
            },
            subscription_id,
            azure_url,
            // presence checked above
            resource_group_name: resource_group_name.unwrap_or_default(),
            vm_name: vm_name.unwrap_or_default(),
            destination_container: destination_container.unwrap_or_default(),
            vhd_prefix: params
                .vhd_prefix
                .filter(|prefix| !prefix.is_empty())
                .unwrap_or_else(|| DEFAULT_VHD_PREFIX.to_owned()),
            overwrite: params.overwrite.unwrap_or(true),
            timeout: params.timeout.map(Duration::from_secs),
        })
    }
}
