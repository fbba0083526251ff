use azure_automation::environment::ProcessEnvironment;
use azure_image_capture::prelude::*;

#[tokio::main]
async fn main() -> azure_core::Result<()> {
    env_logger::init();

    // Credentials, subscription and resource group come from AZURE_CLIENT_ID,
    // AZURE_SECRET, AZURE_TENANT, AZURE_SUBSCRIPTION_ID and
    // AZURE_RESOURCE_GROUP_NAME.
    let vm_name = std::env::args()
        .nth(1)
        .expect("please specify the virtual machine name as first command line parameter");
    let destination_container = std::env::args()
        .nth(2)
        .expect("please specify destination container name as second command line parameter");

    let params = CaptureParams {
        vm_name: Some(vm_name),
        destination_container: Some(destination_container),
        ..Default::default()
    };
    let config = CaptureConfig::resolve(params, &ProcessEnvironment)?;
    let backend = AzureComputeBackend::new(&config)?;

    let outcome = capture_image(&backend, &config).await?;
    println!("captured image: {}", outcome.vhd_uri);

    Ok(())
}
