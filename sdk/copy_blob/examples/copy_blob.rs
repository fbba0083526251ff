use azure_copy_blob::prelude::*;
use azure_automation::poll::PollPolicy;
use std::time::Duration;

#[tokio::main]
async fn main() -> azure_core::Result<()> {
    env_logger::init();

    // First we retrieve the account names and access keys from environment variables.
    let source_access_key = std::env::var("SOURCE_STORAGE_ACCESS_KEY")
        .expect("Set env variable SOURCE_STORAGE_ACCESS_KEY first!");
    let destination_account = std::env::var("DESTINATION_STORAGE_ACCOUNT")
        .expect("Set env variable DESTINATION_STORAGE_ACCOUNT first!");
    let destination_access_key = std::env::var("DESTINATION_STORAGE_ACCESS_KEY")
        .expect("Set env variable DESTINATION_STORAGE_ACCESS_KEY first!");

    let source_uri = std::env::args()
        .nth(1)
        .expect("please specify the source blob uri as first command line parameter");
    let destination_container = std::env::args()
        .nth(2)
        .expect("please specify destination container name as second command line parameter");
    let destination_blob = std::env::args()
        .nth(3)
        .expect("please specify destination blob name as third command line parameter");

    let request = CopyRequest {
        source: BlobLocator::parse(&source_uri)?,
        destination_container,
        destination_blob,
        wait: Some(PollPolicy::new(
            Duration::from_secs(5),
            Duration::from_secs(600),
        )),
    };

    let backend = AzureCopyBackend::new(
        &request.source.account,
        &source_access_key,
        &destination_account,
        &destination_access_key,
    );

    let outcome = copy_blob(&backend, &request).await?;
    println!("copy outcome == {:#?}", outcome);

    Ok(())
}
