use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    azure_automation::run(azure_copy_blob::run_module).await
}
