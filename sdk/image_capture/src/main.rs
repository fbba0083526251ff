use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    azure_automation::run(azure_image_capture::run_module).await
}
