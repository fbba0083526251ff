use async_trait::async_trait;
use azure_automation::poll::PollPolicy;
use azure_copy_blob::prelude::*;
use azure_core::error::{Error, ErrorKind};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::time::Instant;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Sign(BlobLocator),
    EnsureContainer(String),
    StartCopy(String, String, Url),
    CopyState(String, String),
}

/// Answers copy status probes from a script; `Pending` once it runs dry.
#[derive(Default)]
struct FakeBackend {
    calls: Mutex<Vec<Call>>,
    states: Mutex<VecDeque<CopyState>>,
    expiries: Mutex<Vec<OffsetDateTime>>,
    fail_ensure: bool,
}

impl FakeBackend {
    fn with_states(states: impl IntoIterator<Item = CopyState>) -> Self {
        Self {
            states: Mutex::new(states.into_iter().collect()),
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn probes(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::CopyState(..)))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl CopyBackend for FakeBackend {
    async fn signed_source_url(
        &self,
        source: &BlobLocator,
        expiry: OffsetDateTime,
    ) -> azure_core::Result<Url> {
        self.record(Call::Sign(source.clone()));
        self.expiries.lock().unwrap().push(expiry);
        let mut url = Url::parse(&source.to_string()).unwrap();
        url.set_query(Some("sp=r&sig=fake"));
        Ok(url)
    }

    async fn ensure_container(&self, container: &str) -> azure_core::Result<()> {
        self.record(Call::EnsureContainer(container.to_owned()));
        if self.fail_ensure {
            return Err(Error::message(ErrorKind::Credential, "AuthenticationFailed"));
        }
        Ok(())
    }

    async fn start_copy(
        &self,
        container: &str,
        blob: &str,
        source: Url,
    ) -> azure_core::Result<CopyState> {
        self.record(Call::StartCopy(container.to_owned(), blob.to_owned(), source));
        Ok(CopyState::Pending)
    }

    async fn copy_state(&self, container: &str, blob: &str) -> azure_core::Result<CopyState> {
        self.record(Call::CopyState(container.to_owned(), blob.to_owned()));
        Ok(self
            .states
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(CopyState::Pending))
    }

    fn blob_url(&self, container: &str, blob: &str) -> azure_core::Result<Url> {
        Url::parse(&format!(
            "https://dst.blob.core.windows.net/{container}/{blob}"
        ))
        .map_err(|error| Error::new(ErrorKind::DataConversion, error))
    }
}

fn request(wait: Option<PollPolicy>) -> CopyRequest {
    CopyRequest {
        source: BlobLocator::parse("https://acct.blob.core.windows.net/vhds/disk.vhd").unwrap(),
        destination_container: "copied".to_owned(),
        destination_blob: "copy.vhd".to_owned(),
        wait,
    }
}

fn policy(timeout_secs: u64) -> PollPolicy {
    PollPolicy::new(Duration::from_secs(30), Duration::from_secs(timeout_secs))
}

#[tokio::test(start_paused = true)]
async fn without_wait_reports_started_and_never_polls() {
    let backend = FakeBackend::default();

    let outcome = copy_blob(&backend, &request(None)).await.unwrap();

    assert_eq!(outcome.progress, CopyProgress::Started);
    assert_eq!(
        outcome.to_value(),
        serde_json::json!({
            "changed": true,
            "status": "started",
            "destination_uri": "https://dst.blob.core.windows.net/copied/copy.vhd",
        })
    );

    let signed = Url::parse("https://acct.blob.core.windows.net/vhds/disk.vhd?sp=r&sig=fake").unwrap();
    assert_eq!(
        backend.calls(),
        vec![
            Call::Sign(BlobLocator::new("acct", "vhds", "disk.vhd")),
            Call::EnsureContainer("copied".to_owned()),
            Call::StartCopy("copied".to_owned(), "copy.vhd".to_owned(), signed),
        ]
    );
}

#[tokio::test]
async fn source_signature_expires_in_an_hour() {
    let backend = FakeBackend::default();
    let before = OffsetDateTime::now_utc();

    copy_blob(&backend, &request(None)).await.unwrap();

    let expiry = backend.expiries.lock().unwrap()[0];
    let ttl = expiry - before;
    assert!(ttl >= time::Duration::minutes(59), "{ttl}");
    assert!(ttl <= time::Duration::minutes(61), "{ttl}");
}

#[tokio::test(start_paused = true)]
async fn wait_completes_on_first_success_without_sleeping() {
    let backend = FakeBackend::with_states([CopyState::Success]);
    let started = Instant::now();

    let outcome = copy_blob(&backend, &request(Some(policy(100)))).await.unwrap();

    assert_eq!(outcome.progress, CopyProgress::Completed);
    assert_eq!(outcome.to_value()["status"], "completed");
    assert_eq!(backend.probes(), 1);
    assert_eq!(started.elapsed().as_secs(), 0);
}

#[tokio::test(start_paused = true)]
async fn wait_keeps_polling_until_success() {
    let backend = FakeBackend::with_states([
        CopyState::Pending,
        CopyState::Unknown,
        CopyState::Failed,
        CopyState::Success,
    ]);
    let started = Instant::now();

    let outcome = copy_blob(&backend, &request(Some(policy(10_000))))
        .await
        .unwrap();

    assert_eq!(outcome.progress, CopyProgress::Completed);
    assert_eq!(backend.probes(), 4);
    assert_eq!(started.elapsed().as_secs(), 90);
}

#[tokio::test(start_paused = true)]
async fn wait_times_out_after_fourth_poll_for_timeout_100() {
    let backend = FakeBackend::default();

    let error = copy_blob(&backend, &request(Some(policy(100))))
        .await
        .unwrap_err();

    assert_eq!(
        error.to_string(),
        "Timed out waiting for async copy to complete."
    );
    assert_eq!(backend.probes(), 4);
}

#[tokio::test(start_paused = true)]
async fn backend_errors_stop_the_procedure() {
    let backend = FakeBackend {
        fail_ensure: true,
        ..Default::default()
    };

    let error = copy_blob(&backend, &request(Some(policy(100))))
        .await
        .unwrap_err();

    assert_eq!(error.kind(), &ErrorKind::Credential);
    assert!(!backend
        .calls()
        .iter()
        .any(|call| matches!(call, Call::StartCopy(..) | Call::CopyState(..))));
}

#[tokio::test]
async fn module_rejects_missing_arguments_before_any_call() {
    let args = azure_automation::module::ModuleArgs::from_value(serde_json::json!({
        "source_uri": "https://acct.blob.core.windows.net/vhds/disk.vhd",
    }))
    .unwrap();

    let error = azure_copy_blob::run_module(args).await.unwrap_err();
    assert_eq!(
        error.to_string(),
        "missing required arguments: source_key, destination_account, destination_key, destination_container, destination_blob"
    );
}

#[tokio::test]
async fn module_rejects_foreign_source_uri() {
    let args = azure_automation::module::ModuleArgs::from_value(serde_json::json!({
        "source_uri": "https://example.com/vhds/disk.vhd",
        "source_key": "a2V5",
        "destination_account": "dst",
        "destination_key": "a2V5",
        "destination_container": "copied",
        "destination_blob": "copy.vhd",
    }))
    .unwrap();

    let error = azure_copy_blob::run_module(args).await.unwrap_err();
    assert_eq!(error.kind(), &ErrorKind::DataConversion);
}
