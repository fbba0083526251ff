use azure_core::error::{Error, ErrorKind};
use std::future::Future;
use std::time::Duration;

/// How often to re-check a remote condition and how long to keep trying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollPolicy {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

/// Calls `probe` until it reports `true`, sleeping `policy.interval` between
/// calls, and returns the number of probes made.
///
/// The wait is accounted in whole intervals rather than wall-clock time: each
/// unsuccessful probe adds one interval, and once the total exceeds
/// `policy.timeout` the poll fails with `Timed out waiting for {what} to
/// complete.` without sleeping again. A probe error ends the poll at once.
pub async fn poll_until<F, Fut>(
    policy: PollPolicy,
    what: &str,
    mut probe: F,
) -> azure_core::Result<usize>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = azure_core::Result<bool>>,
{
    let mut waited = Duration::ZERO;
    let mut attempts = 0;

    loop {
        attempts += 1;
        if probe().await? {
            debug!("{what} completed after {attempts} probe(s)");
            return Ok(attempts);
        }

        waited += policy.interval;
        if waited > policy.timeout {
            return Err(Error::with_message(ErrorKind::Other, || {
                format!("Timed out waiting for {what} to complete.")
            }));
        }

        trace!(
            "{what} not complete after probe {attempts}, waiting {:?} ({waited:?} of {:?})",
            policy.interval,
            policy.timeout
        );
        tokio::time::sleep(policy.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    const INTERVAL: Duration = Duration::from_secs(30);

    #[tokio::test(start_paused = true)]
    async fn immediate_success_never_sleeps() {
        let started = Instant::now();
        let attempts = poll_until(
            PollPolicy::new(INTERVAL, Duration::from_secs(100)),
            "async copy",
            || async { Ok(true) },
        )
        .await
        .unwrap();

        assert_eq!(attempts, 1);
        assert_eq!(started.elapsed().as_secs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_once_accumulated_wait_exceeds_timeout() {
        let probes = AtomicUsize::new(0);
        let started = Instant::now();

        let error = poll_until(
            PollPolicy::new(INTERVAL, Duration::from_secs(100)),
            "async copy",
            || {
                probes.fetch_add(1, Ordering::SeqCst);
                async { Ok(false) }
            },
        )
        .await
        .unwrap_err();

        // 30, 60, 90 are within the timeout; the fourth miss reaches 120.
        assert_eq!(probes.load(Ordering::SeqCst), 4);
        assert_eq!(started.elapsed().as_secs(), 90);
        assert_eq!(error.kind(), &ErrorKind::Other);
        assert_eq!(
            error.to_string(),
            "Timed out waiting for async copy to complete."
        );
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_equal_to_accumulated_wait_keeps_polling() {
        let probes = AtomicUsize::new(0);

        let attempts = poll_until(
            PollPolicy::new(INTERVAL, Duration::from_secs(60)),
            "async copy",
            || {
                let seen = probes.fetch_add(1, Ordering::SeqCst);
                async move { Ok(seen == 2) }
            },
        )
        .await
        .unwrap();

        assert_eq!(attempts, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn probe_errors_stop_polling() {
        let probes = AtomicUsize::new(0);

        let error = poll_until(
            PollPolicy::new(INTERVAL, Duration::from_secs(1000)),
            "async copy",
            || {
                probes.fetch_add(1, Ordering::SeqCst);
                async { Err(Error::message(ErrorKind::Io, "connection reset")) }
            },
        )
        .await
        .unwrap_err();

        assert_eq!(probes.load(Ordering::SeqCst), 1);
        assert_eq!(error.kind(), &ErrorKind::Io);
    }
}
