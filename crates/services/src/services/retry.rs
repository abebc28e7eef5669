//! Flat-delay retry for best-effort operations that signal failure with `None`.

use std::{future::Future, sync::Arc, time::Duration};

use backon::{BackoffBuilder, ConstantBuilder};
use futures::{FutureExt, future::BoxFuture};
use tracing::debug;

/// Async sleep used between attempts.
pub type Sleeper = Arc<dyn Fn(Duration) -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    sleeper: Sleeper,
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("delay", &self.delay)
            .finish()
    }
}

impl RetryPolicy {
    /// `max_attempts` counts the first call; values below 1 are raised to 1.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            sleeper: Arc::new(|dur: Duration| tokio::time::sleep(dur).boxed()),
        }
    }

    pub fn with_sleeper<F>(mut self, sleeper: F) -> Self
    where
        F: Fn(Duration) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        self.sleeper = Arc::new(sleeper);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Calls `operation` until it yields `Some`, waiting `delay` between attempts.
    /// Returns `None` once `max_attempts` calls have all come back empty.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        let mut delays = ConstantBuilder::default()
            .with_delay(self.delay)
            .with_max_times((self.max_attempts - 1) as usize)
            .build();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            if let Some(value) = operation().await {
                return Some(value);
            }
            let dur = delays.next()?;
            debug!(
                attempt,
                max_attempts = self.max_attempts,
                delay_ms = dur.as_millis() as u64,
                "Attempt produced no result, retrying"
            );
            (self.sleeper)(dur).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicU32, Ordering},
    };

    use super::*;

    fn recording_policy(max_attempts: u32, delay: Duration) -> (RetryPolicy, Arc<Mutex<Vec<Duration>>>) {
        let waits = Arc::new(Mutex::new(Vec::new()));
        let recorder = waits.clone();
        let policy = RetryPolicy::new(max_attempts, delay).with_sleeper(move |dur| {
            recorder.lock().unwrap().push(dur);
            async {}.boxed()
        });
        (policy, waits)
    }

    #[tokio::test]
    async fn returns_first_success_without_waiting() {
        let (policy, waits) = recording_policy(3, Duration::from_millis(2000));
        let calls = AtomicU32::new(0);

        let result = policy
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Some("ok") }
            })
            .await;

        assert_eq!(result, Some("ok"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(waits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn succeeds_on_third_attempt_after_two_flat_waits() {
        let (policy, waits) = recording_policy(3, Duration::from_millis(2000));
        let calls = AtomicU32::new(0);

        let result = policy
            .run(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move { (n >= 3).then_some(n) }
            })
            .await;

        assert_eq!(result, Some(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            *waits.lock().unwrap(),
            vec![Duration::from_millis(2000), Duration::from_millis(2000)]
        );
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let (policy, waits) = recording_policy(4, Duration::from_millis(5));
        let calls = AtomicU32::new(0);

        let result: Option<()> = policy
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { None }
            })
            .await;

        assert_eq!(result, None);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(waits.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn zero_attempts_still_calls_once() {
        let (policy, _) = recording_policy(0, Duration::ZERO);
        assert_eq!(policy.max_attempts(), 1);
        let calls = AtomicU32::new(0);

        let result: Option<()> = policy
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { None }
            })
            .await;

        assert_eq!(result, None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
