//! Keeps the request listener alive for the lifetime of the process

use std::future::Future;

use tokio::time::{sleep, Duration};
use tracing::{error, warn};

/// Delay before the n-th restart: `unit * 2^n`, capped at `max`.
#[derive(Debug, Clone, Copy)]
pub struct RestartBackoff {
    pub unit: Duration,
    pub max: Duration,
}

impl Default for RestartBackoff {
    fn default() -> Self {
        Self {
            unit: Duration::from_secs(1),
            max: Duration::from_secs(30),
        }
    }
}

impl RestartBackoff {
    pub fn delay(&self, restart_count: u32) -> Duration {
        self.unit
            .saturating_mul(2u32.saturating_pow(restart_count.min(5)))
            .min(self.max)
    }
}

/// Runs `make_listener` in its own task and starts a new one whenever the
/// previous one returns or panics. Never returns.
pub async fn supervise<F, Fut>(mut make_listener: F, backoff: RestartBackoff)
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut restart_count: u32 = 0;
    loop {
        match tokio::spawn(make_listener()).await {
            Ok(()) => warn!("oracle request subscription closed; resubscribing"),
            Err(join_error) => {
                if join_error.is_panic() {
                    error!("request listener panicked; restarting");
                } else {
                    error!(error = %join_error, "request listener task failed; restarting");
                }
            }
        }

        restart_count = restart_count.saturating_add(1);
        let delay = backoff.delay(restart_count);
        warn!(
            restart_count,
            backoff_ms = delay.as_millis() as u64,
            "request listener restart backoff"
        );
        sleep(delay).await;
    }
}
