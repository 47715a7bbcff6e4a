//! Polling until a condition is met or a deadline elapses

use std::{future::Future, time::Duration};

use tokio::time::{self, Instant};
use tracing::debug;

use crate::{error::Error, settings::Poll};

/// Reason why a poll loop ended without result
#[derive(Debug)]
pub enum WaitError {
    /// The deadline elapsed before the condition was met.
    TimedOut,
    /// The condition failed; it was not evaluated again.
    Failed(Error),
}

/// Evaluates `probe` until it returns a value.
///
/// The probe is evaluated immediately and then every `poll.interval`
/// until
///
/// - it returns `Ok(Some(value))` which is passed on,
/// - it returns an error which aborts the loop, or
/// - `poll.timeout` elapsed.
///
/// The probe is evaluated at least once, also with a zero timeout. A
/// transient lookup failure should be mapped to `Ok(None)` by the probe
/// so that only unrecoverable errors end the loop early.
pub async fn wait_for<T, F, Fut>(poll: Poll, mut probe: F) -> Result<T, WaitError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, Error>>,
{
    let deadline = deadline_after(poll.timeout);
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        if let Some(value) = probe().await.map_err(WaitError::Failed)? {
            return Ok(value);
        }

        let now = Instant::now();
        if now >= deadline {
            debug!(attempt, timeout = ?poll.timeout, "Condition not met before the deadline");
            return Err(WaitError::TimedOut);
        }

        debug!(attempt, "Condition not met yet");
        time::sleep(poll.interval.min(deadline - now)).await;
    }
}

/// Returns the instant at which a poll loop started now ends.
///
/// Timeouts beyond the range of [`Instant`] are capped at thirty years.
fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        .unwrap_or_else(|| now + Duration::from_secs(86_400 * 365 * 30))
}

/// Evaluates `condition` until it returns true.
///
/// See [`wait_for`] for the semantics.
pub async fn wait_until<F, Fut>(poll: Poll, mut condition: F) -> Result<(), WaitError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, Error>>,
{
    let probe = || {
        let evaluation = condition();
        async move { evaluation.await.map(|done| if done { Some(()) } else { None }) }
    };
    wait_for(poll, probe).await
}
