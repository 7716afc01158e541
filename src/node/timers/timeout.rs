use crate::node::timers::Clock;
use std::future::Future;
use tokio::time::Duration;

#[derive(Debug, thiserror::Error)]
#[error("Timed out after {0:?}")]
pub(crate) struct TimedOut(pub(crate) Duration);

/// Run `future` until it completes or `duration` passes on `clock`, whichever comes first. On
/// timeout the future is dropped, cancelling whatever it was waiting on.
pub(crate) async fn timeout<C, F>(clock: &C, duration: Duration, future: F) -> Result<F::Output, TimedOut>
where
    C: Clock,
    F: Future,
{
    let mut clock = clock.clone();

    tokio::select! {
        output = future => Ok(output),
        _ = clock.sleep(duration) => Err(TimedOut(duration)),
    }
}
