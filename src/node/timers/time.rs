#[cfg(test)]
use tokio::sync::watch;
use tokio::time::{Duration, Instant};

/// Clock is the only source of time for heartbeat probing and liveness deadlines, so tests can
/// swap in a `MockClock` and step time by hand.
#[async_trait::async_trait]
pub(crate) trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> Instant;
    async fn sleep_until(&mut self, deadline: Instant);

    async fn sleep(&mut self, duration: Duration) {
        let deadline = self.now() + duration;
        self.sleep_until(deadline).await;
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct RealClock;

#[async_trait::async_trait]
impl Clock for RealClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep_until(&mut self, deadline: Instant) {
        tokio::time::sleep_until(deadline).await;
    }
}

#[cfg(test)]
pub(crate) fn mocked_clock() -> (MockClock, MockClockController) {
    let now = Instant::now();
    let (tx, rx) = watch::channel(now);

    (
        MockClock { current_time: rx },
        MockClockController {
            current_time: tx,
            time_of_instantiation: now,
        },
    )
}

#[cfg(test)]
#[derive(Clone)]
pub(crate) struct MockClock {
    current_time: watch::Receiver<Instant>,
}

#[cfg(test)]
#[async_trait::async_trait]
impl Clock for MockClock {
    fn now(&self) -> Instant {
        *self.current_time.borrow()
    }

    async fn sleep_until(&mut self, deadline: Instant) {
        while *self.current_time.borrow() < deadline {
            if self.current_time.changed().await.is_err() {
                // Controller is gone, time will never move again.
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(test)]
pub(crate) struct MockClockController {
    current_time: watch::Sender<Instant>,
    time_of_instantiation: Instant,
}

#[cfg(test)]
impl MockClockController {
    pub(crate) fn elapsed_time(&self) -> Duration {
        *self.current_time.borrow() - self.time_of_instantiation
    }

    /// Step at a finer granularity than whatever you want to observe. A sleeper only promises to
    /// wake at or after its deadline, so a large step wakes it late.
    pub(crate) fn advance(&mut self, duration: Duration) {
        let new_now = *self.current_time.borrow() + duration;
        let _ = self.current_time.send(new_now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn mock_sleep_wakes_only_after_deadline() {
        let step = Duration::from_millis(250);
        let (mut clock, mut controller) = mocked_clock();
        let deadline = clock.now() + step * 2;

        let (tx, mut rx) = oneshot::channel();
        tokio::spawn(async move {
            clock.sleep_until(deadline).await;
            let _ = tx.send(());
        });

        controller.advance(step);
        tokio::time::timeout(Duration::from_millis(20), &mut rx)
            .await
            .expect_err("Sleeper woke before its deadline");

        controller.advance(step);
        tokio::time::timeout(Duration::from_secs(5), rx)
            .await
            .expect("Sleeper never woke")
            .unwrap();

        assert_eq!(controller.elapsed_time(), step * 2);
    }
}
