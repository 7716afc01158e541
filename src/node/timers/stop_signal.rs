use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Dropping the Stopper tells every matching StopCheck to stop.
pub(crate) struct Stopper {
    stop_signal: Arc<AtomicBool>,
}

#[derive(Clone)]
pub(crate) struct StopCheck {
    stop_signal: Arc<AtomicBool>,
}

impl Drop for Stopper {
    fn drop(&mut self) {
        self.stop_signal.store(true, Ordering::Release);
    }
}

impl StopCheck {
    pub(crate) fn should_stop(&self) -> bool {
        self.stop_signal.load(Ordering::Acquire)
    }
}

pub(crate) fn new() -> (Stopper, StopCheck) {
    let stop_signal = Arc::new(AtomicBool::new(false));

    let stopper = Stopper {
        stop_signal: stop_signal.clone(),
    };
    let stop_check = StopCheck { stop_signal };

    (stopper, stop_check)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_stopper_is_observed_by_all_checks() {
        let (stopper, check) = new();
        let other_check = check.clone();
        assert!(!check.should_stop());

        drop(stopper);

        assert!(check.should_stop());
        assert!(other_check.should_stop());
    }
}
