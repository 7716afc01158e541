mod stop_signal;
mod time;
mod timeout;

pub(crate) use stop_signal::new as stop_signal;
pub(crate) use stop_signal::StopCheck;
pub(crate) use stop_signal::Stopper;
#[cfg(test)]
pub(crate) use time::mocked_clock;
pub(crate) use time::Clock;
#[cfg(test)]
pub(crate) use time::MockClock;
#[cfg(test)]
pub(crate) use time::MockClockController;
pub(crate) use time::RealClock;
pub(crate) use timeout::timeout;
pub(crate) use timeout::TimedOut;
