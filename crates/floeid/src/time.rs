use std::{
    thread,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

/// Default epoch: Wednesday, January 1, 2020 00:00:00 UTC+8.
pub const DEFAULT_EPOCH: i64 = 1_577_808_000_000;

/// A source of wall-clock time for ID generation.
///
/// This abstraction allows you to plug in the real system clock or a mocked
/// time source in tests. Timestamps are **milliseconds** since the Unix
/// epoch; the generator subtracts its configured epoch itself.
///
/// # Example
///
/// ```
/// use floeid::Clock;
///
/// struct FixedTime;
/// impl Clock for FixedTime {
///     fn now_millis(&self) -> i64 {
///         1234
///     }
/// }
///
/// let time = FixedTime;
/// assert_eq!(time.now_millis(), 1234);
/// ```
pub trait Clock {
    /// Returns the current time in milliseconds since the Unix epoch,
    /// truncated to the millisecond.
    fn now_millis(&self) -> i64;

    /// Blocks the caller for roughly `duration`.
    ///
    /// The generator stalls on this during clock-rollback recovery. Mocked
    /// clocks may override it to advance virtual time instead of sleeping.
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Wall-clock time source backed by [`SystemTime`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("System clock before UNIX_EPOCH")
            .as_millis() as i64
    }
}
