mod builder;

pub use builder::*;

use core::{cmp::Ordering, fmt};
use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use tracing::{error, warn};

use crate::{
    error::{Error, Result},
    time::{Clock, SystemClock},
    worker::WorkerIdSource,
};

/// Default width of the time field: 41 bits of milliseconds past the epoch,
/// roughly 69 years of range.
pub const DEFAULT_BIT_LEN_TIME: u8 = 41;

/// Default width of the per-millisecond sequence field.
pub const DEFAULT_BIT_LEN_SEQUENCE: u8 = 10;

/// Default width of the worker-ID field. The three widths sum to 63 so the
/// top bit of the `i64` stays clear and IDs remain non-negative.
pub const DEFAULT_BIT_LEN_WORKER_ID: u8 =
    63 - DEFAULT_BIT_LEN_TIME - DEFAULT_BIT_LEN_SEQUENCE;

/// How long a call stalls when the clock is observed running backwards.
const ROLLBACK_GRACE: Duration = Duration::from_secs(1);

pub(crate) struct State {
    pub(crate) epoch: i64,
    pub(crate) bit_len_time: u8,
    pub(crate) bit_len_worker_id: u8,
    pub(crate) bit_len_sequence: u8,
    pub(crate) sequence_mask: i64,
    pub(crate) non_increasing: bool,
    pub(crate) source: Box<dyn WorkerIdSource + Send + Sync>,
    pub(crate) worker_id: i64,

    // Snapshot of the most recently produced ID.
    pub(crate) last_time: i64,
    pub(crate) time: i64,
    pub(crate) sequence: i64,
}

impl State {
    fn pack(&self) -> i64 {
        let shift_time = self.bit_len_worker_id + self.bit_len_sequence;
        if self.non_increasing {
            self.time << shift_time | self.sequence << self.bit_len_worker_id | self.worker_id
        } else {
            self.time << shift_time | self.worker_id << self.bit_len_sequence | self.sequence
        }
    }
}

/// A lock-based snowflake ID generator.
///
/// One instance per process is typical. State lives behind an
/// [`Arc<Mutex<_>>`], so the generator is cheap to clone and safe to share
/// across threads; every call to [`next_id`]/[`try_next_id`] serializes on
/// the same lock, making ID production linearizable.
///
/// An ID packs three fields, widths configurable via [`Builder`]:
///
/// ```text
/// 0 | time (41) | worker id (12) | sequence (10) |     increasing layout
/// 0 | time (41) | sequence (10) | worker id (12) | non-increasing layout
/// ```
///
/// The non-increasing layout keeps per-millisecond uniqueness but gives up
/// strict numeric ordering of IDs produced by different workers.
///
/// # Example
///
/// ```
/// use floeid::SnowflakeGenerator;
///
/// let generator = SnowflakeGenerator::builder()
///     .worker_id_source(|| Ok(1))
///     .build()
///     .unwrap();
///
/// let a = generator.next_id();
/// let b = generator.next_id();
/// assert!(b > a);
/// ```
///
/// [`next_id`]: Self::next_id
/// [`try_next_id`]: Self::try_next_id
#[derive(Clone)]
pub struct SnowflakeGenerator<C = SystemClock>
where
    C: Clock,
{
    state: Arc<Mutex<State>>,
    clock: C,
}

impl SnowflakeGenerator<SystemClock> {
    /// Creates a generator with the default configuration: the wall clock,
    /// the default epoch and bit lengths, and the worker ID derived from
    /// the local IPv4 address.
    ///
    /// # Errors
    ///
    /// Fails when the worker-ID source does, e.g. on a host without a
    /// non-loopback IPv4 address.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Starts a [`Builder`] holding the default configuration.
    pub fn builder() -> Builder<SystemClock> {
        Builder::new()
    }
}

impl<C> SnowflakeGenerator<C>
where
    C: Clock,
{
    pub(crate) fn from_state(state: State, clock: C) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            clock,
        }
    }

    /// Produces the next ID, mapping failure to the sentinel `0`.
    ///
    /// Clock rollback beyond the grace period is logged and reported as
    /// `0`. Callers that must distinguish that case should prefer
    /// [`Self::try_next_id`]: `0` is also a legitimate encoding when the
    /// time field, worker ID, and sequence are all zero.
    pub fn next_id(&self) -> i64 {
        match self.try_next_id() {
            Ok(id) => id,
            Err(e) => {
                error!(error = %e, "id generation failed, returning sentinel 0");
                0
            }
        }
    }

    /// Produces the next ID.
    ///
    /// When the sequence space for the current millisecond is exhausted,
    /// the call busy-waits until the clock advances. When the clock is
    /// observed running backwards, the call sleeps for one second while
    /// still holding the lock, stalling every concurrent caller, then
    /// re-evaluates once. No timestamp already handed out is ever reused.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockMovedBackwards`] when the clock still reads
    /// earlier than the last issued timestamp after the grace stall.
    pub fn try_next_id(&self) -> Result<i64> {
        let mut state = self.state.lock();
        let mut now = self.clock.now_millis();

        match state.last_time.cmp(&now) {
            Ordering::Less => {
                state.last_time = now;
                state.sequence = 0;
            }
            Ordering::Equal => now = self.advance_sequence(&mut state, now),
            Ordering::Greater => {
                warn!(
                    now_ms = now,
                    last_ms = state.last_time,
                    "clock moved backwards, stalling"
                );
                self.clock.sleep(ROLLBACK_GRACE);

                now = self.clock.now_millis();
                match state.last_time.cmp(&now) {
                    Ordering::Less => {
                        state.last_time = now;
                        state.sequence = 0;
                    }
                    Ordering::Equal => now = self.advance_sequence(&mut state, now),
                    Ordering::Greater => {
                        return Err(Error::ClockMovedBackwards {
                            now_ms: now,
                            last_ms: state.last_time,
                        });
                    }
                }
            }
        }

        state.time = now - state.epoch;
        Ok(state.pack())
    }

    /// Bumps the sequence within the current millisecond. A wrap to zero
    /// means the sequence space is exhausted: the clock is re-read until it
    /// advances, and the fresh reading becomes both the new `last_time` and
    /// the emitted time field.
    fn advance_sequence(&self, state: &mut State, now: i64) -> i64 {
        state.sequence = (state.sequence + 1) & state.sequence_mask;
        if state.sequence != 0 {
            return now;
        }

        let mut fresh = self.clock.now_millis();
        while fresh <= state.last_time {
            core::hint::spin_loop();
            fresh = self.clock.now_millis();
        }
        state.last_time = fresh;
        fresh
    }

    /// Time field of the most recently produced ID, in milliseconds past
    /// the epoch.
    pub fn time(&self) -> i64 {
        self.state.lock().time
    }

    /// Worker ID resolved at construction.
    pub fn worker_id(&self) -> i64 {
        self.state.lock().worker_id
    }

    /// Sequence field of the most recently produced ID.
    pub fn sequence(&self) -> i64 {
        self.state.lock().sequence
    }

    /// Configured epoch, in milliseconds since the Unix epoch.
    pub fn epoch(&self) -> i64 {
        self.state.lock().epoch
    }

    /// Configured width of the time field.
    pub fn bit_len_time(&self) -> u8 {
        self.state.lock().bit_len_time
    }

    /// Configured width of the worker-ID field.
    pub fn bit_len_worker_id(&self) -> u8 {
        self.state.lock().bit_len_worker_id
    }

    /// Configured width of the sequence field.
    pub fn bit_len_sequence(&self) -> u8 {
        self.state.lock().bit_len_sequence
    }

    /// Mask covering the sequence field, `(1 << bit_len_sequence) - 1`.
    pub fn sequence_mask(&self) -> i64 {
        self.state.lock().sequence_mask
    }

    /// Timestamp of the last issue, in milliseconds since the Unix epoch.
    pub fn last_time(&self) -> i64 {
        self.state.lock().last_time
    }

    /// Whether the non-increasing layout is active.
    pub fn non_increasing(&self) -> bool {
        self.state.lock().non_increasing
    }

    /// Replaces the epoch.
    ///
    /// Reconfiguring a generator that has already produced IDs shifts the
    /// emitted time field; doing so safely is the caller's responsibility.
    pub fn set_epoch(&self, epoch_millis: i64) {
        self.state.lock().epoch = epoch_millis;
    }

    /// Replaces the three field widths and recomputes the sequence mask.
    ///
    /// Unlike [`Builder::build`], this performs no validation; widths that
    /// overflow 63 bits silently corrupt adjacent fields.
    pub fn set_bit_lengths(&self, time: u8, worker_id: u8, sequence: u8) {
        let mut state = self.state.lock();
        state.bit_len_time = time;
        state.bit_len_worker_id = worker_id;
        state.bit_len_sequence = sequence;
        state.sequence_mask = ((1u64 << sequence) - 1) as i64;
    }

    /// Switches between the increasing and non-increasing layouts.
    pub fn set_non_increasing(&self, non_increasing: bool) {
        self.state.lock().non_increasing = non_increasing;
    }

    /// Replaces the worker-ID source.
    ///
    /// The worker ID already resolved at construction is kept; the new
    /// source is not invoked.
    pub fn set_worker_id_source(&self, source: impl WorkerIdSource + Send + Sync + 'static) {
        self.state.lock().source = Box::new(source);
    }

    /// Overwrites the last-issue timestamp, e.g. when restoring an
    /// externally snapshotted generator.
    pub fn set_last_time(&self, last_time_millis: i64) {
        self.state.lock().last_time = last_time_millis;
    }
}

impl<C> fmt::Display for SnowflakeGenerator<C>
where
    C: Clock,
{
    /// Renders the most recently produced ID's fields.
    ///
    /// The `workd_id` key is emitted verbatim for compatibility with
    /// existing consumers of this format.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        write!(
            f,
            r#"{{"time":"{}","workd_id":"{}","sequenceID":"{}"}}"#,
            state.time, state.worker_id, state.sequence
        )
    }
}

impl<C> fmt::Debug for SnowflakeGenerator<C>
where
    C: Clock,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SnowflakeGenerator")
            .field("epoch", &state.epoch)
            .field("bit_len_time", &state.bit_len_time)
            .field("bit_len_worker_id", &state.bit_len_worker_id)
            .field("bit_len_sequence", &state.bit_len_sequence)
            .field("non_increasing", &state.non_increasing)
            .field("worker_id", &state.worker_id)
            .field("last_time", &state.last_time)
            .field("time", &state.time)
            .field("sequence", &state.sequence)
            .finish_non_exhaustive()
    }
}
