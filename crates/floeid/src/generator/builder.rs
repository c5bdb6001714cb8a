use crate::{
    error::{Error, Result},
    generator::{
        DEFAULT_BIT_LEN_SEQUENCE, DEFAULT_BIT_LEN_TIME, DEFAULT_BIT_LEN_WORKER_ID,
        SnowflakeGenerator, State,
    },
    time::{Clock, DEFAULT_EPOCH, SystemClock},
    worker::{LocalIpWorkerId, WorkerIdSource},
};

/// Configures and constructs a [`SnowflakeGenerator`].
///
/// Every setter overrides a field of the default configuration; when the
/// same field is set twice, the later call wins.
///
/// # Example
///
/// ```
/// use floeid::SnowflakeGenerator;
///
/// let generator = SnowflakeGenerator::builder()
///     .epoch(1_577_808_000_000)
///     .worker_id_source(|| Ok(5))
///     .build()?;
/// assert_eq!(generator.worker_id(), 5);
/// # Ok::<(), floeid::Error>(())
/// ```
pub struct Builder<C = SystemClock>
where
    C: Clock,
{
    epoch: i64,
    bit_len_time: u8,
    bit_len_worker_id: u8,
    bit_len_sequence: u8,
    non_increasing: bool,
    source: Box<dyn WorkerIdSource + Send + Sync>,
    clock: C,
}

impl Builder<SystemClock> {
    pub(crate) fn new() -> Self {
        Self {
            epoch: DEFAULT_EPOCH,
            bit_len_time: DEFAULT_BIT_LEN_TIME,
            bit_len_worker_id: DEFAULT_BIT_LEN_WORKER_ID,
            bit_len_sequence: DEFAULT_BIT_LEN_SEQUENCE,
            non_increasing: false,
            source: Box::new(LocalIpWorkerId),
            clock: SystemClock,
        }
    }
}

impl<C> Builder<C>
where
    C: Clock,
{
    /// Overrides the reference instant, in milliseconds since the Unix
    /// epoch.
    pub fn epoch(mut self, epoch_millis: i64) -> Self {
        self.epoch = epoch_millis;
        self
    }

    /// Overrides how the worker ID is resolved at build time.
    pub fn worker_id_source(
        mut self,
        source: impl WorkerIdSource + Send + Sync + 'static,
    ) -> Self {
        self.source = Box::new(source);
        self
    }

    /// Selects the non-increasing layout: worker-ID and sequence fields
    /// swap positions, trading strict numeric ordering across workers for
    /// per-millisecond uniqueness only.
    pub fn non_increasing(mut self) -> Self {
        self.non_increasing = true;
        self
    }

    /// Overrides the three field widths as a set; the sequence mask is
    /// derived from `sequence`. The widths must sum to at most 63.
    pub fn bit_lengths(mut self, time: u8, worker_id: u8, sequence: u8) -> Self {
        self.bit_len_time = time;
        self.bit_len_worker_id = worker_id;
        self.bit_len_sequence = sequence;
        self
    }

    /// Substitutes the time source, e.g. a mocked clock in tests.
    pub fn clock<D>(self, clock: D) -> Builder<D>
    where
        D: Clock,
    {
        Builder {
            epoch: self.epoch,
            bit_len_time: self.bit_len_time,
            bit_len_worker_id: self.bit_len_worker_id,
            bit_len_sequence: self.bit_len_sequence,
            non_increasing: self.non_increasing,
            source: self.source,
            clock,
        }
    }

    /// Validates the configuration, resolves the worker ID, and builds the
    /// generator. The worker-ID source runs exactly once, here.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidBitLengths`] when the widths cannot be packed into
    ///   a non-negative `i64`
    /// - any error from the worker-ID source, unchanged
    /// - [`Error::WorkerIdOutOfRange`] when the resolved worker ID does not
    ///   fit its field
    pub fn build(self) -> Result<SnowflakeGenerator<C>> {
        let total = u32::from(self.bit_len_time)
            + u32::from(self.bit_len_worker_id)
            + u32::from(self.bit_len_sequence);
        if total > 63 {
            return Err(Error::InvalidBitLengths {
                time: self.bit_len_time,
                worker: self.bit_len_worker_id,
                sequence: self.bit_len_sequence,
            });
        }

        let worker_id = self.source.resolve()?;
        let max_worker_id = ((1u64 << self.bit_len_worker_id) - 1) as i64;
        if worker_id < 0 || worker_id > max_worker_id {
            return Err(Error::WorkerIdOutOfRange {
                worker_id,
                bits: self.bit_len_worker_id,
            });
        }

        let state = State {
            epoch: self.epoch,
            bit_len_time: self.bit_len_time,
            bit_len_worker_id: self.bit_len_worker_id,
            bit_len_sequence: self.bit_len_sequence,
            sequence_mask: ((1u64 << self.bit_len_sequence) - 1) as i64,
            non_increasing: self.non_increasing,
            source: self.source,
            worker_id,
            last_time: self.epoch,
            time: 0,
            sequence: 0,
        };
        Ok(SnowflakeGenerator::from_state(state, self.clock))
    }
}
