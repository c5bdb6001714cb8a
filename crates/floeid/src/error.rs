//! Error types for generator construction and ID production.

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Unified error type for `floeid`.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The default worker-ID source found no usable address.
    #[error("no non-loopback IPv4 address available")]
    NoIpv4Address,

    /// Probing the local network configuration failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A caller-supplied worker-ID source failed.
    #[error("worker id source failed: {reason}")]
    WorkerIdSource { reason: String },

    /// The configured field widths cannot be packed into a non-negative
    /// `i64`.
    #[error("bit lengths exceed 63 bits: time={time} worker={worker} sequence={sequence}")]
    InvalidBitLengths { time: u8, worker: u8, sequence: u8 },

    /// The resolved worker ID does not fit the configured field width.
    #[error("worker id {worker_id} does not fit in {bits} bits")]
    WorkerIdOutOfRange { worker_id: i64, bits: u8 },

    /// The clock was still behind the last issued timestamp after the
    /// rollback grace period.
    #[error("clock moved backwards: now={now_ms}ms last={last_ms}ms")]
    ClockMovedBackwards { now_ms: i64, last_ms: i64 },
}
