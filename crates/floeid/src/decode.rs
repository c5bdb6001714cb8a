#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::generator::{DEFAULT_BIT_LEN_SEQUENCE, DEFAULT_BIT_LEN_WORKER_ID};

/// The three fields recovered from a packed ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IdParts {
    /// Milliseconds past the generator's epoch.
    pub time: u64,
    /// Worker that produced the ID.
    pub worker_id: u64,
    /// Per-millisecond sequence number.
    pub sequence: u64,
}

/// Splits an ID into its time, worker-ID, and sequence fields.
///
/// Only valid for IDs produced with the **default** bit lengths (41/12/10)
/// and the increasing layout. IDs from a generator configured with custom
/// widths or the non-increasing layout decode to garbage here; mirror that
/// generator's configuration instead.
///
/// # Example
///
/// ```
/// use floeid::decode;
///
/// let id = (5 << 22) | (3 << 10) | 1;
/// let parts = decode(id);
/// assert_eq!(parts.time, 5);
/// assert_eq!(parts.worker_id, 3);
/// assert_eq!(parts.sequence, 1);
/// ```
pub const fn decode(id: u64) -> IdParts {
    const MASK_WORKER_ID: u64 = (1 << DEFAULT_BIT_LEN_WORKER_ID) - 1;
    const MASK_SEQUENCE: u64 = (1 << DEFAULT_BIT_LEN_SEQUENCE) - 1;

    IdParts {
        time: id >> (DEFAULT_BIT_LEN_WORKER_ID + DEFAULT_BIT_LEN_SEQUENCE),
        worker_id: (id >> DEFAULT_BIT_LEN_SEQUENCE) & MASK_WORKER_ID,
        sequence: id & MASK_SEQUENCE,
    }
}
