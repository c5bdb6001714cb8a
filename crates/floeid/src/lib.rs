//! Snowflake-style 64-bit ID generation.
//!
//! A [`SnowflakeGenerator`] packs a millisecond timestamp, a worker ID, and
//! a per-millisecond sequence number into one non-negative `i64`, so IDs
//! are unique across a fleet and ordered in time without request-time
//! coordination. The worker ID comes from a pluggable [`WorkerIdSource`];
//! by default it is derived from the local IPv4 address.
//!
//! ```no_run
//! use floeid::{SnowflakeGenerator, decode};
//!
//! # fn main() -> Result<(), floeid::Error> {
//! let generator = SnowflakeGenerator::new()?;
//! let id = generator.try_next_id()?;
//!
//! let parts = decode(id as u64);
//! assert_eq!(parts.worker_id as i64, generator.worker_id());
//! # Ok(())
//! # }
//! ```

mod decode;
mod error;
mod generator;
mod time;
mod worker;

pub use crate::decode::*;
pub use crate::error::*;
pub use crate::generator::*;
pub use crate::time::*;
pub use crate::worker::*;
