//! The subprocess execution engine and query result cache.
//!
//! Everything that talks to the external matcher binary lives here: process
//! spawning, line-streaming with early termination, path enumeration, and
//! the bounded/TTL cache that sits in front of repeated queries.

pub mod cache;
pub mod error;
pub mod executor;

pub use cache::{CacheStats, QueryCache};
pub use error::ExecutorError;
pub use executor::{Executor, RunOutput};
