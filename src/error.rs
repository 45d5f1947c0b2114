//! Error types for ferroarea

use thiserror::Error;

/// Result type for ferroarea operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for partitioning, launching and reducing
#[derive(Error, Debug)]
pub enum Error {
    /// The process world has already been initialized
    #[error("process world has already been initialized")]
    AlreadyInitialized,

    /// A count that must be at least one was zero
    #[error("invalid {what}: must be at least 1")]
    InvalidCount {
        /// Which count was rejected
        what: &'static str,
    },

    /// A launch environment variable could not be parsed
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv {
        /// Variable name
        var: &'static str,
        /// Raw value found in the environment
        value: String,
    },

    /// A rank joined a collective with a different operation
    #[error("rank {rank} reduced with {found:?} while the coordinator expected {expected:?}")]
    MismatchedOp {
        /// Offending rank
        rank: usize,
        /// Operation the coordinator was running
        expected: crate::ReduceOp,
        /// Operation the rank contributed to
        found: crate::ReduceOp,
    },

    /// A rank terminated before completing the collective
    #[error("rank {rank} failed: {reason}")]
    RankFailed {
        /// Failed rank
        rank: usize,
        /// What was observed
        reason: String,
    },

    /// The per-process thread team could not be built
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    /// Check that a count is non-zero, returning it unchanged.
    pub fn check_count<T>(value: T, what: &'static str) -> Result<T>
    where
        T: PartialEq + Default,
    {
        if value == T::default() {
            Err(Error::InvalidCount { what })
        } else {
            Ok(value)
        }
    }
}
