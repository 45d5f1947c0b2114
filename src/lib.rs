//! # ferroarea
//!
//! Left Riemann sums computed by a group of cooperating MPI processes, each
//! running a team of threads.
//!
//! The crate provides:
//! - Deterministic partitioning of rectangles across ranks and threads
//! - Per-thread accumulation on a [`rayon`] thread pool
//! - Reduction of the partial sums to rank 0 over MPI
//! - Thread count configuration from the environment
//!
//! ## Quick Start
//!
//! ```no_run
//! use ferroarea::{IntegrationDomain, Universe, area, square};
//!
//! fn main() -> Result<(), ferroarea::Error> {
//!     let mut universe = Universe::init()?;
//!     let threads = universe.num_threads();
//!     let domain = IntegrationDomain::new(0.0, 10.0);
//!
//!     let outcome = area::integrate(universe.world(), &domain, 1_000, threads, &square)?;
//!     if let Some(report) = outcome {
//!         println!("{:.6}", report.area);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Launching
//!
//! The process count is whatever the MPI launcher started:
//!
//! ```text
//! AREA_NUM_THREADS=2 mpiexec -n 4 area -n 100000
//! ```
//!
//! A binary started without a launcher runs as a world of one. See [`env`]
//! for the variables that set the thread count.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]

pub mod accumulate;
pub mod area;
mod comm;
pub mod env;
mod error;
pub mod partition;
pub mod rectangle;
pub mod reduce;

pub use comm::{COORDINATOR, Communicator};
pub use error::{Error, Result};
pub use partition::{IntegrationDomain, PartitionSpec, ProcessShare, ThreadShare};
pub use rectangle::{Integrand, Rectangle, square};

use std::sync::mpsc;

use mpi::Threading;
use mpi::collective::SystemOperation;
use tracing::{debug, warn};

use crate::comm::Link;

/// Reduction operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOp {
    /// Sum of values
    Sum,
    /// Maximum value
    Max,
    /// Minimum value
    Min,
}

impl ReduceOp {
    /// Combine two values.
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            ReduceOp::Sum => a + b,
            ReduceOp::Max => a.max(b),
            ReduceOp::Min => a.min(b),
        }
    }

    /// Value that leaves any other value unchanged under [`apply`](Self::apply).
    pub fn identity(self) -> f64 {
        match self {
            ReduceOp::Sum => 0.0,
            ReduceOp::Max => f64::NEG_INFINITY,
            ReduceOp::Min => f64::INFINITY,
        }
    }

    /// The MPI operation with the same meaning.
    pub(crate) fn system_op(self) -> SystemOperation {
        match self {
            ReduceOp::Sum => SystemOperation::sum(),
            ReduceOp::Max => SystemOperation::max(),
            ReduceOp::Min => SystemOperation::min(),
        }
    }
}

/// Process world handle.
///
/// Owns the MPI environment: MPI is finalized when this is dropped, and it
/// cannot be initialized again afterwards in the same process.
///
/// # Example
///
/// ```no_run
/// use ferroarea::Universe;
///
/// let universe = Universe::init().expect("failed to start the process world");
/// println!("rank {} of {}", universe.rank(), universe.size());
/// ```
pub struct Universe {
    world: Communicator,
    num_threads: usize,
    // dropped last: finalizes MPI
    _mpi: mpi::environment::Universe,
}

impl Universe {
    /// Initialize MPI with funneled threading and read the thread count.
    ///
    /// Only the calling thread talks to MPI; the accumulation threads never
    /// do.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEnv`] or [`Error::InvalidCount`] for a bad
    /// thread count and [`Error::AlreadyInitialized`] if MPI is already
    /// initialized in this process.
    pub fn init() -> Result<Self> {
        let num_threads = env::thread_count()?;
        let (universe, threading) = mpi::initialize_with_threading(Threading::Funneled)
            .ok_or(Error::AlreadyInitialized)?;
        if matches!(threading, Threading::Single) {
            warn!("MPI only provides single threading; continuing with funneled use");
        }

        let world = Communicator::from_mpi(universe.world());
        debug!(
            rank = world.rank(),
            size = world.size(),
            threads = num_threads,
            "process world ready"
        );
        Ok(Universe {
            world,
            num_threads,
            _mpi: universe,
        })
    }

    /// Build a world of `size` ranks inside this process.
    ///
    /// Returns one communicator per rank, indexed by rank. Each is meant to
    /// be moved to its own thread. This does not count as initializing the
    /// process world.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCount`] if `size` is zero.
    pub fn local(size: usize) -> Result<Vec<Communicator>> {
        let size = Error::check_count(size, "process count")?;
        let (senders, receivers): (Vec<_>, Vec<_>) = (1..size).map(|_| mpsc::channel()).unzip();

        let mut comms = Vec::with_capacity(size);
        comms.push(Communicator::new(0, size, Link::Root(receivers)));
        for (rank, tx) in (1..size).zip(senders) {
            comms.push(Communicator::new(rank, size, Link::Leaf(tx)));
        }
        Ok(comms)
    }

    /// Get this process's communicator.
    pub fn world(&mut self) -> &mut Communicator {
        &mut self.world
    }

    /// Rank of this process.
    pub fn rank(&self) -> usize {
        self.world.rank()
    }

    /// Number of processes in the world.
    pub fn size(&self) -> usize {
        self.world.size()
    }

    /// Threads this process should run its accumulation with.
    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Shut the world down, finalizing MPI.
    ///
    /// Equivalent to dropping the handle.
    pub fn finalize(self) {
        debug!(rank = self.rank(), "finalizing process world");
    }
}
