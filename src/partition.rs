//! Work partitioning across processes and threads.
//!
//! The global rectangle count is split between ranks first and then, inside
//! each rank, between the threads of its team. Both steps are pure functions
//! of their inputs so every process can compute its own share without
//! talking to anyone.
//!
//! # Remainder policy
//!
//! At the process level the last rank absorbs the whole remainder
//! `total_rectangles % process_count`. Every other rank gets exactly
//! `total_rectangles / process_count` rectangles, and the starting offset of
//! each rank is derived from that base count. With `n = 4` and three
//! processes the counts are `[1, 1, 2]`.
//!
//! At the thread level the first `rectangle_count % thread_count` threads get
//! one extra index each.

use std::ops::Range;

use crate::error::{Error, Result};

/// Interval `[left, right]` the integrand is summed over.
///
/// Not validated: an inverted domain has a negative width and produces a
/// negative area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegrationDomain {
    /// Left boundary
    pub left: f64,
    /// Right boundary
    pub right: f64,
}

impl IntegrationDomain {
    /// Create a domain from its boundaries.
    pub fn new(left: f64, right: f64) -> Self {
        IntegrationDomain { left, right }
    }

    /// Signed width `right - left`.
    pub fn width(&self) -> f64 {
        self.right - self.left
    }
}

impl Default for IntegrationDomain {
    fn default() -> Self {
        IntegrationDomain::new(0.0, 10.0)
    }
}

/// Global shape of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionSpec {
    total_rectangles: u64,
    process_count: usize,
    thread_count: usize,
}

impl PartitionSpec {
    /// Create a partition spec.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCount`] if any count is zero.
    pub fn new(total_rectangles: u64, process_count: usize, thread_count: usize) -> Result<Self> {
        Ok(PartitionSpec {
            total_rectangles: Error::check_count(total_rectangles, "rectangle count")?,
            process_count: Error::check_count(process_count, "process count")?,
            thread_count: Error::check_count(thread_count, "thread count")?,
        })
    }

    /// Total number of rectangles across all processes.
    pub fn total_rectangles(&self) -> u64 {
        self.total_rectangles
    }

    /// Number of processes in the world.
    pub fn process_count(&self) -> usize {
        self.process_count
    }

    /// Number of threads per process.
    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    /// Width of every rectangle in `domain`.
    pub fn rectangle_width(&self, domain: &IntegrationDomain) -> f64 {
        domain.width() / self.total_rectangles as f64
    }
}

/// The slice of the domain owned by one rank.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessShare {
    /// Rank owning this share
    pub rank: usize,
    /// Number of rectangles this rank evaluates
    pub rectangle_count: u64,
    /// Left edge of this rank's first rectangle
    pub local_left: f64,
    /// Width of every rectangle
    pub rectangle_width: f64,
}

/// Compute the share of `rank`.
///
/// `rank` must be below `spec.process_count()`.
pub fn process_share(spec: &PartitionSpec, rank: usize, domain: &IntegrationDomain) -> ProcessShare {
    debug_assert!(rank < spec.process_count, "rank {rank} out of range");

    let processes = spec.process_count as u64;
    let rectangle_width = spec.rectangle_width(domain);
    let base = spec.total_rectangles / processes;

    let mut rectangle_count = base;
    if rank == spec.process_count - 1 {
        rectangle_count += spec.total_rectangles % processes;
    }

    ProcessShare {
        rank,
        rectangle_count,
        local_left: domain.left + (rank as u64 * base) as f64 * rectangle_width,
        rectangle_width,
    }
}

/// Contiguous range of local rectangle indices owned by one thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadShare {
    /// Index of the thread within its team
    pub thread_id: usize,
    /// Local indices `[start, end)` this thread evaluates
    pub range: Range<u64>,
}

impl ThreadShare {
    /// Number of indices in this share.
    pub fn len(&self) -> u64 {
        self.range.end - self.range.start
    }

    /// Whether this thread has nothing to do.
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// Split `[0, rectangle_count)` into `thread_count` contiguous ranges.
///
/// Always returns exactly `thread_count` shares, in thread order. Surplus
/// threads get empty ranges.
pub fn thread_shares(rectangle_count: u64, thread_count: usize) -> Vec<ThreadShare> {
    let threads = thread_count.max(1) as u64;
    let base = rectangle_count / threads;
    let extra = rectangle_count % threads;

    let mut start = 0;
    (0..threads)
        .map(|t| {
            let len = base + u64::from(t < extra);
            let share = ThreadShare {
                thread_id: t as usize,
                range: start..start + len,
            };
            start += len;
            share
        })
        .collect()
}
