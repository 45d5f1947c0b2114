//! Per-thread accumulation of rectangle areas.
//!
//! Each thread of a process owns a disjoint [`ThreadShare`] and a private
//! running total. Nothing is written to shared memory during the parallel
//! phase; thread totals only meet after the team has been joined.

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::error::Result;
use crate::partition::{ProcessShare, ThreadShare, thread_shares};
use crate::rectangle::{Integrand, Rectangle};

/// A sum of areas computed by one worker before cross-worker reduction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartialSum {
    /// Rank that computed this sum
    pub rank: usize,
    /// Thread within the rank, `None` for a whole-process sum
    pub thread_id: Option<usize>,
    /// Sum of areas
    pub value: f64,
}

/// Sum the areas of the rectangles in `thread`'s range.
pub fn accumulate<F>(share: &ProcessShare, thread: &ThreadShare, f: &F) -> PartialSum
where
    F: Integrand + ?Sized,
{
    let value: f64 = thread
        .range
        .clone()
        .map(|i| Rectangle::evaluate(share.local_left, share.rectangle_width, i, f).area)
        .sum();

    trace!(
        rank = share.rank,
        thread = thread.thread_id,
        rectangles = thread.len(),
        value,
        "thread partial sum"
    );

    PartialSum {
        rank: share.rank,
        thread_id: Some(thread.thread_id),
        value,
    }
}

/// Run the accumulation phase of one process on a team of `thread_count`
/// threads.
///
/// The thread ranges are computed up front on the calling thread. The team
/// lives only for this call and has finished all work when it returns.
/// Partial sums come back in thread order.
///
/// # Errors
///
/// Returns [`Error::ThreadPool`](crate::Error::ThreadPool) if the team
/// cannot be started.
pub fn thread_partials<F>(share: &ProcessShare, thread_count: usize, f: &F) -> Result<Vec<PartialSum>>
where
    F: Integrand + ?Sized,
{
    let shares = thread_shares(share.rectangle_count, thread_count);
    debug!(
        rank = share.rank,
        rectangles = share.rectangle_count,
        threads = shares.len(),
        "starting accumulation phase"
    );

    let pool = ThreadPoolBuilder::new()
        .num_threads(shares.len())
        .thread_name(move |i| format!("area-worker-{i}"))
        .build()?;

    Ok(pool.install(|| {
        shares
            .par_iter()
            .map(|thread| accumulate(share, thread, f))
            .collect()
    }))
}
