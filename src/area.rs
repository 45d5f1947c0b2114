//! Whole-run orchestration: setup, accumulation, reductions.
//!
//! Every rank runs [`integrate`] with its own communicator. The setup phase
//! (rectangle width, process share, thread ranges) happens once on the
//! calling thread; the thread team is only alive while areas are being
//! summed; the collectives at the end are the only cross-process contact.

use std::time::Instant;

use tracing::{debug, info};

use crate::ReduceOp;
use crate::Universe;
use crate::accumulate::thread_partials;
use crate::comm::Communicator;
use crate::error::{Error, Result};
use crate::partition::{IntegrationDomain, PartitionSpec, process_share};
use crate::rectangle::Integrand;
use crate::reduce;

/// What the coordinator knows after a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunReport {
    /// Approximated area
    pub area: f64,
    /// Shape of the run
    pub spec: PartitionSpec,
    /// Longest accumulation phase over all ranks, in seconds
    pub slowest_rank_secs: f64,
    /// Shortest accumulation phase over all ranks, in seconds
    pub fastest_rank_secs: f64,
}

/// Compute this rank's part of the left Riemann sum of `f` over `domain`
/// and reduce it onto the coordinator.
///
/// All ranks of `comm`'s world must call this with the same arguments.
/// Returns the report on the coordinator and `None` elsewhere.
///
/// # Errors
///
/// Returns [`Error::InvalidCount`] if `total_rectangles` or `threads` is
/// zero, and propagates thread pool and collective failures.
pub fn integrate<F>(
    comm: &mut Communicator,
    domain: &IntegrationDomain,
    total_rectangles: u64,
    threads: usize,
    f: &F,
) -> Result<Option<RunReport>>
where
    F: Integrand + ?Sized,
{
    let spec = PartitionSpec::new(total_rectangles, comm.size(), threads)?;
    let share = process_share(&spec, comm.rank(), domain);
    debug!(
        rank = share.rank,
        rectangles = share.rectangle_count,
        local_left = share.local_left,
        width = share.rectangle_width,
        "process share"
    );

    let started = Instant::now();
    let partials = thread_partials(&share, spec.thread_count(), f)?;
    let process_sum = reduce::combine(share.rank, &partials);
    let elapsed = started.elapsed().as_secs_f64();

    let total = reduce::reduce_to_coordinator(comm, &process_sum)?;
    let slowest = comm.reduce_scalar(elapsed, ReduceOp::Max)?;
    let fastest = comm.reduce_scalar(elapsed, ReduceOp::Min)?;

    let (Some(area), Some(slowest_rank_secs), Some(fastest_rank_secs)) = (total, slowest, fastest)
    else {
        return Ok(None);
    };

    info!(
        area,
        rectangles = spec.total_rectangles(),
        processes = spec.process_count(),
        threads = spec.thread_count(),
        slowest_rank_secs,
        fastest_rank_secs,
        "integration finished"
    );

    Ok(Some(RunReport {
        area,
        spec,
        slowest_rank_secs,
        fastest_rank_secs,
    }))
}

/// Run a whole integration inside this process, with `processes` ranks on
/// their own threads and `threads` accumulation threads per rank.
///
/// Returns the coordinator's area.
pub fn integrate_local<F>(
    domain: &IntegrationDomain,
    total_rectangles: u64,
    processes: usize,
    threads: usize,
    f: &F,
) -> Result<f64>
where
    F: Integrand + ?Sized,
{
    let comms = Universe::local(processes)?;

    let outcomes: Vec<Result<Option<RunReport>>> = std::thread::scope(|s| {
        let handles: Vec<_> = comms
            .into_iter()
            .map(|mut comm| {
                s.spawn(move || integrate(&mut comm, domain, total_rectangles, threads, f))
            })
            .collect();
        handles
            .into_iter()
            .enumerate()
            .map(|(rank, h)| {
                h.join().unwrap_or_else(|_| {
                    Err(Error::RankFailed {
                        rank,
                        reason: "rank thread panicked".into(),
                    })
                })
            })
            .collect()
    });

    let mut area = None;
    for outcome in outcomes {
        if let Some(report) = outcome? {
            area = Some(report.area);
        }
    }
    area.ok_or_else(|| Error::RankFailed {
        rank: crate::COORDINATOR,
        reason: "coordinator produced no result".into(),
    })
}
