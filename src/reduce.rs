//! Reduction of partial sums: threads into their process, processes into
//! the coordinator.

use tracing::debug;

use crate::ReduceOp;
use crate::accumulate::PartialSum;
use crate::comm::Communicator;
use crate::error::Result;

/// Fold the thread partial sums of one rank into its process sum.
///
/// Partials are added in the order given, which [`thread_partials`] returns
/// by thread id, so the process sum is reproducible for a fixed thread count.
///
/// [`thread_partials`]: crate::accumulate::thread_partials
pub fn combine(rank: usize, partials: &[PartialSum]) -> PartialSum {
    debug_assert!(partials.iter().all(|p| p.rank == rank));

    let value = partials
        .iter()
        .fold(ReduceOp::Sum.identity(), |acc, p| ReduceOp::Sum.apply(acc, p.value));

    PartialSum {
        rank,
        thread_id: None,
        value,
    }
}

/// Sum every rank's process sum onto the coordinator.
///
/// Returns `Some(total)` on the coordinator and `None` everywhere else.
pub fn reduce_to_coordinator(comm: &mut Communicator, process_sum: &PartialSum) -> Result<Option<f64>> {
    debug!(rank = process_sum.rank, value = process_sum.value, "process partial sum");
    comm.reduce_scalar(process_sum.value, ReduceOp::Sum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Universe;

    fn partial(thread_id: usize, value: f64) -> PartialSum {
        PartialSum {
            rank: 1,
            thread_id: Some(thread_id),
            value,
        }
    }

    #[test]
    fn combine_adds_thread_sums() {
        let sum = combine(1, &[partial(0, 1.5), partial(1, 2.0), partial(2, -0.5)]);
        assert_eq!(sum.value, 3.0);
        assert_eq!(sum.rank, 1);
        assert_eq!(sum.thread_id, None);
    }

    #[test]
    fn combine_of_nothing_is_zero() {
        assert_eq!(combine(1, &[]).value, 0.0);
    }

    #[test]
    fn coordinator_gets_the_total() {
        let comms = Universe::local(3).unwrap();
        let results: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = comms
                .into_iter()
                .map(|mut comm| {
                    s.spawn(move || {
                        let own = PartialSum {
                            rank: comm.rank(),
                            thread_id: None,
                            value: 10.0 * (comm.rank() + 1) as f64,
                        };
                        reduce_to_coordinator(&mut comm, &own).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(results, vec![Some(60.0), None, None]);
    }
}
