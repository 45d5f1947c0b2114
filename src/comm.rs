//! Communicator: a rank's handle on its world.

use std::sync::mpsc::{Receiver, Sender};

use mpi::collective::Root as _;
use mpi::topology::{Communicator as _, SimpleCommunicator};
use tracing::trace;

use crate::ReduceOp;
use crate::error::{Error, Result};

/// Rank that receives the result of every reduction.
pub const COORDINATOR: usize = 0;

/// One contribution to an in-process collective.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Contribution {
    pub(crate) op: ReduceOp,
    pub(crate) value: f64,
}

/// How a rank reaches the rest of its world.
pub(crate) enum Link {
    /// `MPI_COMM_WORLD` of a job started by the parallel launcher
    Mpi(SimpleCommunicator),
    /// In-process coordinator: one receiver per other rank, in rank order
    Root(Vec<Receiver<Contribution>>),
    /// In-process non-coordinator rank
    Leaf(Sender<Contribution>),
}

/// One rank's view of the process world.
///
/// Obtained from [`Universe::world`](crate::Universe::world) for an MPI job,
/// or from [`Universe::local`](crate::Universe::local) for a world of
/// in-process ranks.
///
/// # Example
///
/// ```no_run
/// use ferroarea::{ReduceOp, Universe};
///
/// let mut universe = Universe::init().unwrap();
/// let world = universe.world();
///
/// let total = world.reduce_scalar(world.rank() as f64, ReduceOp::Sum).unwrap();
/// if let Some(total) = total {
///     println!("sum of ranks: {total}");
/// }
/// ```
pub struct Communicator {
    rank: usize,
    size: usize,
    link: Link,
}

impl Communicator {
    pub(crate) fn new(rank: usize, size: usize, link: Link) -> Self {
        Communicator { rank, size, link }
    }

    /// Wrap an MPI communicator, taking rank and size from it.
    pub(crate) fn from_mpi(world: SimpleCommunicator) -> Self {
        // MPI ranks and sizes are never negative
        let rank = world.rank() as usize;
        let size = world.size() as usize;
        Communicator::new(rank, size, Link::Mpi(world))
    }

    /// Get the rank of this process in the world.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Get the number of ranks in the world.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether this rank receives reduction results.
    pub fn is_coordinator(&self) -> bool {
        self.rank == COORDINATOR
    }

    /// Reduce a single value from every rank to the coordinator.
    ///
    /// Every rank of the world must call this the same number of times with
    /// the same `op`. The coordinator blocks until every rank has
    /// contributed and gets `Some(result)`; the other ranks get `None` and
    /// never observe another rank's value.
    ///
    /// The result is reproducible for a fixed world size.
    ///
    /// # Errors
    ///
    /// In an in-process world, a rank that is gone before contributing
    /// yields [`Error::RankFailed`] and a contribution made with a different
    /// operation yields [`Error::MismatchedOp`]. MPI jobs abort on
    /// communication failure instead of returning.
    pub fn reduce_scalar(&mut self, value: f64, op: ReduceOp) -> Result<Option<f64>> {
        match &self.link {
            Link::Mpi(world) => {
                let root = world.process_at_rank(COORDINATOR as i32);
                if self.rank == COORDINATOR {
                    let mut result = op.identity();
                    root.reduce_into_root(&value, &mut result, op.system_op());
                    Ok(Some(result))
                } else {
                    root.reduce_into(&value, op.system_op());
                    Ok(None)
                }
            }
            Link::Leaf(tx) => {
                tx.send(Contribution { op, value }).map_err(|_| Error::RankFailed {
                    rank: COORDINATOR,
                    reason: "coordinator left the world".into(),
                })?;
                Ok(None)
            }
            Link::Root(receivers) => {
                let mut result = value;
                // receivers[i] belongs to rank i + 1
                for (rank, rx) in (1..).zip(receivers) {
                    let contribution = rx.recv().map_err(|_| Error::RankFailed {
                        rank,
                        reason: "left the world before contributing".into(),
                    })?;
                    if contribution.op != op {
                        return Err(Error::MismatchedOp {
                            rank,
                            expected: op,
                            found: contribution.op,
                        });
                    }
                    trace!(rank, value = contribution.value, ?op, "contribution");
                    result = op.apply(result, contribution.value);
                }
                Ok(Some(result))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Universe;
    use std::thread;

    #[test]
    fn single_rank_world_reduces_to_itself() {
        let mut comm = Universe::local(1).unwrap().pop().unwrap();
        assert!(comm.is_coordinator());
        assert_eq!(comm.reduce_scalar(4.5, ReduceOp::Sum).unwrap(), Some(4.5));
        assert_eq!(comm.reduce_scalar(4.5, ReduceOp::Max).unwrap(), Some(4.5));
    }

    #[test]
    fn only_the_coordinator_sees_the_result() {
        let comms = Universe::local(4).unwrap();
        let results: Vec<_> = comms
            .into_iter()
            .map(|mut comm| {
                thread::spawn(move || {
                    let rank = comm.rank();
                    (rank, comm.reduce_scalar(rank as f64 + 1.0, ReduceOp::Sum).unwrap())
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect();

        for (rank, result) in results {
            if rank == COORDINATOR {
                assert_eq!(result, Some(10.0));
            } else {
                assert_eq!(result, None);
            }
        }
    }

    #[test]
    fn ranks_printing_to_stdout_do_not_disturb_the_reduction() {
        let comms = Universe::local(3).unwrap();
        let handles: Vec<_> = comms
            .into_iter()
            .map(|mut comm| {
                thread::spawn(move || {
                    println!("running on {} processes", comm.size());
                    println!("rank {} reporting", comm.rank());
                    comm.reduce_scalar(comm.rank() as f64 + 0.5, ReduceOp::Sum)
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap().unwrap()).collect();
        assert_eq!(results, vec![Some(4.5), None, None]);
    }

    #[test]
    fn successive_collectives_stay_paired() {
        let comms = Universe::local(3).unwrap();
        let handles: Vec<_> = comms
            .into_iter()
            .map(|mut comm| {
                thread::spawn(move || {
                    let r = comm.rank() as f64;
                    let max = comm.reduce_scalar(r, ReduceOp::Max).unwrap();
                    let min = comm.reduce_scalar(r, ReduceOp::Min).unwrap();
                    let sum = comm.reduce_scalar(r, ReduceOp::Sum).unwrap();
                    (max, min, sum)
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results[0], (Some(2.0), Some(0.0), Some(3.0)));
        assert_eq!(results[1], (None, None, None));
    }

    #[test]
    fn mismatched_operation_is_rejected() {
        let mut comms = Universe::local(2).unwrap();
        let mut worker = comms.pop().unwrap();
        let mut root = comms.pop().unwrap();
        worker.reduce_scalar(1.0, ReduceOp::Max).unwrap();
        assert!(matches!(
            root.reduce_scalar(1.0, ReduceOp::Sum),
            Err(Error::MismatchedOp {
                rank: 1,
                expected: ReduceOp::Sum,
                found: ReduceOp::Max,
            })
        ));
    }

    #[test]
    fn vanished_rank_fails_the_reduction() {
        let mut comms = Universe::local(3).unwrap();
        drop(comms.pop());
        let mut worker = comms.pop().unwrap();
        let mut root = comms.pop().unwrap();
        worker.reduce_scalar(1.0, ReduceOp::Sum).unwrap();
        assert!(matches!(
            root.reduce_scalar(0.0, ReduceOp::Sum),
            Err(Error::RankFailed { rank: 2, .. })
        ));
    }

    #[test]
    fn vanished_coordinator_fails_the_contribution() {
        let mut comms = Universe::local(2).unwrap();
        let mut worker = comms.pop().unwrap();
        drop(comms);
        assert!(matches!(
            worker.reduce_scalar(1.0, ReduceOp::Sum),
            Err(Error::RankFailed {
                rank: COORDINATOR,
                ..
            })
        ));
    }
}
