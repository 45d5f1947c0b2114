//! Launch environment helpers.
//!
//! The process count belongs to the parallel launcher (`mpiexec -n`,
//! `srun`); the thread count per process is read here, never from the
//! command line. Our own variable takes priority; when it is absent the
//! usual OpenMP and SLURM variables are consulted.
//!
//! # Environment Variables
//!
//! | Setting | Variable | Fallbacks |
//! |---------|----------|-----------|
//! | threads per process | `AREA_NUM_THREADS` | `OMP_NUM_THREADS`, `SLURM_CPUS_PER_TASK` |

use crate::error::{Error, Result};

/// Thread count per process requested by the user.
pub const NUM_THREADS_VAR: &str = "AREA_NUM_THREADS";

const OMP_NUM_THREADS_VAR: &str = "OMP_NUM_THREADS";
const SLURM_CPUS_PER_TASK_VAR: &str = "SLURM_CPUS_PER_TASK";

/// Read the per-process thread count from the process environment.
///
/// Defaults to 1 when no variable is set.
pub fn thread_count() -> Result<usize> {
    thread_count_from(|var| std::env::var(var).ok())
}

/// Resolve the per-process thread count through an arbitrary lookup.
///
/// # Errors
///
/// Returns [`Error::InvalidEnv`] for a value that does not parse and
/// [`Error::InvalidCount`] for zero.
pub fn thread_count_from<F>(lookup: F) -> Result<usize>
where
    F: Fn(&str) -> Option<String>,
{
    let threads = first_count(
        &lookup,
        &[NUM_THREADS_VAR, OMP_NUM_THREADS_VAR, SLURM_CPUS_PER_TASK_VAR],
    )?
    .unwrap_or(1);
    Error::check_count(threads, "thread count")
}

/// Parse the first variable in `vars` that is set.
fn first_count<F>(lookup: &F, vars: &[&'static str]) -> Result<Option<usize>>
where
    F: Fn(&str) -> Option<String>,
{
    for &var in vars {
        if let Some(value) = parse_var(lookup, var)? {
            return Ok(Some(value));
        }
    }
    Ok(None)
}

fn parse_var<F>(lookup: &F, var: &'static str) -> Result<Option<usize>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    // OMP_NUM_THREADS may hold a nesting list ("4,2"); the outer level applies.
    let head = raw.split(',').next().unwrap_or_default().trim();
    if head.is_empty() {
        return Ok(None);
    }
    head.parse()
        .map(Some)
        .map_err(|_| Error::InvalidEnv { var, value: raw })
}
