use rayon::prelude::*;
use thiserror::Error;

/// Errors that can occur during parallel execution.
#[derive(Error, Debug, PartialEq)]
pub enum ParallelError {
    /// The thread pool failed to build.
    #[error("failed to build thread pool: {0}")]
    BuildError(String),

    /// The requested thread count is invalid.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),
}

/// Controls how the per-keypoint and per-layer stages are executed.
///
/// Every strategy produces its output in the same order as [`ExecutionStrategy::Serial`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum ExecutionStrategy {
    /// Run sequentially on the current thread.
    #[default]
    Serial,

    /// Use the global Rayon thread pool.
    Parallel,

    /// Run on a local thread pool with `n` threads.
    ///
    /// # Warning
    /// Creates a new thread pool on every call, which has significant overhead.
    Fixed(usize),
}

impl ExecutionStrategy {
    /// Whether this strategy dispatches work to a thread pool.
    pub fn is_parallel(&self) -> bool {
        !matches!(self, ExecutionStrategy::Serial)
    }
}

/// Map every item through `op`, keeping the input order in the output.
pub fn map_ordered<T, U, F>(
    items: &[T],
    strategy: ExecutionStrategy,
    op: F,
) -> Result<Vec<U>, ParallelError>
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> U + Sync + Send,
{
    match strategy {
        ExecutionStrategy::Serial => Ok(items.iter().map(op).collect()),
        ExecutionStrategy::Parallel => Ok(items.par_iter().map(op).collect()),
        ExecutionStrategy::Fixed(n) => {
            if n == 0 {
                return Err(ParallelError::InvalidThreadCount(n));
            }
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| ParallelError::BuildError(e.to_string()))?;

            Ok(pool.install(|| items.par_iter().map(op).collect()))
        }
    }
}

/// Map every item to a sequence and concatenate the sequences in input order.
pub fn flat_map_ordered<T, U, F>(
    items: &[T],
    strategy: ExecutionStrategy,
    op: F,
) -> Result<Vec<U>, ParallelError>
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> Vec<U> + Sync + Send,
{
    let nested = map_ordered(items, strategy, op)?;
    Ok(nested.into_iter().flatten().collect())
}
