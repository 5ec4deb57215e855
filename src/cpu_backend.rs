//! CPU execution path: a fixed-size worker pool running the kernel over
//! disjoint partitions of the element domain.

use rayon::ThreadPool;
use thiserror::Error;

use crate::kernel::fmadd_element;
use crate::partition::partition;
use crate::workload::RunContext;

/// Errors surfaced by the CPU execution path.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// Worker pool construction failed. Fatal: the executor never hands out
    /// partial results.
    #[error("failed to build worker pool: {0}")]
    PoolBuild(#[from] rayon::ThreadPoolBuildError),
}

/// Number of usable parallel workers on this host, at least 1.
pub fn available_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Owns the worker pool for the CPU benchmark path.
pub struct CpuExecutor {
    pool: ThreadPool,
    workers: usize,
}

impl CpuExecutor {
    /// Build a pool with exactly `workers` threads.
    pub fn new(workers: usize) -> Result<Self, ExecutorError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("fmaperf-worker-{i}"))
            .build()?;
        Ok(Self { pool, workers })
    }

    /// Size of the worker pool.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run the kernel over every element of the domain, one partition per
    /// worker.
    ///
    /// Blocks until all workers have completed; the returned matrix is fully
    /// populated. Each worker writes only the output slice of its own
    /// partition, carved out with `split_at_mut`, so the pass needs no
    /// locking.
    pub fn execute(&self, ctx: &RunContext) -> Vec<f32> {
        let n = ctx.len();
        let mut result = vec![0.0f32; n];
        let plan = partition(n, self.workers);

        let (a, b, c) = (ctx.a.as_slice(), ctx.b.as_slice(), ctx.c.as_slice());
        self.pool.scope(|scope| {
            let mut rest = result.as_mut_slice();
            for part in &plan {
                let (chunk, tail) = rest.split_at_mut(part.len());
                rest = tail;
                let indices = part.range();
                scope.spawn(move |_| {
                    for (out, i) in chunk.iter_mut().zip(indices) {
                        *out = fmadd_element(a[i], b[i], c[i]);
                    }
                });
            }
        });

        result
    }

    /// Single-threaded reference pass over the same domain.
    pub fn execute_sequential(ctx: &RunContext) -> Vec<f32> {
        ctx.a
            .iter()
            .zip(&ctx.b)
            .zip(&ctx.c)
            .map(|((&a, &b), &c)| fmadd_element(a, b, c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_context(n: usize, workers: usize) -> RunContext {
        RunContext {
            a: (0..n).map(|i| (i as f32 + 1.0) / n as f32).collect(),
            b: (0..n).map(|i| (i as f32 + 2.0) / n as f32).collect(),
            c: (0..n).map(|i| (i as f32 + 3.0) / n as f32).collect(),
            workers,
        }
    }

    #[test]
    fn parallel_matches_sequential_bit_for_bit() {
        let ctx = small_context(1000, 3);
        let executor = CpuExecutor::new(ctx.workers).unwrap();
        assert_eq!(executor.execute(&ctx), CpuExecutor::execute_sequential(&ctx));
    }

    #[test]
    fn more_workers_than_elements() {
        let ctx = small_context(5, 16);
        let executor = CpuExecutor::new(ctx.workers).unwrap();
        assert_eq!(executor.execute(&ctx), CpuExecutor::execute_sequential(&ctx));
    }

    #[test]
    fn empty_domain_yields_empty_output() {
        let ctx = small_context(0, 4);
        let executor = CpuExecutor::new(ctx.workers).unwrap();
        assert!(executor.execute(&ctx).is_empty());
    }

    #[test]
    fn available_workers_is_positive() {
        assert!(available_workers() >= 1);
    }
}
