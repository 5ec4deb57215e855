//! Benchmark workload generation and the per-run context.

use rand::Rng;

/// Number of scalar entries in each benchmark matrix: 2 * 2^20.
pub const ELEMENT_COUNT: usize = 2 << 20;

/// Freshly allocated matrix of `n` values drawn independently and uniformly
/// from [0, 1).
///
/// Seeded from the thread-local entropy source; determinism across runs is
/// not required, but the three matrices of one run are independent draws.
pub fn rand_matrix(n: usize) -> Vec<f32> {
    let mut rng = rand::thread_rng();
    (0..n).map(|_| rng.gen::<f32>()).collect()
}

/// Inputs and parallelism for one benchmark execution.
///
/// Owns the three input matrices for the lifetime of the run; dropping the
/// context releases every buffer.
pub struct RunContext {
    pub a: Vec<f32>,
    pub b: Vec<f32>,
    pub c: Vec<f32>,
    pub workers: usize,
}

impl RunContext {
    /// Draw three independent input matrices of `n` elements.
    pub fn generate(n: usize, workers: usize) -> Self {
        Self {
            a: rand_matrix(n),
            b: rand_matrix(n),
            c: rand_matrix(n),
            workers,
        }
    }

    /// Element count of the matrices.
    pub fn len(&self) -> usize {
        self.a.len()
    }

    pub fn is_empty(&self) -> bool {
        self.a.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_are_in_unit_interval() {
        let mat = rand_matrix(4096);
        assert_eq!(mat.len(), 4096);
        assert!(mat.iter().all(|&v| (0.0..1.0).contains(&v)));
    }

    #[test]
    fn matrices_are_independent_draws() {
        let ctx = RunContext::generate(1024, 4);
        // Identical 1024-element draws would mean the generator is broken.
        assert_ne!(ctx.a, ctx.b);
        assert_ne!(ctx.b, ctx.c);
    }

    #[test]
    fn element_count_constant() {
        assert_eq!(ELEMENT_COUNT, 2_097_152);
    }
}
