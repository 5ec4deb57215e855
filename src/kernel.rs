//! The synthetic fused multiply-add kernel.
//!
//! Each output element is produced from the matching (a, b, c) input triple by
//! [`ROUNDS_PER_ITERATION`] repetitions of a fixed multiply-add sequence. The
//! kernel is pure: element i depends only on the inputs at i, so it runs in
//! any order, sequentially or in parallel, with bit-identical results.
//!
//! The FLOP constants consumed by the reporter are derived from the statement
//! count of the round body, never free-standing literals; the op-counting test
//! below pins the declared constant to the executed count.

/// Repetitions of the unrolled round body per element.
pub const ROUNDS_PER_ITERATION: usize = 16;

/// `acc += x * ((y * z) + y)` statements in one round body: the three-term
/// multiply-add group, unrolled 4x.
const MADD_STATEMENTS_PER_ROUND: usize = 12;

/// Floating-point operations per statement: two multiplies, two adds.
const FLOPS_PER_STATEMENT: usize = 4;

/// Floating-point operations in one round.
pub const FLOPS_PER_ROUND: usize = MADD_STATEMENTS_PER_ROUND * FLOPS_PER_STATEMENT;

/// Floating-point operations per output element.
pub const FLOPS_PER_ITERATION: usize = ROUNDS_PER_ITERATION * FLOPS_PER_ROUND;

/// Scalar the kernel body is generic over.
///
/// The production instantiation is plain `f32`; tests substitute an
/// op-counting scalar to check [`FLOPS_PER_ITERATION`] against the statement
/// sequence actually executed.
pub trait KernelScalar: Copy {
    fn zero() -> Self;
    fn mul(self, rhs: Self) -> Self;
    fn add(self, rhs: Self) -> Self;
}

impl KernelScalar for f32 {
    #[inline(always)]
    fn zero() -> Self {
        0.0
    }

    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        self * rhs
    }

    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        self + rhs
    }
}

/// Compute one output element from its (a, b, c) triple.
#[inline(always)]
pub fn fmadd_element(a: f32, b: f32, c: f32) -> f32 {
    fmadd_element_generic(a, b, c)
}

/// Generic kernel body.
///
/// The statement count per round must stay equal to
/// `MADD_STATEMENTS_PER_ROUND`; the GPU shader in `kernels/fmadd.wgsl`
/// mirrors this sequence statement for statement.
#[inline(always)]
pub fn fmadd_element_generic<T: KernelScalar>(a: T, b: T, c: T) -> T {
    let mut acc = T::zero();
    for _ in 0..ROUNDS_PER_ITERATION {
        acc = acc.add(a.mul(b.mul(c).add(b)));
        acc = acc.add(b.mul(c.mul(a).add(c)));
        acc = acc.add(c.mul(a.mul(b).add(a)));

        acc = acc.add(a.mul(b.mul(c).add(b)));
        acc = acc.add(b.mul(c.mul(a).add(c)));
        acc = acc.add(c.mul(a.mul(b).add(a)));

        acc = acc.add(a.mul(b.mul(c).add(b)));
        acc = acc.add(b.mul(c.mul(a).add(c)));
        acc = acc.add(c.mul(a.mul(b).add(a)));

        acc = acc.add(a.mul(b.mul(c).add(b)));
        acc = acc.add(b.mul(c.mul(a).add(c)));
        acc = acc.add(c.mul(a.mul(b).add(a)));
    }
    acc
}
