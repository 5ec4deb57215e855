//! Cross-path result verification under a relative-error tolerance.
//!
//! Floating-point non-associativity means a device result is never compared
//! for bit equality against the CPU reference; each element must instead stay
//! within a relative-error bound.

use std::fmt;

/// Default tolerance, in percent.
pub const DEFAULT_TOLERANCE_PCT: f32 = 1.0;

/// Absolute bound a candidate must stay inside when the reference element is
/// exactly zero and the relative formula is undefined.
pub const ZERO_REFERENCE_EPSILON: f32 = 1e-6;

/// Outcome of one verification pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VerifyOutcome {
    /// Every element within tolerance; carries the worst deviation seen.
    Pass { max_error_pct: f32 },
    /// First element outside tolerance, in ascending index order.
    Fail {
        index: usize,
        error_pct: f32,
        expected: f32,
        actual: f32,
    },
}

impl VerifyOutcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass { .. })
    }
}

impl fmt::Display for VerifyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Pass { max_error_pct } => {
                write!(f, "Result passed verification. Max ferror {max_error_pct}%")
            }
            Self::Fail {
                index,
                error_pct,
                expected,
                actual,
            } => {
                writeln!(
                    f,
                    "Verification failed at {index} with {error_pct} pct deviation"
                )?;
                write!(f, "Expected {expected}, calculated {actual}")
            }
        }
    }
}

/// Compare `candidate` against `reference` element-wise.
///
/// The relative error at index i is
/// `100 * |candidate[i] - reference[i]| / reference[i]`. The scan runs in
/// ascending index order and stops at the first element whose deviation
/// exceeds `tolerance_pct`; a full pass reports the maximum deviation
/// observed over the whole sequence.
///
/// A zero reference element makes the relative formula undefined, so the
/// check falls back to an absolute bound of [`ZERO_REFERENCE_EPSILON`] on the
/// candidate: within the bound counts as an exact match, outside it the
/// element fails with an infinite reported deviation. NaN on either side
/// fails at that index; it can never leak into a `Pass`.
pub fn verify(reference: &[f32], candidate: &[f32], tolerance_pct: f32) -> VerifyOutcome {
    debug_assert_eq!(reference.len(), candidate.len());

    let mut max_error_pct = 0.0f32;
    for (index, (&expected, &actual)) in reference.iter().zip(candidate).enumerate() {
        let error_pct = if expected == 0.0 {
            if actual.abs() <= ZERO_REFERENCE_EPSILON {
                continue;
            }
            f32::INFINITY
        } else {
            100.0 / expected * (actual - expected).abs()
        };

        // Negated comparison so a NaN deviation also fails.
        if !(error_pct <= tolerance_pct) {
            return VerifyOutcome::Fail {
                index,
                error_pct,
                expected,
                actual,
            };
        }
        if error_pct > max_error_pct {
            max_error_pct = error_pct;
        }
    }

    VerifyOutcome::Pass { max_error_pct }
}
