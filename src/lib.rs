//! fmaperf: cross-device fused multiply-add throughput benchmark.
//!
//! Generates a synthetic FMA workload over large matrices, runs the identical
//! computation on a CPU worker pool and on every usable compute adapter, and
//! verifies that the two result vectors agree within a relative-error
//! tolerance. Throughput is reported as GFLOPS per measured path, with the
//! FLOP budget derived from the kernel's actual loop shape.
//!
//! # Quick Start
//!
//! ```no_run
//! use fmaperf::{available_workers, CpuExecutor, RunContext};
//!
//! let workers = available_workers();
//! let ctx = RunContext::generate(1 << 16, workers);
//! let executor = CpuExecutor::new(ctx.workers).unwrap();
//! let result = executor.execute(&ctx);
//! assert_eq!(result.len(), ctx.len());
//! ```

pub mod cpu_backend;
pub mod kernel;
pub mod partition;
pub mod report;
pub mod timing;
pub mod verify;
pub mod wgpu_backend;
pub mod workload;

pub use cpu_backend::{available_workers, CpuExecutor, ExecutorError};
pub use kernel::{fmadd_element, FLOPS_PER_ITERATION, FLOPS_PER_ROUND, ROUNDS_PER_ITERATION};
pub use partition::{partition, Partition};
pub use report::PerfReport;
pub use timing::{time, Stopwatch};
pub use verify::{verify, VerifyOutcome, DEFAULT_TOLERANCE_PCT};
pub use wgpu_backend::{DeviceContext, DeviceError, FmaddKernel};
pub use workload::{rand_matrix, RunContext, ELEMENT_COUNT};
