//! Device vs CPU comparison for the fmadd kernel.
//!
//! Verifies that every usable compute adapter reproduces the CPU reference
//! within the default relative-error tolerance. Skips cleanly on hosts with
//! no adapter so the suite stays green on CPU-only machines.

use fmaperf::{
    verify, CpuExecutor, DeviceContext, FmaddKernel, RunContext, DEFAULT_TOLERANCE_PCT,
};

/// Deterministic random-like test data in [0, 1).
fn generate_test_data(n: usize, seed: u64) -> Vec<f32> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            ((state >> 33) as f32) / (u32::MAX as f32)
        })
        .collect()
}

fn test_context(n: usize) -> RunContext {
    RunContext {
        a: generate_test_data(n, 42),
        b: generate_test_data(n, 43),
        c: generate_test_data(n, 44),
        workers: 1,
    }
}

#[test]
fn every_device_matches_cpu_within_tolerance() {
    let devices = DeviceContext::enumerate();
    if devices.is_empty() {
        eprintln!("no compute adapter available, skipping");
        return;
    }

    let ctx = test_context(4096);
    let reference = CpuExecutor::execute_sequential(&ctx);

    for device in &devices {
        let kernel = FmaddKernel::new(device);
        let result = kernel
            .execute(&ctx.a, &ctx.b, &ctx.c)
            .expect("device dispatch failed");
        assert_eq!(result.len(), reference.len(), "{}", device.name);

        let outcome = verify(&reference, &result, DEFAULT_TOLERANCE_PCT);
        assert!(outcome.is_pass(), "{}: {}", device.name, outcome);
    }
}

#[test]
fn default_device_handles_a_non_workgroup_multiple() {
    let device = match DeviceContext::default_device() {
        Ok(device) => device,
        Err(err) => {
            eprintln!("no default adapter ({err}), skipping");
            return;
        }
    };

    // 1000 elements leave a partially filled trailing workgroup; the shader's
    // bounds check must keep stray invocations out of the result.
    let ctx = test_context(1000);
    let reference = CpuExecutor::execute_sequential(&ctx);

    let kernel = FmaddKernel::new(&device);
    let result = kernel
        .execute(&ctx.a, &ctx.b, &ctx.c)
        .expect("device dispatch failed");
    assert_eq!(result.len(), 1000);

    let outcome = verify(&reference, &result, DEFAULT_TOLERANCE_PCT);
    assert!(outcome.is_pass(), "{}: {}", device.name, outcome);
}
