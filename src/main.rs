//! Benchmark binary: seed the workload, run the CPU and device paths over the
//! same inputs, verify each device result against the CPU result, and report
//! throughput per path.

use std::process;

use fmaperf::{
    available_workers, time, verify, CpuExecutor, DeviceContext, ExecutorError, FmaddKernel,
    PerfReport, RunContext, DEFAULT_TOLERANCE_PCT, ELEMENT_COUNT, FLOPS_PER_ITERATION,
};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("fatal: {err}");
        process::exit(1);
    }
}

fn run() -> Result<(), ExecutorError> {
    let workers = available_workers();
    log::info!("generating {ELEMENT_COUNT} element workload, {workers} workers");
    let ctx = RunContext::generate(ELEMENT_COUNT, workers);

    let executor = CpuExecutor::new(ctx.workers)?;
    let (cpu_result, cpu_secs) = time(|| executor.execute(&ctx));

    println!("CPU: {} workers", executor.workers());
    println!("{}\n", PerfReport::new(ctx.len(), FLOPS_PER_ITERATION, cpu_secs));

    let devices = DeviceContext::enumerate();
    if devices.is_empty() {
        log::warn!("no compute devices found; CPU path only");
    }
    for (idx, device) in devices.iter().enumerate() {
        let kernel = FmaddKernel::new(device);
        match time(|| kernel.execute(&ctx.a, &ctx.b, &ctx.c)) {
            (Ok(device_result), device_secs) => {
                println!("GPU {idx}: {}", device.name);
                println!(
                    "{}",
                    PerfReport::new(ctx.len(), FLOPS_PER_ITERATION, device_secs)
                );
                println!(
                    "{}\n",
                    verify(&cpu_result, &device_result, DEFAULT_TOLERANCE_PCT)
                );
            }
            (Err(err), _) => {
                log::error!("device {} failed: {err}", device.name);
            }
        }
    }

    Ok(())
}
