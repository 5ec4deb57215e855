//! GPU execution path over wgpu.
//!
//! Boundary code only: adapter discovery, device and queue setup, and
//! dispatch of the WGSL fmadd kernel. The shader computes exactly the
//! sequence in [`crate::kernel`], and element ordering is preserved: index i
//! of the readback corresponds to index i of the CPU result.

use std::borrow::Cow;
use std::mem;

use thiserror::Error;
use wgpu::util::DeviceExt;
use wgpu::{BindGroupLayout, Buffer, BufferUsages, ComputePipeline, Device, Queue};

const KERNEL_ENTRY: &str = "matrix_fmadd";
const SHADER_SOURCE: &str = include_str!("kernels/fmadd.wgsl");

// Must stay in sync with @workgroup_size in kernels/fmadd.wgsl.
const WORKGROUP_SIZE: u32 = 128;

/// Shader-side launch parameters. Layout mirrors the WGSL `Params` struct.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
struct FmaddParams {
    element_count: u32,
    rounds: u32,
    _pad0: u32,
    _pad1: u32,
}

/// Errors surfaced by the device boundary.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("no usable compute adapter found")]
    NoAdapter,
    #[error("request_device failed: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("input matrices must share one length: {0} vs {1}")]
    ShapeMismatch(usize, usize),
    #[error("element count {0} exceeds the device dispatch limit")]
    DomainTooLarge(usize),
    #[error("buffer readback failed: {0}")]
    Readback(String),
}

/// One usable compute device with its queue.
///
/// Scoped acquisition: constructing the context acquires the device, dropping
/// it releases every device resource.
pub struct DeviceContext {
    pub name: String,
    device: Device,
    queue: Queue,
}

impl DeviceContext {
    /// Every usable compute adapter on this host, in enumeration order.
    ///
    /// Adapters that refuse a device request are logged and skipped rather
    /// than failing the whole benchmark.
    pub fn enumerate() -> Vec<DeviceContext> {
        let instance = wgpu::Instance::default();
        let mut contexts = Vec::new();
        for adapter in instance.enumerate_adapters(wgpu::Backends::all()) {
            let info = adapter.get_info();
            match Self::from_adapter(adapter) {
                Ok(ctx) => {
                    log::info!("compute device {}: {}", contexts.len(), ctx.name);
                    contexts.push(ctx);
                }
                Err(err) => {
                    log::warn!("skipping adapter {}: {err}", info.name);
                }
            }
        }
        contexts
    }

    /// The highest-priority adapter only.
    pub fn default_device() -> Result<DeviceContext, DeviceError> {
        let instance = wgpu::Instance::default();
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or(DeviceError::NoAdapter)?;
        Self::from_adapter(adapter)
    }

    fn from_adapter(adapter: wgpu::Adapter) -> Result<Self, DeviceError> {
        let info = adapter.get_info();
        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("fmaperf"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
            },
            None,
        ))?;
        Ok(Self {
            name: format!("{} ({:?})", info.name, info.backend),
            device,
            queue,
        })
    }
}

/// Compiled fmadd pipeline on one device.
pub struct FmaddKernel {
    device: Device,
    queue: Queue,
    bind_group_layout: BindGroupLayout,
    pipeline: ComputePipeline,
}

impl FmaddKernel {
    /// Compile the shader and build the compute pipeline for `ctx`.
    pub fn new(ctx: &DeviceContext) -> Self {
        let shader = ctx
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("fmadd.wgsl"),
                source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(SHADER_SOURCE)),
            });

        let bind_group_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("fmadd_bind_group_layout"),
                    entries: &[
                        storage_layout_entry(0, true),
                        storage_layout_entry(1, true),
                        storage_layout_entry(2, true),
                        storage_layout_entry(3, false),
                        uniform_layout_entry(4),
                    ],
                });

        let pipeline_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("fmadd_pipeline_layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        let pipeline = ctx
            .device
            .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(KERNEL_ENTRY),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: Some(KERNEL_ENTRY),
                compilation_options: Default::default(),
                cache: None,
            });

        Self {
            device: ctx.device.clone(),
            queue: ctx.queue.clone(),
            bind_group_layout,
            pipeline,
        }
    }

    /// Run the kernel over the three input matrices, returning the result
    /// matrix in element order.
    pub fn execute(&self, a: &[f32], b: &[f32], c: &[f32]) -> Result<Vec<f32>, DeviceError> {
        if a.len() != b.len() {
            return Err(DeviceError::ShapeMismatch(a.len(), b.len()));
        }
        if a.len() != c.len() {
            return Err(DeviceError::ShapeMismatch(a.len(), c.len()));
        }

        let n = a.len();
        if n == 0 {
            return Ok(Vec::new());
        }

        let element_count =
            u32::try_from(n).map_err(|_| DeviceError::DomainTooLarge(n))?;
        let workgroups = element_count.div_ceil(WORKGROUP_SIZE);
        if workgroups > self.device.limits().max_compute_workgroups_per_dimension {
            return Err(DeviceError::DomainTooLarge(n));
        }

        let params = FmaddParams {
            element_count,
            rounds: crate::kernel::ROUNDS_PER_ITERATION as u32,
            _pad0: 0,
            _pad1: 0,
        };
        log::debug!(
            "dispatching {workgroups} workgroups of {WORKGROUP_SIZE} over {n} elements"
        );

        let a_buffer = self.input_buffer("fmadd_a", a);
        let b_buffer = self.input_buffer("fmadd_b", b);
        let c_buffer = self.input_buffer("fmadd_c", c);

        let output_bytes = (n * mem::size_of::<f32>()) as u64;
        let padded_bytes = align_up(output_bytes, readback_align());
        let output_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fmadd_result"),
            size: padded_bytes,
            usage: BufferUsages::STORAGE | BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let params_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("fmadd_params"),
                contents: bytes_of(&params),
                usage: BufferUsages::UNIFORM,
            });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("fmadd_bind_group"),
            layout: &self.bind_group_layout,
            entries: &[
                buffer_binding(0, &a_buffer),
                buffer_binding(1, &b_buffer),
                buffer_binding(2, &c_buffer),
                buffer_binding(3, &output_buffer),
                buffer_binding(4, &params_buffer),
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("fmadd_encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("fmadd_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(workgroups, 1, 1);
        }

        let readback = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fmadd_readback"),
            size: padded_bytes,
            usage: BufferUsages::MAP_READ | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        encoder.copy_buffer_to_buffer(&output_buffer, 0, &readback, 0, padded_bytes);
        self.queue.submit(Some(encoder.finish()));

        let mut data = read_buffer_sync(&self.device, &readback, padded_bytes)?;
        data.truncate(output_bytes as usize);
        Ok(bytes_to_vec(&data))
    }

    fn input_buffer(&self, label: &str, contents: &[f32]) -> Buffer {
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: slice_as_bytes(contents),
                usage: BufferUsages::STORAGE,
            })
    }
}

fn storage_layout_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn uniform_layout_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn buffer_binding(binding: u32, buffer: &Buffer) -> wgpu::BindGroupEntry<'_> {
    wgpu::BindGroupEntry {
        binding,
        resource: buffer.as_entire_binding(),
    }
}

fn bytes_of<T: Copy>(value: &T) -> &[u8] {
    unsafe { std::slice::from_raw_parts((value as *const T) as *const u8, mem::size_of::<T>()) }
}

fn slice_as_bytes<T: Copy>(slice: &[T]) -> &[u8] {
    unsafe {
        std::slice::from_raw_parts(slice.as_ptr() as *const u8, mem::size_of_val(slice))
    }
}

fn bytes_to_vec<T: Copy>(bytes: &[u8]) -> Vec<T> {
    let len = bytes.len() / mem::size_of::<T>();
    let mut out = Vec::with_capacity(len);
    unsafe {
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), out.as_mut_ptr() as *mut u8, bytes.len());
        out.set_len(len);
    }
    out
}

fn align_up(value: u64, align: u64) -> u64 {
    value.div_ceil(align) * align
}

fn readback_align() -> u64 {
    wgpu::COPY_BUFFER_ALIGNMENT.max(wgpu::MAP_ALIGNMENT)
}

fn read_buffer_sync(device: &Device, buffer: &Buffer, size: u64) -> Result<Vec<u8>, DeviceError> {
    let slice = buffer.slice(0..size);
    let (sender, receiver) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });
    let _ = device.poll(wgpu::Maintain::Wait);
    match receiver.recv() {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            return Err(DeviceError::Readback(format!("map_async failed: {err}")));
        }
        Err(_) => {
            return Err(DeviceError::Readback("map_async channel closed".into()));
        }
    }

    let data = slice.get_mapped_range();
    let bytes = data.to_vec();
    drop(data);
    buffer.unmap();
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_up_rounds_to_the_next_boundary() {
        assert_eq!(align_up(1, 8), 8);
        assert_eq!(align_up(8, 8), 8);
        assert_eq!(align_up(9, 8), 16);
    }

    #[test]
    fn params_layout_matches_the_shader_struct() {
        // Four u32 fields, 16 bytes, the WGSL uniform layout.
        assert_eq!(mem::size_of::<FmaddParams>(), 16);
    }

    #[test]
    fn byte_casts_round_trip() {
        let values = [1.0f32, -2.5, 0.0, 3.75];
        let bytes = slice_as_bytes(&values);
        let back: Vec<f32> = bytes_to_vec(bytes);
        assert_eq!(back, values);
    }
}
