// Copyright 2024 the Tracery Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::borrow::Cow;
use std::collections::HashMap;
use std::future::Future;

use wgpu::{
    BindGroupLayout, Buffer, BufferUsages, CommandEncoder, CommandEncoderDescriptor,
    ComputePassDescriptor, ComputePipeline, Device, PipelineCompilationOptions, Queue,
};

use crate::engine::{CpuShaderFn, Engine};
use crate::recording::{BindType, BufferProxy, Command, Recording, ResourceId, ShaderId};
use crate::{Error, Result};

struct WgpuShader {
    label: &'static str,
    pipeline: ComputePipeline,
    bind_group_layout: BindGroupLayout,
}

/// Engine running the passes as wgpu compute shaders.
///
/// Buffers stay on the device; nothing is read back.
pub struct WgpuEngine {
    device: Device,
    queue: Queue,
    shaders: Vec<WgpuShader>,
    buffers: HashMap<ResourceId, Buffer>,
}

impl WgpuEngine {
    pub fn new(device: Device, queue: Queue) -> Self {
        Self {
            device,
            queue,
            shaders: Vec::new(),
            buffers: HashMap::new(),
        }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// The device buffer behind a proxy, for binding in render passes.
    pub fn buffer(&self, proxy: &BufferProxy) -> Option<&Buffer> {
        self.buffers.get(&proxy.id)
    }

    /// Runs `f` inside a validation error scope and surfaces the first error.
    pub fn validated<'a, T>(
        &'a mut self,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> impl Future<Output = Result<T>> + 'a
    where
        T: 'a,
    {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let result = f(self);
        let scope = self.device.pop_error_scope();
        async move {
            if let Some(error) = scope.await {
                return Err(error.into());
            }
            result
        }
    }

    fn create_bind_group_layout_entries(
        layout: impl Iterator<Item = (BindType, wgpu::ShaderStages)>,
    ) -> Vec<wgpu::BindGroupLayoutEntry> {
        layout
            .enumerate()
            .map(|(i, (bind_type, visibility))| wgpu::BindGroupLayoutEntry {
                binding: i as u32,
                visibility,
                ty: wgpu::BindingType::Buffer {
                    ty: match bind_type {
                        BindType::Uniform => wgpu::BufferBindingType::Uniform,
                        BindType::Buffer | BindType::BufReadOnly => {
                            wgpu::BufferBindingType::Storage {
                                read_only: !bind_type.is_mutable(),
                            }
                        }
                    },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            })
            .collect()
    }

    fn create_compute_pipeline(
        device: &Device,
        label: &'static str,
        wgsl: Cow<'_, str>,
        entries: &[wgpu::BindGroupLayoutEntry],
    ) -> WgpuShader {
        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(wgsl),
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries,
        });
        let compute_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: None,
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(label),
            layout: Some(&compute_pipeline_layout),
            module: &shader_module,
            entry_point: None,
            compilation_options: PipelineCompilationOptions::default(),
            cache: None,
        });
        WgpuShader {
            label,
            pipeline,
            bind_group_layout,
        }
    }

    fn get_or_create<'a>(
        device: &Device,
        buffers: &'a mut HashMap<ResourceId, Buffer>,
        proxy: &BufferProxy,
        usage: BufferUsages,
    ) -> &'a Buffer {
        buffers.entry(proxy.id).or_insert_with(|| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(proxy.name),
                size: proxy.size,
                usage,
                mapped_at_creation: false,
            })
        })
    }

    fn encoder(&self, label: &'static str) -> CommandEncoder {
        self.device
            .create_command_encoder(&CommandEncoderDescriptor { label: Some(label) })
    }
}

const STORAGE_USAGE: BufferUsages = BufferUsages::STORAGE
    .union(BufferUsages::COPY_DST)
    .union(BufferUsages::COPY_SRC)
    .union(BufferUsages::VERTEX);

impl Engine for WgpuEngine {
    fn add_compute_shader(
        &mut self,
        label: &'static str,
        wgsl: Cow<'static, str>,
        layout: &[BindType],
        _cpu_shader: CpuShaderFn,
    ) -> Result<ShaderId> {
        let entries = Self::create_bind_group_layout_entries(
            layout.iter().map(|b| (*b, wgpu::ShaderStages::COMPUTE)),
        );
        let shader = Self::create_compute_pipeline(&self.device, label, wgsl, &entries);
        self.shaders.push(shader);
        Ok(ShaderId(self.shaders.len() - 1))
    }

    fn run_recording(&mut self, recording: &Recording, label: &'static str) -> Result<()> {
        let mut encoder = self.encoder(label);
        // Queue writes land before the next submission, so commands encoded
        // earlier must be submitted before a buffer is written again.
        let mut encoded = false;
        for command in &recording.commands {
            match command {
                Command::Upload(proxy, bytes) | Command::UploadUniform(proxy, bytes) => {
                    if encoded {
                        let done = std::mem::replace(&mut encoder, self.encoder(label));
                        self.queue.submit(Some(done.finish()));
                        encoded = false;
                    }
                    let usage = if matches!(command, Command::UploadUniform(..)) {
                        BufferUsages::UNIFORM | BufferUsages::COPY_DST
                    } else {
                        STORAGE_USAGE
                    };
                    let buf = Self::get_or_create(&self.device, &mut self.buffers, proxy, usage);
                    self.queue.write_buffer(buf, 0, bytes);
                }
                Command::Clear(proxy, offset, size) => {
                    let buf =
                        Self::get_or_create(&self.device, &mut self.buffers, proxy, STORAGE_USAGE);
                    encoder.clear_buffer(buf, *offset, *size);
                    encoded = true;
                }
                Command::FreeBuffer(proxy) => {
                    self.buffers.remove(&proxy.id);
                }
                Command::Dispatch(shader_id, (x, y, z), bindings) => {
                    if *x == 0 || *y == 0 || *z == 0 {
                        continue;
                    }
                    let shader = &self.shaders[shader_id.0];
                    let entries = bindings
                        .iter()
                        .enumerate()
                        .map(|(i, proxy)| {
                            self.buffers
                                .get(&proxy.id)
                                .map(|buf| wgpu::BindGroupEntry {
                                    binding: i as u32,
                                    resource: buf.as_entire_binding(),
                                })
                                .ok_or(Error::UnavailableBufferUsed(proxy.name, shader.label))
                        })
                        .collect::<Result<Vec<_>>>()?;
                    let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                        label: None,
                        layout: &shader.bind_group_layout,
                        entries: &entries,
                    });
                    let mut cpass = encoder.begin_compute_pass(&ComputePassDescriptor::default());
                    cpass.set_pipeline(&shader.pipeline);
                    cpass.set_bind_group(0, &bind_group, &[]);
                    cpass.dispatch_workgroups(*x, *y, *z);
                    encoded = true;
                }
            }
        }
        self.queue.submit(Some(encoder.finish()));
        Ok(())
    }
}

impl std::fmt::Debug for WgpuEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuEngine")
            .field(
                "shaders",
                &self.shaders.iter().map(|s| s.label).collect::<Vec<_>>(),
            )
            .field("buffers", &self.buffers.len())
            .finish_non_exhaustive()
    }
}
