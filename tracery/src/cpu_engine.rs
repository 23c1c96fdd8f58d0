// Copyright 2024 the Tracery Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::HashMap;

use tracery_encoding::{ColorData, PointData};
use tracery_shaders::cpu::CpuBinding;

use crate::engine::{CpuShaderFn, Engine};
use crate::recording::{BindType, BufferProxy, Command, Recording, ResourceId, ShaderId};
use crate::sync::{BufferSync, FrameSnapshot};
use crate::{Error, Result};

struct Shader {
    label: &'static str,
    cpu: CpuShaderFn,
}

struct CpuBuffer {
    data: RefCell<Vec<u8>>,
    label: &'static str,
}

/// Reference engine running every pass on the host.
///
/// Its buffers live in host memory, which is what makes
/// [`CpuEngine::snapshot`] possible.
#[derive(Default)]
pub struct CpuEngine {
    shaders: Vec<Shader>,
    buffers: HashMap<ResourceId, CpuBuffer>,
}

impl CpuEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live buffers.
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    fn materialize(&mut self, proxy: &BufferProxy) -> &CpuBuffer {
        self.buffers.entry(proxy.id).or_insert_with(|| CpuBuffer {
            data: RefCell::new(vec![0; proxy.size as usize]),
            label: proxy.name,
        })
    }

    fn write(&mut self, proxy: &BufferProxy, bytes: &[u8]) {
        let buf = self.materialize(proxy);
        let mut data = buf.data.borrow_mut();
        let n = bytes.len().min(data.len());
        data[..n].copy_from_slice(&bytes[..n]);
    }

    /// Typed copy of a live buffer.
    fn read<T: bytemuck::Pod>(&self, proxy: &BufferProxy) -> Result<Vec<T>> {
        let buf = self
            .buffers
            .get(&proxy.id)
            .ok_or(Error::UnavailableBufferUsed(proxy.name, "snapshot"))?;
        Ok(bytemuck::pod_collect_to_vec(&buf.data.borrow()))
    }

    /// Copies the current front buffers of `sync` for host-side sampling.
    pub fn snapshot(&self, sync: &BufferSync) -> Result<FrameSnapshot> {
        let buffers = sync.front_buffers().ok_or(Error::Disposed)?;
        let positions: Vec<PointData> = self.read(&buffers.positions)?;
        let colors: Vec<ColorData> = self.read(&buffers.colors)?;
        Ok(FrameSnapshot::new(
            positions,
            colors,
            sync.counts().to_vec(),
            sync.config(),
        ))
    }
}

impl Engine for CpuEngine {
    fn add_compute_shader(
        &mut self,
        label: &'static str,
        _wgsl: Cow<'static, str>,
        _layout: &[BindType],
        cpu_shader: CpuShaderFn,
    ) -> Result<ShaderId> {
        self.shaders.push(Shader {
            label,
            cpu: cpu_shader,
        });
        Ok(ShaderId(self.shaders.len() - 1))
    }

    fn run_recording(&mut self, recording: &Recording, label: &'static str) -> Result<()> {
        log::trace!("running recording {label} on the CPU");
        for command in &recording.commands {
            match command {
                Command::Upload(proxy, bytes) | Command::UploadUniform(proxy, bytes) => {
                    self.write(proxy, bytes);
                }
                Command::Clear(proxy, offset, size) => {
                    let buf = self.materialize(proxy);
                    let mut data = buf.data.borrow_mut();
                    let start = (*offset as usize).min(data.len());
                    let end = match size {
                        Some(size) => (start + *size as usize).min(data.len()),
                        None => data.len(),
                    };
                    data[start..end].fill(0);
                }
                Command::FreeBuffer(proxy) => {
                    self.buffers.remove(&proxy.id);
                }
                Command::Dispatch(shader_id, (x, _, _), bindings) => {
                    let shader = &self.shaders[shader_id.0];
                    let resources = bindings
                        .iter()
                        .map(|proxy| {
                            self.buffers
                                .get(&proxy.id)
                                .map(|buf| CpuBinding::BufferRW(&buf.data))
                                .ok_or(Error::UnavailableBufferUsed(proxy.name, shader.label))
                        })
                        .collect::<Result<Vec<_>>>()?;
                    (shader.cpu)(*x, &resources);
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for CpuEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuEngine")
            .field("shaders", &self.shaders.iter().map(|s| s.label).collect::<Vec<_>>())
            .field(
                "buffers",
                &self.buffers.values().map(|b| b.label).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proxy(size: u64) -> BufferProxy {
        BufferProxy::new(size, "test")
    }

    #[test]
    fn dispatch_sees_uploaded_bytes() {
        let mut engine = CpuEngine::new();
        let double = engine
            .add_compute_shader(
                "double",
                Cow::Borrowed(""),
                &[BindType::BufReadOnly, BindType::Buffer],
                Box::new(|_, resources| {
                    let src = resources[0].as_slice::<u32>();
                    let mut dst = resources[1].as_slice_mut::<u32>();
                    for (d, s) in dst.iter_mut().zip(src.iter()) {
                        *d = s * 2;
                    }
                }),
            )
            .unwrap();
        let (src, dst) = (proxy(8), proxy(8));
        let mut recording = Recording::default();
        recording.upload(src, bytemuck::cast_slice::<u32, u8>(&[3, 4]).to_vec());
        recording.clear_all(dst);
        recording.dispatch(double, (1, 1, 1), [src, dst]);
        engine.run_recording(&recording, "test").unwrap();
        assert_eq!(engine.read::<u32>(&dst).unwrap(), vec![6, 8]);
    }

    #[test]
    fn freed_buffer_is_unavailable() {
        let mut engine = CpuEngine::new();
        let noop = engine
            .add_compute_shader(
                "noop",
                Cow::Borrowed(""),
                &[BindType::Buffer],
                Box::new(|_, _| {}),
            )
            .unwrap();
        let buf = proxy(4);
        let mut recording = Recording::default();
        recording.clear_all(buf);
        recording.free_buffer(buf);
        recording.dispatch(noop, (1, 1, 1), [buf]);
        let err = engine.run_recording(&recording, "test").unwrap_err();
        assert!(matches!(err, Error::UnavailableBufferUsed("test", "noop")));
        assert_eq!(engine.buffer_count(), 0);
    }
}
