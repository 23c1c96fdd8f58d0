// Copyright 2024 the Tracery Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::borrow::Cow;

use tracery_shaders::cpu::CpuBinding;

use crate::recording::{BindType, Recording, ShaderId};
use crate::Result;

/// A CPU implementation of a compute shader, called with the workgroup count
/// and the resources bound in dispatch order.
pub type CpuShaderFn = Box<dyn Fn(u32, &[CpuBinding<'_>])>;

/// Executes [`Recording`]s against a set of registered compute shaders.
///
/// Buffers persist across recordings until freed, so a recording may bind a
/// buffer written by an earlier one.
pub trait Engine {
    /// Registers a shader with its WGSL source, binding layout and CPU variant.
    fn add_compute_shader(
        &mut self,
        label: &'static str,
        wgsl: Cow<'static, str>,
        layout: &[BindType],
        cpu_shader: CpuShaderFn,
    ) -> Result<ShaderId>;

    /// Runs every command of `recording` in order.
    fn run_recording(&mut self, recording: &Recording, label: &'static str) -> Result<()>;
}
