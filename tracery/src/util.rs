// Copyright 2024 the Tracery Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simple helpers for acquiring a wgpu device without a surface.

use wgpu::{Adapter, Device, Instance, Limits, Queue};

use crate::{Error, Result};

/// A device and queue for compute work, with the adapter they came from.
pub struct DeviceHandle {
    adapter: Adapter,
    pub device: Device,
    pub queue: Queue,
}

impl DeviceHandle {
    /// Requests a device from the adapter selected by the environment, or the
    /// default one.
    pub async fn headless() -> Result<Self> {
        let backends = wgpu::Backends::from_env().unwrap_or_default();
        let flags = wgpu::InstanceFlags::from_build_config().with_env();
        let instance = Instance::new(&wgpu::InstanceDescriptor {
            backends,
            flags,
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::from_env_or_default(),
        });
        Self::request(&instance)
            .await
            .ok_or(Error::NoCompatibleDevice)
    }

    async fn request(instance: &Instance) -> Option<Self> {
        let adapter = wgpu::util::initialize_adapter_from_env_or_default(instance, None)
            .await
            .ok()?;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("tracery"),
                required_features: wgpu::Features::empty(),
                required_limits: Limits::downlevel_defaults(),
                ..Default::default()
            })
            .await
            .ok()?;
        Some(Self {
            adapter,
            device,
            queue,
        })
    }

    /// Returns the adapter associated with the device.
    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }
}
