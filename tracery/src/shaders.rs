// Copyright 2024 the Tracery Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Registration of the point buffer passes.

use std::borrow::Cow;
use std::sync::Arc;

use tracery_encoding::Hooks;
use tracery_shaders::cpu::{self, CpuBinding};
use tracery_shaders::SHADERS;

use crate::engine::Engine;
use crate::recording::ShaderId;
use crate::Result;

/// Shaders of one buffer sync.
///
/// The advance pass is specific to the hooks of a group, so every sync
/// registers its own.
#[derive(Copy, Clone, Debug)]
pub struct SyncShaders {
    pub load: ShaderId,
    pub advance: ShaderId,
}

pub(crate) fn sync_shaders<E: Engine + ?Sized>(
    engine: &mut E,
    hooks: &Arc<dyn Hooks>,
) -> Result<SyncShaders> {
    macro_rules! add_shader {
        ($name:ident, $wgsl:expr, $cpu:expr) => {{
            engine.add_compute_shader(
                stringify!($name),
                $wgsl,
                &SHADERS.$name.bindings,
                $cpu,
            )?
        }};
    }

    let load = add_shader!(load, SHADERS.load.wgsl.clone(), Box::new(cpu::load));
    let advance_hooks = Arc::clone(hooks);
    let advance = add_shader!(
        advance,
        Cow::Owned(tracery_shaders::advance_wgsl(
            hooks.advance_wgsl().as_deref()
        )),
        Box::new(move |n_wg: u32, resources: &[CpuBinding<'_>]| {
            cpu::advance(n_wg, resources, &*advance_hooks);
        })
    );
    Ok(SyncShaders { load, advance })
}
