// Copyright 2024 the Tracery Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use tracery_encoding::{ColorData, PointData, SyncConfig};

use super::CpuBinding;

pub fn load_main(
    config: &SyncConfig,
    staging_positions: &[PointData],
    staging_colors: &[ColorData],
    positions: [&mut [PointData]; 2],
    colors: [&mut [ColorData]; 2],
) {
    let slots = config.slots() as usize;
    for buf in positions {
        let n = slots.min(buf.len()).min(staging_positions.len());
        buf[..n].copy_from_slice(&staging_positions[..n]);
    }
    for buf in colors {
        let n = slots.min(buf.len()).min(staging_colors.len());
        buf[..n].copy_from_slice(&staging_colors[..n]);
    }
}

pub fn load(_n_wg: u32, resources: &[CpuBinding<'_>]) {
    let config = resources[0].read_uniform::<SyncConfig>();
    let staging_positions = resources[1].as_slice::<PointData>();
    let staging_colors = resources[2].as_slice::<ColorData>();
    let mut positions_a = resources[3].as_slice_mut::<PointData>();
    let mut colors_a = resources[4].as_slice_mut::<ColorData>();
    let mut positions_b = resources[5].as_slice_mut::<PointData>();
    let mut colors_b = resources[6].as_slice_mut::<ColorData>();
    load_main(
        &config,
        &staging_positions,
        &staging_colors,
        [&mut positions_a, &mut positions_b],
        [&mut colors_a, &mut colors_b],
    );
}
