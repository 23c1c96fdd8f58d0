// Copyright 2024 the Tracery Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#[cfg(feature = "multithreading")]
use rayon::prelude::*;
use tracery_encoding::{ColorData, Hooks, PointBuffers, PointData, SlotContext, SyncConfig};

use super::CpuBinding;

fn advance_slot(
    ix: usize,
    config: &SyncConfig,
    previous: &PointBuffers<'_>,
    hooks: &dyn Hooks,
) -> (PointData, ColorData) {
    let max_points = config.max_points as usize;
    let (curve, point) = (ix / max_points, ix % max_points);
    let count = previous.count(curve);
    let position = previous.positions[ix];
    let color = previous.colors[ix];
    // Padding slots carry their value forward untouched.
    if point >= count {
        return (position, color);
    }
    let slot = SlotContext {
        curve,
        point,
        count,
        progress: if count > 1 {
            point as f32 / (count - 1) as f32
        } else {
            0.0
        },
        time: config.time,
        dt: config.dt,
        config: *config,
        previous: *previous,
    };
    (
        hooks.curve_position(position, &slot),
        hooks.curve_color(color, &slot),
    )
}

/// Writes every slot of `next` from the previous frame's buffers.
///
/// Slots are independent: no slot observes a value written in this pass.
pub fn advance_main(
    config: &SyncConfig,
    previous: &PointBuffers<'_>,
    next_positions: &mut [PointData],
    next_colors: &mut [ColorData],
    hooks: &dyn Hooks,
) {
    if config.max_points == 0 {
        return;
    }
    let slots = (config.slots() as usize)
        .min(previous.positions.len())
        .min(previous.colors.len())
        .min(next_positions.len())
        .min(next_colors.len());
    #[cfg(not(feature = "multithreading"))]
    let next = next_positions[..slots]
        .iter_mut()
        .zip(next_colors[..slots].iter_mut());
    #[cfg(feature = "multithreading")]
    let next = next_positions[..slots]
        .par_iter_mut()
        .zip(next_colors[..slots].par_iter_mut());
    next.enumerate().for_each(|(ix, (position, color))| {
        (*position, *color) = advance_slot(ix, config, previous, hooks);
    });
}

pub fn advance(_n_wg: u32, resources: &[CpuBinding<'_>], hooks: &dyn Hooks) {
    let config = resources[0].read_uniform::<SyncConfig>();
    let counts = resources[1].as_slice::<u32>();
    let prev_positions = resources[2].as_slice::<PointData>();
    let prev_colors = resources[3].as_slice::<ColorData>();
    let mut next_positions = resources[4].as_slice_mut::<PointData>();
    let mut next_colors = resources[5].as_slice_mut::<ColorData>();
    let previous = PointBuffers {
        positions: &prev_positions,
        colors: &prev_colors,
        counts: &counts,
        max_points: config.max_points,
    };
    advance_main(
        &config,
        &previous,
        &mut next_positions,
        &mut next_colors,
        hooks,
    );
}
