// Copyright 2024 the Tracery Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::borrow::Cow;

use peniko::kurbo::Point;

use crate::{ColorData, PointBuffers, PointData, SyncConfig};

/// Scene-script callbacks invoked at fixed points of the pipeline.
///
/// Every method defaults to the identity. Implementations must be pure
/// functions of their arguments: the advance pass evaluates every slot
/// independently and in no particular order.
pub trait Hooks: Send + Sync {
    /// Rewrites a buffered control point once per frame.
    fn curve_position(&self, previous: PointData, _slot: &SlotContext<'_>) -> PointData {
        previous
    }

    /// Rewrites a buffered control point color once per frame.
    fn curve_color(&self, previous: ColorData, _slot: &SlotContext<'_>) -> ColorData {
        previous
    }

    /// Remaps the progress of a brush instance before it is sampled.
    fn point_progress(&self, progress: f32, _instance: &InstanceContext) -> f32 {
        progress
    }

    fn point_thickness(&self, thickness: f64, _sample: &SampleContext) -> f64 {
        thickness
    }

    fn point_rotate(&self, rotation: f64, _sample: &SampleContext) -> f64 {
        rotation
    }

    fn point_position(&self, position: Point, _sample: &SampleContext) -> Point {
        position
    }

    fn point_color(&self, color: ColorData, _sample: &SampleContext) -> ColorData {
        color
    }

    /// WGSL definitions of `curve_position` and `curve_color` for GPU engines.
    ///
    /// The functions must have the signatures
    /// `fn curve_position(previous: PointData, slot: SlotContext) -> PointData` and
    /// `fn curve_color(previous: ColorData, slot: SlotContext) -> ColorData`.
    /// `None` uses the identity.
    fn advance_wgsl(&self) -> Option<Cow<'static, str>> {
        None
    }
}

/// Hooks that leave everything unchanged.
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultHooks;

impl Hooks for DefaultHooks {}

/// Per-slot context for the advance pass.
#[derive(Copy, Clone, Debug)]
pub struct SlotContext<'a> {
    pub curve: usize,
    pub point: usize,
    /// True point count of the curve.
    pub count: usize,
    /// Position of the point along its curve, in `[0, 1]`.
    pub progress: f32,
    /// Elapsed time in seconds.
    pub time: f32,
    /// Time since the previous frame in seconds.
    pub dt: f32,
    pub config: SyncConfig,
    /// Previous frame values of every slot. Never the values being written.
    pub previous: PointBuffers<'a>,
}

/// Context for one brush instance.
#[derive(Copy, Clone, Debug)]
pub struct InstanceContext {
    pub curve: usize,
    pub instance: usize,
    pub instances_per_curve: usize,
}

/// Context for one sampled position.
#[derive(Copy, Clone, Debug)]
pub struct SampleContext {
    pub curve: usize,
    /// Local parametric position in `[0, 1]`.
    pub t: f32,
    pub progress: f32,
    /// True point count of the curve.
    pub count: usize,
}
