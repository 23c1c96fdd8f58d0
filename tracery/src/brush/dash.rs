// Copyright 2024 the Tracery Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use peniko::kurbo::Vec2;
use tracery_encoding::{progress, sample, CurveSample, EndMode, InstanceContext, Mix};

use super::{
    capacity, quad_indices, write_quad, Brush, BrushFrame, BrushOptions, Geometry, Layout,
    Topology,
};
use crate::group::Group;
use crate::Result;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DashOptions {
    /// Share of each dash's interval covered by the dash, in `[0, 1]`.
    pub length: f64,
    /// Parametric steps per curve of the arc-length search.
    pub substeps: u32,
}

impl Default for DashOptions {
    fn default() -> Self {
        Self {
            length: 0.5,
            substeps: 32,
        }
    }
}

/// Dashes spread evenly by arc length along every curve.
///
/// The sampler is parametric, so each frame every curve is walked in fixed
/// parametric steps to tabulate its arc length. Dash ends are then placed at
/// arc-length offsets and mapped back to parameters through the table.
#[derive(Clone, Debug)]
pub struct DashBrush {
    layout: Layout,
    end_mode: EndMode,
    pixel: f64,
    options: DashOptions,
    geometry: Geometry,
    arc: Vec<f64>,
}

impl DashBrush {
    pub fn new(group: &Group, options: &BrushOptions, dash: DashOptions) -> Result<Self> {
        let layout = Layout::new(&capacity(group)?, options);
        let dash = DashOptions {
            length: dash.length.clamp(0.0, 1.0),
            substeps: dash.substeps.max(1),
        };
        Ok(Self {
            layout,
            end_mode: options.end_mode.unwrap_or(EndMode::Anchored),
            pixel: options.viewport.pixel_size(),
            options: dash,
            geometry: Geometry::new(
                4 * layout.instances() as usize,
                quad_indices(layout.instances()),
                Topology::TriangleList,
            ),
            arc: Vec::with_capacity(dash.substeps as usize + 1),
        })
    }

    /// Fills the cumulative arc-length table of one curve.
    fn tabulate(&mut self, frame: &BrushFrame<'_>, curve: u32) {
        let steps = self.options.substeps;
        self.arc.clear();
        let mut previous: Option<peniko::kurbo::Point> = None;
        let mut total = 0.0;
        for k in 0..=steps {
            let t = k as f32 / steps as f32;
            let s = sample(progress(curve, t), &frame.buffers, self.end_mode, frame.hooks);
            if let Some(p) = previous {
                total += (s.position - p).hypot();
            }
            previous = Some(s.position);
            self.arc.push(total);
        }
    }

    /// Sampler parameter at arc length `s`, from the current table.
    fn t_at(&self, s: f64) -> f32 {
        let total = self.arc.last().copied().unwrap_or(0.0);
        if total <= 0.0 {
            return 0.0;
        }
        let s = s.clamp(0.0, total);
        let k = self.arc.partition_point(|&a| a < s).max(1);
        let (a0, a1) = (self.arc[k - 1], self.arc[k]);
        let u = if a1 > a0 { (s - a0) / (a1 - a0) } else { 0.0 };
        ((k - 1) as f64 + u) as f32 / self.options.substeps as f32
    }

    fn sample_at(&self, frame: &BrushFrame<'_>, ctx: &InstanceContext, t: f32) -> CurveSample {
        let p = frame.hooks.point_progress(progress(ctx.curve as u32, t), ctx);
        sample(p, &frame.buffers, self.end_mode, frame.hooks)
    }
}

impl Brush for DashBrush {
    fn name(&self) -> &'static str {
        "dash"
    }

    fn layout(&self) -> Layout {
        self.layout
    }

    fn geometry(&mut self, frame: &BrushFrame<'_>) -> &Geometry {
        let n = self.layout.instances_per_curve;
        for curve in 0..self.layout.max_curves {
            let drawable = frame.buffers.count(curve as usize) >= 2;
            if drawable {
                self.tabulate(frame, curve);
            }
            let total = self.arc.last().copied().unwrap_or(0.0);
            let interval = total / n as f64;
            for i in 0..n {
                let quad = (curve * n + i) as usize;
                if !drawable {
                    write_quad(
                        &mut self.geometry.vertices,
                        quad,
                        CurveSample::EMPTY.position,
                        Vec2::ZERO,
                        0.0,
                        CurveSample::EMPTY.color.to_array(),
                    );
                    continue;
                }
                let ctx = InstanceContext {
                    curve: curve as usize,
                    instance: i as usize,
                    instances_per_curve: n as usize,
                };
                let center = (i as f64 + 0.5) * interval;
                let half = 0.5 * self.options.length * interval;
                let start = self.sample_at(frame, &ctx, self.t_at(center - half));
                let end = self.sample_at(frame, &ctx, self.t_at(center + half));
                let delta = end.position - start.position;
                let rotation = if delta.hypot2() > 1e-18 {
                    delta.atan2()
                } else {
                    start.rotation
                };
                let thickness = start.thickness.mix(end.thickness, 0.5) * self.pixel;
                write_quad(
                    &mut self.geometry.vertices,
                    quad,
                    start.position.midpoint(end.position),
                    Vec2::new(delta.hypot() * 0.5, thickness * 0.5),
                    rotation,
                    start.color.mix(end.color, 0.5).to_array(),
                );
            }
        }
        &self.geometry
    }
}
