// Copyright 2024 the Tracery Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rendering strategies built on the curve sampler.
//!
//! Every brush lays out a fixed number of instances per curve slot, computed
//! once from the group's capacity and a [`Spacing`]. Index buffers are built
//! at construction; each frame only rewrites vertices.

mod blob;
mod dash;
mod dot;
mod line;
mod particles;
mod stripe;

pub use blob::{BlobBrush, BlobCenter, BlobOptions};
pub use dash::{DashBrush, DashOptions};
pub use dot::DotBrush;
pub use line::LineBrush;
pub use particles::{Particle, ParticleBrush, ParticleOptions};
pub use stripe::StripeBrush;

use bytemuck::{Pod, Zeroable};
use peniko::kurbo::{Point, Vec2};
use tracery_encoding::{
    progress, sample, Capacity, CurveSample, EndMode, Hooks, InstanceContext, PointBuffers,
    NO_PROGRESS,
};

use crate::group::Group;
use crate::sync::FrameSnapshot;
use crate::{Error, Result};

/// Upper bound on instances per curve, whatever the spacing asks for.
pub const MAX_INSTANCES_PER_CURVE: u32 = 1 << 16;

/// Upper bound on instances across all curves of a brush.
///
/// Four vertices per instance keep every index within `u32`.
pub const MAX_INSTANCES: u32 = 1 << 24;

/// How many instances a brush places along each curve.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Spacing {
    /// One instance every given number of device pixels of the longest curve.
    Pixel(f64),
    /// One instance every given distance in scene units.
    Width(f64),
    /// A fixed number of instances per curve.
    Count(u32),
}

impl Default for Spacing {
    fn default() -> Self {
        Self::Pixel(4.0)
    }
}

/// Device size of the render target. Scene units span its width.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    /// Scene units covered by one device pixel.
    ///
    /// Point thickness is given in device pixels and scaled by this.
    pub fn pixel_size(&self) -> f64 {
        if self.width > 0.0 {
            1.0 / self.width
        } else {
            1.0
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct BrushOptions {
    pub spacing: Spacing,
    pub viewport: Viewport,
    /// End policy; `None` uses the brush's own default.
    pub end_mode: Option<EndMode>,
}

/// Instances per curve for a spacing, at least one.
pub fn instances_per_curve(spacing: Spacing, max_length: f64, viewport: Viewport) -> u32 {
    let estimate = match spacing {
        Spacing::Pixel(px) => max_length * viewport.width / px,
        Spacing::Width(w) => max_length / w,
        Spacing::Count(n) => n as f64,
    };
    if estimate.is_nan() {
        return 1;
    }
    // Float to int casts saturate, so infinities land on the bounds.
    (estimate.floor() as u32).clamp(1, MAX_INSTANCES_PER_CURVE)
}

/// Fixed instance layout of a brush.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    pub max_curves: u32,
    pub instances_per_curve: u32,
}

impl Layout {
    /// Spreads the spacing over the capacity, lowering instances per curve so
    /// that the total stays within [`MAX_INSTANCES`].
    pub fn new(capacity: &Capacity, options: &BrushOptions) -> Self {
        let requested = instances_per_curve(options.spacing, capacity.max_length, options.viewport);
        let max_curves = capacity.max_curves.clamp(1, MAX_INSTANCES);
        let per_curve = requested.min(MAX_INSTANCES / max_curves);
        if per_curve < requested {
            log::warn!(
                "{requested} instances per curve over {max_curves} curves clamped to {per_curve}"
            );
        }
        Self {
            max_curves,
            instances_per_curve: per_curve,
        }
    }

    pub fn instances(&self) -> u32 {
        self.max_curves.saturating_mul(self.instances_per_curve)
    }

    /// Local parameter of an instance, spread evenly over `[0, 1]`.
    pub fn t(&self, instance: u32) -> f32 {
        if self.instances_per_curve > 1 {
            instance as f32 / (self.instances_per_curve - 1) as f32
        } else {
            0.0
        }
    }
}

/// Everything a brush reads in one frame.
#[derive(Copy, Clone)]
pub struct BrushFrame<'a> {
    pub buffers: PointBuffers<'a>,
    pub hooks: &'a dyn Hooks,
    /// Time since the previous frame in seconds.
    pub dt: f64,
}

impl<'a> BrushFrame<'a> {
    pub fn new(snapshot: &'a FrameSnapshot, group: &'a Group) -> Self {
        Self {
            buffers: snapshot.buffers(),
            hooks: group.hooks().as_ref(),
            dt: snapshot.config.dt.into(),
        }
    }

    /// Samples one instance after running its progress through the hooks.
    ///
    /// Slots without a drawable curve sample as [`NO_PROGRESS`].
    pub fn sample_instance(
        &self,
        layout: &Layout,
        curve: u32,
        instance: u32,
        end_mode: EndMode,
    ) -> CurveSample {
        let p = if self.buffers.count(curve as usize) < 2 {
            NO_PROGRESS
        } else {
            progress(curve, layout.t(instance))
        };
        let ctx = InstanceContext {
            curve: curve as usize,
            instance: instance as usize,
            instances_per_curve: layout.instances_per_curve as usize,
        };
        let p = self.hooks.point_progress(p, &ctx);
        sample(p, &self.buffers, end_mode, self.hooks)
    }
}

/// Vertex of brush geometry.
#[derive(Copy, Clone, Debug, Default, PartialEq, Zeroable, Pod)]
#[repr(C)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
    pub uv: [f32; 2],
}

static_assertions::const_assert_eq!(size_of::<Vertex>(), 32);

impl Vertex {
    pub fn new(position: Point, color: [f32; 4], uv: [f32; 2]) -> Self {
        Self {
            position: [position.x as f32, position.y as f32],
            color,
            uv,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Topology {
    TriangleList,
    /// Strips of separate curves are joined by degenerate triangles.
    TriangleStrip,
}

/// Vertices and indices ready for an indexed draw.
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub topology: Topology,
}

impl Geometry {
    fn new(vertex_count: usize, indices: Vec<u32>, topology: Topology) -> Self {
        Self {
            vertices: vec![Vertex::default(); vertex_count],
            indices,
            topology,
        }
    }
}

/// A rendering strategy sampling a group's curves.
pub trait Brush {
    fn name(&self) -> &'static str;

    fn layout(&self) -> Layout;

    /// Rewrites this frame's vertices. Indices never change.
    fn geometry(&mut self, frame: &BrushFrame<'_>) -> &Geometry;
}

/// Capacity of a built group, or [`Error::GroupNotBuilt`].
fn capacity(group: &Group) -> Result<Capacity> {
    group.capacity().ok_or(Error::GroupNotBuilt)
}

/// Writes a left and right vertex per instance, offset by half the sampled
/// thickness along the normal. `pixel` is the scene size of a device pixel.
fn ribbon_vertices(
    frame: &BrushFrame<'_>,
    layout: &Layout,
    end_mode: EndMode,
    pixel: f64,
    vertices: &mut [Vertex],
) {
    let n = layout.instances_per_curve;
    for curve in 0..layout.max_curves {
        for i in 0..n {
            let s = frame.sample_instance(layout, curve, i, end_mode);
            let offset: Vec2 = s.normal() * (s.thickness * pixel * 0.5);
            let color = s.color.to_array();
            let t = layout.t(i);
            let ix = 2 * (curve * n + i) as usize;
            vertices[ix] = Vertex::new(s.position + offset, color, [t, 0.0]);
            vertices[ix + 1] = Vertex::new(s.position - offset, color, [t, 1.0]);
        }
    }
}

/// Appends a strip, repeating the previous last index and the new first
/// index so consecutive strips are joined by degenerate triangles.
fn push_strip(indices: &mut Vec<u32>, strip: impl IntoIterator<Item = u32>) {
    let mut strip = strip.into_iter().peekable();
    if let (Some(&last), Some(&first)) = (indices.last(), strip.peek()) {
        indices.extend([last, first]);
    }
    indices.extend(strip);
}

/// Two triangles per quad of four consecutive vertices.
fn quad_indices(quads: u32) -> Vec<u32> {
    (0..quads)
        .flat_map(|q| {
            let b = q * 4;
            [b, b + 1, b + 2, b + 2, b + 1, b + 3]
        })
        .collect()
}

/// Writes a quad centered on `center`, rotated to `rotation`.
fn write_quad(
    vertices: &mut [Vertex],
    quad: usize,
    center: Point,
    half_extent: Vec2,
    rotation: f64,
    color: [f32; 4],
) {
    let along = Vec2::from_angle(rotation);
    let across = along.turn_90();
    let corners = [(-1.0, -1.0), (1.0, -1.0), (-1.0, 1.0), (1.0, 1.0)];
    for (k, (u, v)) in corners.into_iter().enumerate() {
        let p = center + along * (u * half_extent.x) + across * (v * half_extent.y);
        vertices[quad * 4 + k] = Vertex::new(
            p,
            color,
            [(u as f32 + 1.0) * 0.5, (v as f32 + 1.0) * 0.5],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spacing_counts() {
        let viewport = Viewport {
            width: 800.0,
            height: 600.0,
        };
        assert_eq!(instances_per_curve(Spacing::Count(10), 123.0, viewport), 10);
        assert_eq!(instances_per_curve(Spacing::Count(10), 0.0, viewport), 10);
        assert_eq!(instances_per_curve(Spacing::Count(0), 1.0, viewport), 1);
        // floor(1.5 * 800 / 7) = 171
        assert_eq!(instances_per_curve(Spacing::Pixel(7.0), 1.5, viewport), 171);
        assert_eq!(instances_per_curve(Spacing::Pixel(1e9), 1.5, viewport), 1);
        assert_eq!(instances_per_curve(Spacing::Width(0.25), 1.5, viewport), 6);
        assert_eq!(
            instances_per_curve(Spacing::Width(0.0), 1.5, viewport),
            MAX_INSTANCES_PER_CURVE
        );
        assert_eq!(instances_per_curve(Spacing::Pixel(f64::NAN), 1.5, viewport), 1);
    }

    #[test]
    fn strips_are_stitched() {
        let mut indices = Vec::new();
        push_strip(&mut indices, [0, 1, 2, 3]);
        push_strip(&mut indices, [4, 5, 6, 7]);
        assert_eq!(indices, vec![0, 1, 2, 3, 3, 4, 4, 5, 6, 7]);
    }

    #[test]
    fn layout_spreads_instances() {
        let layout = Layout {
            max_curves: 2,
            instances_per_curve: 5,
        };
        assert_eq!(layout.instances(), 10);
        assert_eq!(layout.t(0), 0.0);
        assert_eq!(layout.t(4), 1.0);
        let single = Layout {
            max_curves: 1,
            instances_per_curve: 1,
        };
        assert_eq!(single.t(0), 0.0);
    }

    #[test]
    fn layout_total_is_bounded() {
        let capacity = Capacity {
            max_curves: tracery_encoding::MAX_CURVES,
            max_points: 2,
            max_length: 1.0,
        };
        let options = BrushOptions {
            spacing: Spacing::Width(0.0),
            ..BrushOptions::default()
        };
        let layout = Layout::new(&capacity, &options);
        assert_eq!(layout.max_curves, tracery_encoding::MAX_CURVES);
        assert_eq!(layout.instances_per_curve, MAX_INSTANCES / tracery_encoding::MAX_CURVES);
        assert_eq!(layout.instances(), MAX_INSTANCES);
        assert!(4 * layout.instances() as u64 <= u32::MAX as u64);
    }

    #[test]
    fn pixel_size_follows_width() {
        let viewport = Viewport {
            width: 800.0,
            height: 600.0,
        };
        assert_eq!(viewport.pixel_size(), 1.0 / 800.0);
        let empty = Viewport {
            width: 0.0,
            height: 0.0,
        };
        assert_eq!(empty.pixel_size(), 1.0);
    }
}
