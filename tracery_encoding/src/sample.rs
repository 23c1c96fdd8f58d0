// Copyright 2024 the Tracery Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Evaluation of buffered curves at a "progress" value.
//!
//! A progress value encodes both the curve (integer part) and the parametric
//! position along that curve (fractional part). Parametric position is not
//! arc length; see the dash brush for the arc-length search built on top.

use peniko::kurbo::{Point, Vec2};

use crate::{ColorData, Hooks, PointData, SampleContext};

/// Progress value meaning "render nothing".
pub const NO_PROGRESS: f32 = -1.0;

/// Largest local parameter encoded by [`progress`], keeping the integer part
/// on the intended curve.
pub const MAX_LOCAL_T: f32 = 0.9999;

/// How the ends of a curve with three or more points are treated.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum EndMode {
    /// Every segment boundary is averaged with its neighbour, including the
    /// first and last, so the curve starts and ends between authored points.
    #[default]
    Open,
    /// As `Open`, but the first and last authored points are passed through exactly.
    Anchored,
    /// Point indices wrap modulo the point count, closing the curve.
    Loop,
}

/// Result of sampling a curve.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CurveSample {
    pub position: Point,
    /// Angle of the tangent in radians.
    pub rotation: f64,
    pub thickness: f64,
    pub color: ColorData,
}

impl CurveSample {
    /// Degenerate, fully transparent sample.
    pub const EMPTY: Self = Self {
        position: Point::ZERO,
        rotation: 0.0,
        thickness: 0.0,
        color: ColorData::TRANSPARENT,
    };

    /// Unit normal to the tangent, pointing to the left of the direction of travel.
    pub fn normal(&self) -> Vec2 {
        Vec2::from_angle(self.rotation).turn_90()
    }
}

/// Encodes a curve index and a local parameter in `[0, 1]` as a progress value.
///
/// From curve 8192 on, the `f32` spacing is coarser than `1 - MAX_LOCAL_T`,
/// so the value is clamped to the largest float below the next curve. The
/// local parameter loses precision there but the curve index stays exact.
pub fn progress(curve: u32, t: f32) -> f32 {
    let base = curve as f32;
    let below_next = f32::from_bits((base + 1.0).to_bits() - 1);
    (base + t.clamp(0.0, 1.0) * MAX_LOCAL_T)
        .min(below_next)
        .max(base)
}

/// Splits a progress value into curve index and local parameter.
///
/// Returns `None` for the [`NO_PROGRESS`] sentinel and any other negative or
/// non-finite value.
pub fn decode_progress(progress: f32) -> Option<(usize, f32)> {
    if progress == NO_PROGRESS || !progress.is_finite() || progress < 0.0 {
        return None;
    }
    let curve = progress.floor();
    Some((curve as usize, ((progress - curve) / MAX_LOCAL_T).min(1.0)))
}

/// Read-only view of one frame's point buffers.
#[derive(Copy, Clone, Debug)]
pub struct PointBuffers<'a> {
    /// `max_curves * max_points` slots, indexed `curve * max_points + point`.
    pub positions: &'a [PointData],
    pub colors: &'a [ColorData],
    /// True (unpadded) point count of each curve slot.
    pub counts: &'a [u32],
    pub max_points: u32,
}

impl<'a> PointBuffers<'a> {
    pub fn n_curves(&self) -> usize {
        self.counts.len()
    }

    /// Point count of the curve in `slot`, zero for empty or out of range slots.
    pub fn count(&self, slot: usize) -> usize {
        self.counts
            .get(slot)
            .map_or(0, |&n| (n as usize).min(self.max_points as usize))
    }

    /// The unpadded points and colors of one curve slot.
    pub fn curve(&self, slot: usize) -> (&'a [PointData], &'a [ColorData]) {
        let n = self.count(slot);
        let start = slot * self.max_points as usize;
        let end = start + n;
        if end > self.positions.len() || end > self.colors.len() {
            return (&[], &[]);
        }
        (&self.positions[start..end], &self.colors[start..end])
    }
}

/// Samples one curve at local parameter `t` without applying any hooks.
///
/// Fewer than two points yield [`CurveSample::EMPTY`].
pub fn sample_curve(
    points: &[PointData],
    colors: &[ColorData],
    t: f32,
    end_mode: EndMode,
) -> CurveSample {
    let n = points.len().min(colors.len());
    if n < 2 {
        return CurveSample::EMPTY;
    }
    let t = t.clamp(0.0, 1.0) as f64;
    if n == 2 {
        let (p0, p1) = (points[0], points[1]);
        let delta = p1.position() - p0.position();
        return CurveSample {
            position: p0.position().lerp(p1.position(), t),
            rotation: delta.atan2(),
            thickness: (p0.thickness as f64).mix(p1.thickness as f64, t),
            color: colors[0].mix(colors[1], t),
        };
    }

    let segments = match end_mode {
        EndMode::Loop => n,
        EndMode::Open | EndMode::Anchored => n - 2,
    };
    let scaled = t * segments as f64;
    let k = (scaled.floor() as usize).min(segments - 1);
    let u = scaled - k as f64;
    let ix = [k % n, (k + 1) % n, (k + 2) % n];
    let sharp_start = end_mode == EndMode::Anchored && k == 0;
    let sharp_end = end_mode == EndMode::Anchored && k == segments - 1;

    let strength = points[ix[1]].strength.clamp(0.0, 1.0) as f64;
    let s = strength * strength;

    let pos = ix.map(|i| points[i].position().to_vec2());
    let pos = boundaries(pos, sharp_start, sharp_end);
    let thickness = boundaries(ix.map(|i| points[i].thickness as f64), sharp_start, sharp_end);
    let color = boundaries(ix.map(|i| colors[i]), sharp_start, sharp_end);

    let dir = tangent(pos, u).mix(polyline_tangent(pos, u), s);
    let dir = if dir.hypot2() > 1e-18 {
        dir
    } else {
        pos[2] - pos[0]
    };

    CurveSample {
        position: blend(pos, u, s).to_point(),
        rotation: dir.atan2(),
        thickness: blend(thickness, u, s),
        color: blend(color, u, s),
    }
}

/// Samples the group at `progress`, then applies the point hooks in order:
/// thickness, rotation, position, color.
pub fn sample(
    progress: f32,
    buffers: &PointBuffers<'_>,
    end_mode: EndMode,
    hooks: &dyn Hooks,
) -> CurveSample {
    // The sentinel must be handled before any count dependent math.
    let Some((curve, t)) = decode_progress(progress) else {
        return CurveSample::EMPTY;
    };
    if curve >= buffers.n_curves() {
        return CurveSample::EMPTY;
    }
    let (points, colors) = buffers.curve(curve);
    let raw = sample_curve(points, colors, t, end_mode);
    if points.len() < 2 {
        return raw;
    }
    let ctx = SampleContext {
        curve,
        t,
        progress,
        count: points.len(),
    };
    let thickness = hooks.point_thickness(raw.thickness, &ctx);
    let rotation = hooks.point_rotate(raw.rotation, &ctx);
    let position = hooks.point_position(raw.position, &ctx);
    let color = hooks.point_color(raw.color, &ctx);
    CurveSample {
        position,
        rotation,
        thickness,
        color,
    }
}

/// Linear interpolation between two values of the same kind.
pub trait Mix: Copy {
    #[must_use]
    fn mix(self, other: Self, t: f64) -> Self;
}

impl Mix for f64 {
    fn mix(self, other: Self, t: f64) -> Self {
        self + (other - self) * t
    }
}

impl Mix for Vec2 {
    fn mix(self, other: Self, t: f64) -> Self {
        self.lerp(other, t)
    }
}

impl Mix for ColorData {
    fn mix(self, other: Self, t: f64) -> Self {
        self.lerp(other, t as f32)
    }
}

/// Replaces the segment's outer control values by the midpoints shared with
/// the neighbouring segments, unless that end is sharp.
fn boundaries<T: Mix>(q: [T; 3], sharp_start: bool, sharp_end: bool) -> [T; 3] {
    let start = if sharp_start { q[0] } else { q[0].mix(q[1], 0.5) };
    let end = if sharp_end { q[2] } else { q[1].mix(q[2], 0.5) };
    [start, q[1], end]
}

fn quadratic<T: Mix>(q: [T; 3], u: f64) -> T {
    q[0].mix(q[1], u).mix(q[1].mix(q[2], u), u)
}

fn polyline<T: Mix>(q: [T; 3], u: f64) -> T {
    if u < 0.5 {
        q[0].mix(q[1], u * 2.0)
    } else {
        q[1].mix(q[2], u * 2.0 - 1.0)
    }
}

/// Quadratic Bézier and polyline through the same controls, blended by `s`.
fn blend<T: Mix>(q: [T; 3], u: f64, s: f64) -> T {
    quadratic(q, u).mix(polyline(q, u), s)
}

fn tangent(q: [Vec2; 3], u: f64) -> Vec2 {
    (q[1] - q[0]) * (2.0 * (1.0 - u)) + (q[2] - q[1]) * (2.0 * u)
}

fn polyline_tangent(q: [Vec2; 3], u: f64) -> Vec2 {
    if u < 0.5 {
        (q[1] - q[0]) * 2.0
    } else {
        (q[2] - q[1]) * 2.0
    }
}
