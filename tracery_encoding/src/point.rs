// Copyright 2024 the Tracery Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::fmt;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use peniko::kurbo::Point;
use peniko::Color;

use crate::TransformPatch;

/// A per-point attribute, either a literal value or a function of
/// `(point_index_in_curve, curve_index)`.
///
/// Computed attributes are evaluated once, when a point is created.
#[derive(Clone)]
pub enum Attribute<T> {
    Fixed(T),
    Computed(Arc<dyn Fn(usize, usize) -> T + Send + Sync>),
}

impl<T: Copy> Attribute<T> {
    pub fn computed(f: impl Fn(usize, usize) -> T + Send + Sync + 'static) -> Self {
        Self::Computed(Arc::new(f))
    }

    /// Returns the value for the given point of the given curve.
    pub fn resolve(&self, point: usize, curve: usize) -> T {
        match self {
            Self::Fixed(value) => *value,
            Self::Computed(f) => f(point, curve),
        }
    }
}

impl<T> From<T> for Attribute<T> {
    fn from(value: T) -> Self {
        Self::Fixed(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Attribute<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(value) => f.debug_tuple("Fixed").field(value).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// The mutable "current" attributes applied to each newly created point.
#[derive(Clone, Debug)]
pub struct PointSettings {
    /// Blend between smooth quadratic (0) and sharp polyline (1), in `[0, 1]`.
    pub strength: Attribute<f32>,
    /// Stroke thickness in device pixels. Must be positive.
    pub thickness: Attribute<f32>,
    pub color: Attribute<Color>,
    /// Opacity in `[0, 1]`, multiplied into the alpha channel of `color`.
    pub alpha: Attribute<f32>,
}

impl Default for PointSettings {
    fn default() -> Self {
        Self {
            strength: Attribute::Fixed(0.0),
            thickness: Attribute::Fixed(1.0),
            color: Attribute::Fixed(Color::new([1.0, 1.0, 1.0, 1.0])),
            alpha: Attribute::Fixed(1.0),
        }
    }
}

impl PointSettings {
    /// Overwrites every attribute the patch carries.
    pub fn apply_patch(&mut self, patch: &TransformPatch) {
        if let Some(strength) = &patch.strength {
            self.strength = strength.clone();
        }
        if let Some(thickness) = &patch.thickness {
            self.thickness = thickness.clone();
        }
        if let Some(color) = &patch.color {
            self.color = color.clone();
        }
        if let Some(alpha) = &patch.alpha {
            self.alpha = alpha.clone();
        }
    }

    /// Evaluates every attribute for one point.
    pub fn resolve(&self, point: usize, curve: usize) -> PointAttributes {
        PointAttributes {
            strength: self.strength.resolve(point, curve).clamp(0.0, 1.0),
            thickness: self.thickness.resolve(point, curve).max(0.0),
            color: self.color.resolve(point, curve),
            alpha: self.alpha.resolve(point, curve).clamp(0.0, 1.0),
        }
    }
}

/// A snapshot of [`PointSettings`] taken when a point is created.
#[derive(Copy, Clone, Debug)]
pub struct PointAttributes {
    pub strength: f32,
    pub thickness: f32,
    pub color: Color,
    pub alpha: f32,
}

impl Default for PointAttributes {
    fn default() -> Self {
        PointSettings::default().resolve(0, 0)
    }
}

/// A control point together with the attributes it was created with.
#[derive(Copy, Clone, Debug)]
pub struct CurvePoint {
    pub position: Point,
    pub attributes: PointAttributes,
}

impl CurvePoint {
    pub fn new(position: impl Into<Point>, attributes: PointAttributes) -> Self {
        Self {
            position: position.into(),
            attributes,
        }
    }

    pub fn point_data(&self) -> PointData {
        PointData {
            x: self.position.x as f32,
            y: self.position.y as f32,
            strength: self.attributes.strength,
            thickness: self.attributes.thickness,
        }
    }

    pub fn color_data(&self) -> ColorData {
        let [r, g, b, a] = self.attributes.color.components;
        ColorData {
            r,
            g,
            b,
            a: a * self.attributes.alpha,
        }
    }
}

/// A coordinate handed to the builder, resolved once into a [`CurvePoint`].
#[derive(Clone, Debug)]
pub enum Coordinate {
    /// Transformed by the current transform, using the current attributes.
    Literal(Point),
    /// Like `Literal`, with a patch composed onto the current transform and
    /// attributes for this point only.
    WithPatch(Point, TransformPatch),
    /// An already built point, passed through unchanged.
    Built(CurvePoint),
}

impl From<Point> for Coordinate {
    fn from(p: Point) -> Self {
        Self::Literal(p)
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from(p: (f64, f64)) -> Self {
        Self::Literal(p.into())
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([x, y]: [f64; 2]) -> Self {
        Self::Literal(Point::new(x, y))
    }
}

impl From<((f64, f64), TransformPatch)> for Coordinate {
    fn from((p, patch): ((f64, f64), TransformPatch)) -> Self {
        Self::WithPatch(p.into(), patch)
    }
}

impl From<CurvePoint> for Coordinate {
    fn from(p: CurvePoint) -> Self {
        Self::Built(p)
    }
}

impl From<&CurvePoint> for Coordinate {
    fn from(p: &CurvePoint) -> Self {
        Self::Built(*p)
    }
}

/// Position data of one buffer slot.
///
/// This must be kept in sync with the struct in `shader/shared.wgsl`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Zeroable, Pod)]
#[repr(C)]
pub struct PointData {
    pub x: f32,
    pub y: f32,
    pub strength: f32,
    pub thickness: f32,
}

impl PointData {
    pub fn position(&self) -> Point {
        Point::new(self.x as f64, self.y as f64)
    }

    pub fn with_position(self, p: Point) -> Self {
        Self {
            x: p.x as f32,
            y: p.y as f32,
            ..self
        }
    }
}

/// Color data of one buffer slot, straight (not premultiplied) alpha.
///
/// This must be kept in sync with the struct in `shader/shared.wgsl`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Zeroable, Pod)]
#[repr(C)]
pub struct ColorData {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ColorData {
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }
}

static_assertions::const_assert_eq!(size_of::<PointData>(), 16);
static_assertions::const_assert_eq!(size_of::<ColorData>(), 16);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computed_attribute_sees_indices() {
        let a = Attribute::computed(|point, curve| (point * 10 + curve) as f32);
        assert_eq!(a.resolve(3, 2), 32.0);
        assert_eq!(Attribute::Fixed(0.5_f32).resolve(9, 9), 0.5);
    }

    #[test]
    fn resolve_clamps_ranges() {
        let settings = PointSettings {
            strength: Attribute::Fixed(2.0),
            alpha: Attribute::Fixed(-1.0),
            ..PointSettings::default()
        };
        let attrs = settings.resolve(0, 0);
        assert_eq!(attrs.strength, 1.0);
        assert_eq!(attrs.alpha, 0.0);
    }

    #[test]
    fn alpha_multiplies_color_alpha() {
        let p = CurvePoint::new(
            (1.0, 2.0),
            PointAttributes {
                color: Color::new([0.2, 0.4, 0.6, 0.5]),
                alpha: 0.5,
                ..PointAttributes::default()
            },
        );
        assert_eq!(p.color_data().a, 0.25);
        assert_eq!(p.point_data().x, 1.0);
    }
}
