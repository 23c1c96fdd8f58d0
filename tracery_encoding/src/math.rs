// Copyright 2024 the Tracery Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use peniko::kurbo::{Affine, Point, Vec2};

/// Decomposed affine transformation, applied as scale, then rotate, then translate.
///
/// Unlike a matrix, composition keeps the three components separate: rotations
/// add and scales multiply, while the translation of the delta is carried
/// through the scale and rotation of the base. See [`Transform::compose`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Transform {
    /// Translation.
    pub translate: Vec2,
    /// Per-axis scale factor. Both components must be non-zero for
    /// [`Transform::apply_inverse`] to be defined.
    pub scale: Vec2,
    /// Rotation in radians.
    pub rotate: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// Identity transform.
    pub const IDENTITY: Self = Self {
        translate: Vec2::ZERO,
        scale: Vec2::new(1.0, 1.0),
        rotate: 0.0,
    };

    pub fn new(translate: impl Into<Vec2>, scale: impl Into<Vec2>, rotate: f64) -> Self {
        Self {
            translate: translate.into(),
            scale: scale.into(),
            rotate,
        }
    }

    pub fn translation(x: f64, y: f64) -> Self {
        Self {
            translate: Vec2::new(x, y),
            ..Self::IDENTITY
        }
    }

    pub fn scaling(x: f64, y: f64) -> Self {
        Self {
            scale: Vec2::new(x, y),
            ..Self::IDENTITY
        }
    }

    pub fn rotation(radians: f64) -> Self {
        Self {
            rotate: radians,
            ..Self::IDENTITY
        }
    }

    /// Composes `delta` onto `self`, expressing `delta` in the local frame of `self`.
    ///
    /// Composition is not commutative.
    #[must_use]
    pub fn compose(&self, delta: &Self) -> Self {
        Self {
            translate: self.translate + rotate(mul(delta.translate, self.scale), self.rotate),
            scale: mul(self.scale, delta.scale),
            rotate: self.rotate + delta.rotate,
        }
    }

    /// Returns the transform `inv` such that `self.compose(&inv)` is the identity.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let scale = Vec2::new(1.0 / self.scale.x, 1.0 / self.scale.y);
        Self {
            translate: mul(rotate(-self.translate, -self.rotate), scale),
            scale,
            rotate: -self.rotate,
        }
    }

    /// Maps `point` from local space into the space of this transform.
    pub fn apply(&self, point: Point) -> Point {
        (rotate(mul(point.to_vec2(), self.scale), self.rotate) + self.translate).to_point()
    }

    /// Exact inverse of [`Transform::apply`]: translate, then rotate, then scale, each undone.
    pub fn apply_inverse(&self, point: Point) -> Point {
        let local = rotate(point.to_vec2() - self.translate, -self.rotate);
        Point::new(local.x / self.scale.x, local.y / self.scale.y)
    }

    /// Applies either the forward or the inverse mapping.
    pub fn apply_with(&self, point: Point, inverse: bool) -> Point {
        if inverse {
            self.apply_inverse(point)
        } else {
            self.apply(point)
        }
    }

    /// Maps a direction, ignoring translation.
    pub fn apply_vector(&self, v: Vec2) -> Vec2 {
        rotate(mul(v, self.scale), self.rotate)
    }

    /// Converts the transform to a kurbo affine matrix.
    pub fn to_kurbo(&self) -> Affine {
        Affine::translate(self.translate)
            * Affine::rotate(self.rotate)
            * Affine::scale_non_uniform(self.scale.x, self.scale.y)
    }
}

/// Rotates `v` counter-clockwise by `radians`.
pub fn rotate(v: Vec2, radians: f64) -> Vec2 {
    let (s, c) = radians.sin_cos();
    Vec2::new(v.x * c - v.y * s, v.x * s + v.y * c)
}

/// Component-wise product.
pub fn mul(a: Vec2, b: Vec2) -> Vec2 {
    Vec2::new(a.x * b.x, a.y * b.y)
}

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

pub fn point_to_f32(point: Point) -> [f32; 2] {
    [point.x as f32, point.y as f32]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const EPS: f64 = 1e-9;

    fn assert_near(a: Point, b: Point) {
        assert!((a - b).hypot() < EPS, "{a:?} != {b:?}");
    }

    fn samples() -> Vec<Transform> {
        vec![
            Transform::IDENTITY,
            Transform::new((3.0, -2.0), (1.0, 1.0), 0.0),
            Transform::new((0.5, 0.25), (2.0, 0.5), PI / 3.0),
            Transform::new((-10.0, 4.0), (-1.5, 3.0), -2.0 * PI / 7.0),
        ]
    }

    #[test]
    fn apply_round_trip() {
        let points = [
            Point::ZERO,
            Point::new(1.0, 0.0),
            Point::new(-3.5, 7.25),
        ];
        for t in samples() {
            for p in points {
                assert_near(t.apply_with(t.apply(p), true), p);
                assert_near(t.apply(t.apply_inverse(p)), p);
            }
        }
    }

    #[test]
    fn order_is_scale_rotate_translate() {
        let t = Transform::new((1.0, 0.0), (2.0, 2.0), PI / 2.0);
        // (1, 0) scales to (2, 0), rotates to (0, 2), translates to (1, 2).
        assert_near(t.apply(Point::new(1.0, 0.0)), Point::new(1.0, 2.0));
    }

    #[test]
    fn compose_matches_nested_apply() {
        let a = Transform::new((1.0, 2.0), (2.0, 2.0), 0.3);
        let b = Transform::new((0.5, -1.0), (0.5, 0.5), -1.1);
        let p = Point::new(0.7, 0.2);
        assert_near(a.compose(&b).apply(p), a.apply(b.apply(p)));
    }

    #[test]
    fn compose_is_not_commutative() {
        let a = Transform::translation(1.0, 0.0);
        let b = Transform::rotation(PI / 2.0);
        assert_ne!(a.compose(&b).translate, b.compose(&a).translate);
    }

    #[test]
    fn compose_with_inverse_is_identity() {
        for t in samples() {
            let id = t.compose(&t.inverse());
            assert!(id.translate.hypot() < EPS);
            assert!((id.scale - Vec2::new(1.0, 1.0)).hypot() < EPS);
            assert!(id.rotate.abs() < EPS);
        }
    }

    #[test]
    fn kurbo_agrees_with_apply() {
        let t = Transform::new((0.5, 0.25), (2.0, 0.5), PI / 3.0);
        let p = Point::new(0.3, -0.8);
        assert_near(t.to_kurbo() * p, t.apply(p));
    }
}
