// Copyright 2024 the Tracery Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use peniko::kurbo::{Point, Rect};

use crate::{ColorData, CurvePoint, PointData};

/// Correction applied to the control polygon length to approximate arc length.
///
/// This is a sizing heuristic only; no integration is performed.
pub const LENGTH_FACTOR: f64 = 1.5;

/// An ordered sequence of at least two control points.
///
/// Two points describe a straight line; three or more describe a chain of
/// overlapping quadratic segments (see [`crate::sample_curve`]).
#[derive(Clone, Debug)]
pub struct Curve {
    points: Vec<CurvePoint>,
}

impl Curve {
    /// Creates a curve.
    ///
    /// # Panics
    ///
    /// A curve with fewer than two points is a scene-script bug and panics.
    pub fn new(points: Vec<CurvePoint>) -> Self {
        assert!(
            points.len() >= 2,
            "a curve needs at least 2 points, got {}",
            points.len()
        );
        Self { points }
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut [CurvePoint] {
        &mut self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Point {
        self.points[0].position
    }

    pub fn last(&self) -> Point {
        self.points[self.points.len() - 1].position
    }

    /// Estimated arc length: the control polygon length times [`LENGTH_FACTOR`].
    pub fn length(&self) -> f64 {
        polygon_length(self.points.iter().map(|p| p.position)) * LENGTH_FACTOR
    }

    /// Axis-aligned bounds of the control points.
    pub fn bounds(&self) -> Rect {
        bounds_of(self.points.iter().map(|p| p.position)).unwrap_or(Rect::ZERO)
    }

    pub fn point_data(&self) -> Vec<PointData> {
        self.points.iter().map(CurvePoint::point_data).collect()
    }

    pub fn color_data(&self) -> Vec<ColorData> {
        self.points.iter().map(CurvePoint::color_data).collect()
    }
}

pub(crate) fn polygon_length(points: impl Iterator<Item = Point>) -> f64 {
    let mut total = 0.0;
    let mut prev: Option<Point> = None;
    for p in points {
        if let Some(prev) = prev {
            total += prev.distance(p);
        }
        prev = Some(p);
    }
    total
}

/// Bounds of a point set, `None` when it is empty.
pub fn bounds_of(points: impl IntoIterator<Item = Point>) -> Option<Rect> {
    let mut points = points.into_iter();
    let first = points.next()?;
    Some(points.fold(Rect::from_points(first, first), |r, p| r.union_pt(p)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PointAttributes;

    fn curve(points: &[(f64, f64)]) -> Curve {
        Curve::new(
            points
                .iter()
                .map(|&p| CurvePoint::new(p, PointAttributes::default()))
                .collect(),
        )
    }

    #[test]
    fn straight_unit_curve_length() {
        assert_eq!(curve(&[(0.0, 0.0), (1.0, 0.0)]).length(), 1.5);
    }

    #[test]
    fn polyline_length_sums_segments() {
        let c = curve(&[(0.0, 0.0), (3.0, 4.0), (3.0, 0.0)]);
        assert!((c.length() - 9.0 * LENGTH_FACTOR).abs() < 1e-12);
    }

    #[test]
    fn bounds_cover_points() {
        let c = curve(&[(1.0, 2.0), (-1.0, 5.0), (0.0, 0.0)]);
        assert_eq!(c.bounds(), Rect::new(-1.0, 0.0, 1.0, 5.0));
    }

    #[test]
    #[should_panic(expected = "at least 2 points")]
    fn single_point_curve_panics() {
        curve(&[(0.0, 0.0)]);
    }
}
