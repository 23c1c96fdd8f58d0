// Copyright 2024 the Tracery Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::ops::Range;

use peniko::kurbo::{Point, Rect, Vec2};
use smallvec::SmallVec;

use crate::fit::{self, Fit, HAlign, VAlign};
use crate::{
    bounds_of, sample_curve, Coordinate, Curve, CurvePoint, EndMode, PointSettings, Randomness,
    ResetMode, Transform, TransformPatch,
};

/// Stateful drawing context handed to a scene script.
///
/// The builder owns a current [`Transform`], a stack of saved transforms, the
/// current [`PointSettings`] and the script's randomness. Every coordinate is
/// resolved into a [`CurvePoint`] as soon as it is handed over.
pub struct GroupBuilder {
    curves: Vec<Curve>,
    transform: Transform,
    stack: SmallVec<[Transform; 8]>,
    settings: PointSettings,
    random: Randomness,
    time: f64,
}

impl GroupBuilder {
    pub fn new(seed: u64) -> Self {
        Self {
            curves: Vec::new(),
            transform: Transform::IDENTITY,
            stack: SmallVec::new(),
            settings: PointSettings::default(),
            random: Randomness::new(seed),
            time: 0.0,
        }
    }

    /// Prepares the builder for a new run of the scene script.
    ///
    /// Clears every curve and resets the transform, the stack and the point
    /// settings. Randomness restarts from `reseed` when given and from the
    /// previous seed otherwise, so a rebuild without a reseed repeats itself.
    pub fn begin(&mut self, time: f64, reseed: Option<u64>) {
        self.curves.clear();
        self.transform = Transform::IDENTITY;
        self.stack.clear();
        self.settings = PointSettings::default();
        let seed = reseed.unwrap_or(self.random.seed());
        self.random.reseed(seed);
        self.time = time;
    }

    /// Elapsed time in seconds when this build started.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn current_transform(&self) -> Transform {
        self.transform
    }

    pub fn settings(&self) -> &PointSettings {
        &self.settings
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Applies a patch to the drawing state.
    ///
    /// The reset happens first, then the patch transform is composed onto the
    /// current one, then the result is pushed if requested. Attributes carried
    /// by the patch overwrite the current settings.
    pub fn transform(&mut self, patch: &TransformPatch) -> &mut Self {
        match patch.reset {
            Some(ResetMode::Pop) => self.transform = self.pop_saved(),
            Some(ResetMode::Last) => {
                self.transform = self.stack.last().copied().unwrap_or(Transform::IDENTITY);
            }
            Some(ResetMode::Identity) => {
                self.transform = Transform::IDENTITY;
                self.settings = PointSettings::default();
            }
            None => {}
        }
        self.transform = self.transform.compose(&patch.transform);
        if patch.push {
            self.stack.push(self.transform);
        }
        self.settings.apply_patch(patch);
        self
    }

    /// Saves the current transform.
    pub fn push(&mut self) -> &mut Self {
        self.stack.push(self.transform);
        self
    }

    /// Restores the most recently saved transform. An empty stack restores the identity.
    pub fn pop(&mut self) -> &mut Self {
        self.transform = self.pop_saved();
        self
    }

    /// Resets the transform and the point settings.
    pub fn reset(&mut self) -> &mut Self {
        self.transform(&TransformPatch::new().reset(ResetMode::Identity))
    }

    fn pop_saved(&mut self) -> Transform {
        self.stack.pop().unwrap_or_else(|| {
            log::warn!("transform stack underflow, resetting to identity");
            Transform::IDENTITY
        })
    }

    /// Resolves one coordinate as point `point` of curve `curve`.
    fn resolve(&self, coordinate: Coordinate, point: usize, curve: usize) -> CurvePoint {
        match coordinate {
            Coordinate::Literal(p) => CurvePoint {
                position: self.transform.apply(p),
                attributes: self.settings.resolve(point, curve),
            },
            Coordinate::WithPatch(p, patch) => {
                let mut settings = self.settings.clone();
                settings.apply_patch(&patch);
                CurvePoint {
                    position: self.transform.compose(&patch.transform).apply(p),
                    attributes: settings.resolve(point, curve),
                }
            }
            Coordinate::Built(p) => p,
        }
    }

    /// Resolves coordinates into points of the next curve without adding a curve.
    pub fn new_points<C: Into<Coordinate>>(
        &self,
        coordinates: impl IntoIterator<Item = C>,
    ) -> Vec<CurvePoint> {
        let curve = self.curves.len();
        coordinates
            .into_iter()
            .enumerate()
            .map(|(i, c)| self.resolve(c.into(), i, curve))
            .collect()
    }

    /// Adds a curve and returns its index.
    ///
    /// # Panics
    ///
    /// Panics when fewer than two coordinates are given.
    pub fn new_curve<C: Into<Coordinate>>(
        &mut self,
        coordinates: impl IntoIterator<Item = C>,
    ) -> usize {
        let points = self.new_points(coordinates);
        self.curves.push(Curve::new(points));
        self.curves.len() - 1
    }

    /// Replaces every curve built so far.
    pub fn set_curves(&mut self, curves: Vec<Curve>) {
        self.curves = curves;
    }

    pub fn curves(&self) -> &[Curve] {
        &self.curves
    }

    pub fn curves_mut(&mut self) -> &mut [Curve] {
        &mut self.curves
    }

    /// Takes the built curves, leaving the builder empty.
    pub fn take_curves(&mut self) -> Vec<Curve> {
        std::mem::take(&mut self.curves)
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    /// Index range of the last `n` curves.
    pub fn last(&self, n: usize) -> Range<usize> {
        self.curves.len().saturating_sub(n)..self.curves.len()
    }

    /// Calls `f` with `0..n`.
    pub fn repeat(&mut self, n: usize, mut f: impl FnMut(&mut Self, usize)) -> &mut Self {
        for i in 0..n {
            f(self, i);
        }
        self
    }

    pub fn random(&mut self) -> f64 {
        self.random.random()
    }

    pub fn random_range(&mut self, low: f64, high: f64) -> f64 {
        self.random.random_range(low, high)
    }

    /// Next value of the deterministic hash sequence, in `[0, 1)`.
    pub fn hash(&mut self) -> f64 {
        self.random.hash()
    }

    /// Smooth value noise in `[0, 1]`.
    pub fn noise(&self, x: f64) -> f64 {
        self.random.noise(x)
    }

    /// Estimated arc length of one curve.
    pub fn curve_length(&self, curve: usize) -> f64 {
        self.curves[curve].length()
    }

    /// Bounds of the points of the given curves, `None` when there are none.
    pub fn bounds(&self, curves: Range<usize>) -> Option<Rect> {
        bounds_of(
            self.curves[curves]
                .iter()
                .flat_map(|c| c.points().iter().map(|p| p.position)),
        )
    }

    /// Evaluates a built curve at parametric `t`.
    ///
    /// The result is expressed in the current local frame, so it can anchor a
    /// later stroke drawn under the current transform.
    pub fn intersect(&self, curve: usize, t: f64) -> Point {
        let curve = &self.curves[curve];
        let sample = sample_curve(
            &curve.point_data(),
            &curve.color_data(),
            t as f32,
            EndMode::Anchored,
        );
        self.transform.apply_inverse(sample.position)
    }

    /// Remaps the points of `curves` from the `from` box onto the `to` box.
    ///
    /// A zero-area `from` box leaves the points unchanged.
    pub fn within(&mut self, from: Rect, to: Rect, curves: Range<usize>) -> &mut Self {
        fit::remap(self.points_mut(curves), from, to);
        self
    }

    /// Fits the points of `curves` into a target box.
    pub fn fit(&mut self, placement: &Fit, curves: Range<usize>) -> &mut Self {
        let Some(bounds) = self.bounds(curves.clone()) else {
            return self;
        };
        match placement.placement(bounds) {
            Some(to) => self.within(bounds, to, curves),
            None => {
                log::trace!("skipping fit of degenerate bounds {bounds:?}");
                self
            }
        }
    }

    /// Translates `curves` so the named anchor of their bounds lands on `target`.
    pub fn align(
        &mut self,
        target: Point,
        h_align: HAlign,
        v_align: VAlign,
        curves: Range<usize>,
    ) -> &mut Self {
        if let Some(bounds) = self.bounds(curves.clone()) {
            let offset: Vec2 = target - fit::anchor(bounds, h_align, v_align);
            fit::translate(self.points_mut(curves), offset);
        }
        self
    }

    fn points_mut(&mut self, curves: Range<usize>) -> impl Iterator<Item = &mut CurvePoint> {
        self.curves[curves]
            .iter_mut()
            .flat_map(|c| c.points_mut().iter_mut())
    }
}

impl std::fmt::Debug for GroupBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupBuilder")
            .field("curves", &self.curves.len())
            .field("transform", &self.transform)
            .field("stack", &self.stack.len())
            .field("time", &self.time)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Attribute;

    const EPS: f64 = 1e-9;

    fn close(a: Point, b: Point) -> bool {
        (a - b).hypot() < EPS
    }

    #[test]
    fn push_compose_pop_restores() {
        let mut b = GroupBuilder::new(0);
        b.transform(&TransformPatch::new().translate(3.0, -1.0).rotate(0.7).scale(2.0));
        let before = b.current_transform();
        b.push();
        b.transform(&TransformPatch::new().translate(5.0, 5.0).rotate(-1.3).scale_xy(0.5, 3.0));
        assert_ne!(b.current_transform(), before);
        b.pop();
        assert_eq!(b.current_transform(), before);
        assert_eq!(b.stack_depth(), 0);
    }

    #[test]
    fn reset_modes() {
        let mut b = GroupBuilder::new(0);
        let saved = TransformPatch::new().translate(1.0, 2.0).push();
        b.transform(&saved);
        b.transform(&TransformPatch::new().translate(10.0, 0.0));
        b.transform(&TransformPatch::new().reset(ResetMode::Last).translate(0.0, 1.0));
        assert_eq!(b.current_transform().translate, Vec2::new(1.0, 3.0));
        assert_eq!(b.stack_depth(), 1);

        b.transform(&TransformPatch::new().reset(ResetMode::Pop));
        assert_eq!(b.current_transform().translate, Vec2::new(1.0, 2.0));
        assert_eq!(b.stack_depth(), 0);

        b.transform(&TransformPatch::new().thickness(4.0));
        b.transform(&TransformPatch::new().reset(ResetMode::Identity));
        assert_eq!(b.current_transform(), Transform::IDENTITY);
        assert_eq!(b.settings().thickness.resolve(0, 0), 1.0);
    }

    #[test]
    fn literal_points_use_current_transform() {
        let mut b = GroupBuilder::new(0);
        b.transform(&TransformPatch::new().translate(1.0, 1.0).scale(2.0));
        let i = b.new_curve([(0.0, 0.0), (1.0, 0.0)]);
        let curve = &b.curves()[i];
        assert!(close(curve.first(), Point::new(1.0, 1.0)));
        assert!(close(curve.last(), Point::new(3.0, 1.0)));
    }

    #[test]
    fn point_patch_is_local() {
        let mut b = GroupBuilder::new(0);
        b.new_curve([
            Coordinate::from((0.0, 0.0)),
            Coordinate::from(((1.0, 0.0), TransformPatch::new().translate(0.0, 1.0).strength(1.0))),
            Coordinate::from((2.0, 0.0)),
        ]);
        let points = b.curves()[0].points();
        assert!(close(points[1].position, Point::new(1.0, 1.0)));
        assert_eq!(points[1].attributes.strength, 1.0);
        assert!(close(points[2].position, Point::new(2.0, 0.0)));
        assert_eq!(points[2].attributes.strength, 0.0);
    }

    #[test]
    fn built_points_pass_through() {
        let mut b = GroupBuilder::new(0);
        let pts = b.new_points([(4.0, 4.0), (5.0, 5.0)]);
        b.transform(&TransformPatch::new().translate(100.0, 0.0));
        b.new_curve(&pts);
        assert!(close(b.curves()[0].first(), Point::new(4.0, 4.0)));
    }

    #[test]
    fn computed_attributes_see_indices() {
        let mut b = GroupBuilder::new(0);
        b.new_curve([(0.0, 0.0), (1.0, 0.0)]);
        let computed = Attribute::computed(|point, curve| (1 + point + 10 * curve) as f32);
        b.transform(&TransformPatch::new().thickness_with(computed));
        b.new_curve([(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        let thickness: Vec<f32> = b.curves()[1]
            .points()
            .iter()
            .map(|p| p.attributes.thickness)
            .collect();
        assert_eq!(thickness, vec![11.0, 12.0, 13.0]);
    }

    #[test]
    #[should_panic(expected = "at least 2 points")]
    fn one_point_curve_panics() {
        GroupBuilder::new(0).new_curve([(0.0, 0.0)]);
    }

    #[test]
    fn within_same_bounds_is_identity() {
        let mut b = GroupBuilder::new(0);
        b.new_curve([(0.0, 0.0), (2.0, 3.0), (4.0, 1.0)]);
        b.new_curve([(1.0, 1.0), (3.0, 2.0)]);
        let positions = |b: &GroupBuilder| -> Vec<Point> {
            b.curves()
                .iter()
                .flat_map(|c| c.points().iter().map(|p| p.position))
                .collect()
        };
        let before = positions(&b);
        let bounds = b.bounds(0..b.len()).unwrap();
        b.within(bounds, bounds, 0..2);
        let after = positions(&b);
        for (p, q) in before.into_iter().zip(after) {
            assert!((p - q).hypot() < 1e-9);
        }
    }

    #[test]
    fn fit_of_flat_curve_is_noop() {
        let mut b = GroupBuilder::new(0);
        b.new_curve([(0.0, 2.0), (5.0, 2.0)]);
        b.fit(&Fit::new(Rect::new(0.0, 0.0, 1.0, 1.0)), 0..1);
        assert!(close(b.curves()[0].last(), Point::new(5.0, 2.0)));
    }

    #[test]
    fn intersect_returns_local_point() {
        let mut b = GroupBuilder::new(0);
        b.transform(&TransformPatch::new().translate(10.0, 0.0).scale(2.0));
        let stem = b.new_curve([(0.0, 0.0), (0.0, 1.0)]);
        let p = b.intersect(stem, 0.5);
        assert!(close(p, Point::new(0.0, 0.5)));
    }

    #[test]
    fn begin_clears_and_repeats_randomness() {
        let mut b = GroupBuilder::new(9);
        let first = b.random();
        b.new_curve([(0.0, 0.0), (1.0, 1.0)]);
        b.transform(&TransformPatch::new().translate(1.0, 0.0).push());
        b.begin(1.0, None);
        assert!(b.is_empty());
        assert_eq!(b.stack_depth(), 0);
        assert_eq!(b.current_transform(), Transform::IDENTITY);
        assert_eq!(b.random(), first);
        b.begin(2.0, Some(10));
        assert_ne!(b.random(), first);
        assert_eq!(b.time(), 2.0);
    }
}
