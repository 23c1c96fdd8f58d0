// Copyright 2024 the Tracery Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounding box fitting and alignment of built points.

use peniko::kurbo::{Point, Rect, Vec2};

use crate::CurvePoint;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum HAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// Vertical anchor. The y axis points up, so `Top` is the largest y.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum VAlign {
    Bottom,
    #[default]
    Middle,
    Top,
}

/// Placement of a set of points inside a target rectangle.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Fit {
    pub target: Rect,
    pub h_align: HAlign,
    pub v_align: VAlign,
    /// Scale both axes by the same factor, leaving slack on one axis.
    pub preserve_aspect: bool,
}

impl Fit {
    /// Uniform fit, centered in `target`.
    pub fn new(target: Rect) -> Self {
        Self {
            target,
            h_align: HAlign::Center,
            v_align: VAlign::Middle,
            preserve_aspect: true,
        }
    }

    #[must_use]
    pub fn align(mut self, h_align: HAlign, v_align: VAlign) -> Self {
        self.h_align = h_align;
        self.v_align = v_align;
        self
    }

    /// Fill the target exactly, scaling each axis independently.
    #[must_use]
    pub fn stretch(mut self) -> Self {
        self.preserve_aspect = false;
        self
    }

    /// The rectangle `bounds` is mapped onto, or `None` for a zero-area box.
    pub fn placement(&self, bounds: Rect) -> Option<Rect> {
        if bounds.area() == 0.0 || !bounds.is_finite() {
            return None;
        }
        if !self.preserve_aspect {
            return Some(self.target);
        }
        let target = self.target.abs();
        let scale = (target.width() / bounds.width()).min(target.height() / bounds.height());
        let size = bounds.size() * scale;
        let placed = Rect::from_origin_size(Point::ZERO, size);
        Some(placed + anchor_offset(placed, target, self.h_align, self.v_align))
    }
}

/// Offset that moves the named anchor of `rect` onto the same anchor of `target`.
pub fn anchor_offset(rect: Rect, target: Rect, h_align: HAlign, v_align: VAlign) -> Vec2 {
    anchor(target, h_align, v_align) - anchor(rect, h_align, v_align)
}

/// The named anchor point of `rect`.
pub fn anchor(rect: Rect, h_align: HAlign, v_align: VAlign) -> Point {
    let rect = rect.abs();
    let x = match h_align {
        HAlign::Left => rect.x0,
        HAlign::Center => rect.center().x,
        HAlign::Right => rect.x1,
    };
    let y = match v_align {
        VAlign::Bottom => rect.y0,
        VAlign::Middle => rect.center().y,
        VAlign::Top => rect.y1,
    };
    Point::new(x, y)
}

/// Remaps points from `from` onto `to`: `(p - min) / size * target_size + target_origin`.
///
/// Returns `false` and leaves the points untouched when `from` has zero area.
pub fn remap<'a>(
    points: impl IntoIterator<Item = &'a mut CurvePoint>,
    from: Rect,
    to: Rect,
) -> bool {
    if from.area() == 0.0 || !from.is_finite() {
        log::trace!("skipping fit of zero-area bounds {from:?}");
        return false;
    }
    let scale = Vec2::new(to.width() / from.width(), to.height() / from.height());
    for point in points {
        let local = point.position - from.origin();
        point.position = Point::new(
            to.x0 + local.x * scale.x,
            to.y0 + local.y * scale.y,
        );
    }
    true
}

pub fn translate<'a>(points: impl IntoIterator<Item = &'a mut CurvePoint>, offset: Vec2) {
    for point in points {
        point.position += offset;
    }
}
