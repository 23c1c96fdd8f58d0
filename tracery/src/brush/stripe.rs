// Copyright 2024 the Tracery Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use tracery_encoding::EndMode;

use super::{
    capacity, push_strip, ribbon_vertices, Brush, BrushFrame, BrushOptions, Geometry, Layout,
    Topology,
};
use crate::group::Group;
use crate::Result;

/// A band spanning each pair of consecutive curves.
///
/// Vertices are those of [`LineBrush`](super::LineBrush). The strip of a pair
/// runs from the left edge of its first curve to the right edge of its second,
/// so a trailing unpaired curve renders as a plain ribbon.
#[derive(Clone, Debug)]
pub struct StripeBrush {
    layout: Layout,
    end_mode: EndMode,
    pixel: f64,
    geometry: Geometry,
}

impl StripeBrush {
    pub fn new(group: &Group, options: &BrushOptions) -> Result<Self> {
        let layout = Layout::new(&capacity(group)?, options);
        let n = layout.instances_per_curve;
        let mut indices = Vec::new();
        for first in (0..layout.max_curves).step_by(2) {
            let second = (first + 1).min(layout.max_curves - 1);
            let (a, b) = (2 * first * n, 2 * second * n);
            push_strip(
                &mut indices,
                (0..n).flat_map(|i| [a + 2 * i, b + 2 * i + 1]),
            );
        }
        Ok(Self {
            layout,
            end_mode: options.end_mode.unwrap_or(EndMode::Anchored),
            pixel: options.viewport.pixel_size(),
            geometry: Geometry::new(
                2 * layout.instances() as usize,
                indices,
                Topology::TriangleStrip,
            ),
        })
    }
}

impl Brush for StripeBrush {
    fn name(&self) -> &'static str {
        "stripe"
    }

    fn layout(&self) -> Layout {
        self.layout
    }

    fn geometry(&mut self, frame: &BrushFrame<'_>) -> &Geometry {
        ribbon_vertices(
            frame,
            &self.layout,
            self.end_mode,
            self.pixel,
            &mut self.geometry.vertices,
        );
        &self.geometry
    }
}
