// Copyright 2024 the Tracery Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use tracery_encoding::EndMode;

use super::{
    capacity, push_strip, ribbon_vertices, Brush, BrushFrame, BrushOptions, Geometry, Layout,
    Topology,
};
use crate::group::Group;
use crate::Result;

/// A continuous ribbon along every curve.
#[derive(Clone, Debug)]
pub struct LineBrush {
    layout: Layout,
    end_mode: EndMode,
    pixel: f64,
    geometry: Geometry,
}

impl LineBrush {
    pub fn new(group: &Group, options: &BrushOptions) -> Result<Self> {
        let layout = Layout::new(&capacity(group)?, options);
        let n = layout.instances_per_curve;
        let mut indices = Vec::new();
        for curve in 0..layout.max_curves {
            let base = 2 * curve * n;
            push_strip(&mut indices, base..base + 2 * n);
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

impl Brush for LineBrush {
    fn name(&self) -> &'static str {
        "line"
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
