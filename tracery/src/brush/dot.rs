// Copyright 2024 the Tracery Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use peniko::kurbo::Vec2;
use tracery_encoding::EndMode;

use super::{
    capacity, quad_indices, write_quad, Brush, BrushFrame, BrushOptions, Geometry, Layout,
    Topology,
};
use crate::group::Group;
use crate::Result;

/// A square sprite at every instance, sized by the sampled thickness in
/// device pixels and turned to the tangent. The uv spans the sprite for round
/// shading.
#[derive(Clone, Debug)]
pub struct DotBrush {
    layout: Layout,
    end_mode: EndMode,
    pixel: f64,
    geometry: Geometry,
}

impl DotBrush {
    pub fn new(group: &Group, options: &BrushOptions) -> Result<Self> {
        let layout = Layout::new(&capacity(group)?, options);
        Ok(Self {
            layout,
            end_mode: options.end_mode.unwrap_or(EndMode::Anchored),
            pixel: options.viewport.pixel_size(),
            geometry: Geometry::new(
                4 * layout.instances() as usize,
                quad_indices(layout.instances()),
                Topology::TriangleList,
            ),
        })
    }
}

impl Brush for DotBrush {
    fn name(&self) -> &'static str {
        "dot"
    }

    fn layout(&self) -> Layout {
        self.layout
    }

    fn geometry(&mut self, frame: &BrushFrame<'_>) -> &Geometry {
        let n = self.layout.instances_per_curve;
        for curve in 0..self.layout.max_curves {
            for i in 0..n {
                let s = frame.sample_instance(&self.layout, curve, i, self.end_mode);
                let r = s.thickness * self.pixel * 0.5;
                write_quad(
                    &mut self.geometry.vertices,
                    (curve * n + i) as usize,
                    s.position,
                    Vec2::new(r, r),
                    s.rotation,
                    s.color.to_array(),
                );
            }
        }
        &self.geometry
    }
}
