// Copyright 2024 the Tracery Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use peniko::kurbo::Point;
use tracery_encoding::{bounds_of, ColorData, EndMode};

use super::{capacity, Brush, BrushFrame, BrushOptions, Geometry, Layout, Topology, Vertex};
use crate::group::Group;
use crate::Result;

/// Where the synthetic center vertex of a blob sits.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum BlobCenter {
    /// Center of the bounds of the control points.
    #[default]
    Bounds,
    /// The first control point.
    First,
    /// Midpoint of the first and last control points.
    Ends,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct BlobOptions {
    pub center: BlobCenter,
}

/// Every curve filled as a triangle fan around one center vertex.
///
/// The ring is sampled like a line; each curve slot owns its instances
/// followed by one center vertex.
#[derive(Clone, Debug)]
pub struct BlobBrush {
    layout: Layout,
    end_mode: EndMode,
    center: BlobCenter,
    geometry: Geometry,
}

impl BlobBrush {
    pub fn new(group: &Group, options: &BrushOptions, blob: BlobOptions) -> Result<Self> {
        let layout = Layout::new(&capacity(group)?, options);
        let n = layout.instances_per_curve;
        let stride = n + 1;
        let mut indices = Vec::with_capacity(3 * layout.instances() as usize);
        for curve in 0..layout.max_curves {
            let base = curve * stride;
            let center = base + n;
            for i in 0..n {
                indices.extend([center, base + i, base + (i + 1) % n]);
            }
        }
        Ok(Self {
            layout,
            end_mode: options.end_mode.unwrap_or(EndMode::Loop),
            center: blob.center,
            geometry: Geometry::new(
                (stride * layout.max_curves) as usize,
                indices,
                Topology::TriangleList,
            ),
        })
    }

    fn center_of(&self, frame: &BrushFrame<'_>, curve: u32) -> Point {
        let (points, _) = frame.buffers.curve(curve as usize);
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            return Point::ZERO;
        };
        match self.center {
            BlobCenter::Bounds => bounds_of(points.iter().map(|p| p.position()))
                .map_or(first.position(), |r| r.center()),
            BlobCenter::First => first.position(),
            BlobCenter::Ends => first.position().midpoint(last.position()),
        }
    }
}

impl Brush for BlobBrush {
    fn name(&self) -> &'static str {
        "blob"
    }

    fn layout(&self) -> Layout {
        self.layout
    }

    fn geometry(&mut self, frame: &BrushFrame<'_>) -> &Geometry {
        let n = self.layout.instances_per_curve;
        let stride = (n + 1) as usize;
        for curve in 0..self.layout.max_curves {
            let base = curve as usize * stride;
            let mut color = [0.0_f32; 4];
            for i in 0..n {
                let s = frame.sample_instance(&self.layout, curve, i, self.end_mode);
                let c = s.color.to_array();
                for (sum, c) in color.iter_mut().zip(c) {
                    *sum += c / n as f32;
                }
                self.geometry.vertices[base + i as usize] =
                    Vertex::new(s.position, c, [self.layout.t(i), 1.0]);
            }
            let color = if frame.buffers.count(curve as usize) < 2 {
                ColorData::TRANSPARENT.to_array()
            } else {
                color
            };
            self.geometry.vertices[base + n as usize] =
                Vertex::new(self.center_of(frame, curve), color, [0.5, 0.0]);
        }
        &self.geometry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brush::Spacing;
    use crate::GroupOptions;
    use tracery_encoding::{DefaultHooks, PointBuffers, PointData};

    fn pd(x: f32, y: f32) -> PointData {
        PointData {
            x,
            y,
            strength: 1.0,
            thickness: 1.0,
        }
    }

    #[test]
    fn fan_around_center() {
        let mut group = Group::new(
            |b| {
                b.new_curve([(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]);
            },
            GroupOptions::default(),
        );
        group.build(0.0);
        let options = BrushOptions {
            spacing: Spacing::Count(8),
            ..BrushOptions::default()
        };
        let mut brush = BlobBrush::new(&group, &options, BlobOptions::default()).unwrap();
        assert_eq!(brush.geometry.indices.len(), 3 * 8);
        assert_eq!(&brush.geometry.indices[..3], &[8, 0, 1]);
        assert_eq!(&brush.geometry.indices[21..], &[8, 7, 0]);

        let positions = [pd(0.0, 0.0), pd(2.0, 0.0), pd(2.0, 2.0), pd(0.0, 2.0)];
        let colors = [ColorData {
            r: 1.0,
            g: 0.0,
            b: 0.0,
            a: 1.0,
        }; 4];
        let frame = BrushFrame {
            buffers: PointBuffers {
                positions: &positions,
                colors: &colors,
                counts: &[4],
                max_points: 4,
            },
            hooks: &DefaultHooks,
            dt: 0.0,
        };
        let geometry = brush.geometry(&frame);
        assert_eq!(geometry.vertices.len(), 9);
        assert_eq!(geometry.vertices[8].position, [1.0, 1.0]);
        assert!((geometry.vertices[8].color[0] - 1.0).abs() < 1e-5);

        let mut brush = BlobBrush::new(
            &group,
            &options,
            BlobOptions {
                center: BlobCenter::Ends,
            },
        )
        .unwrap();
        assert_eq!(brush.geometry(&frame).vertices[8].position, [0.0, 1.0]);
    }
}
