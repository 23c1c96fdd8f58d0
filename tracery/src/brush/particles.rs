// Copyright 2024 the Tracery Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use peniko::kurbo::{Point, Rect, Vec2};
use tracery_encoding::{bounds_of, ColorData, EndMode, Randomness};

use super::{
    capacity, quad_indices, write_quad, Brush, BrushFrame, BrushOptions, Geometry, Layout,
    Topology,
};
use crate::group::Group;
use crate::Result;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ParticleOptions {
    pub count: u32,
    /// Side of each particle sprite.
    pub size: f64,
    pub min_speed: f64,
    pub max_speed: f64,
    /// Share of velocity lost per step, in `[0, 1]`.
    pub damping: f64,
    /// Strength of the pull towards each attractor.
    pub attraction: f64,
    /// Strength of the force tangential to each attractor.
    pub spin: f64,
    /// Added to squared distances so forces stay finite at an attractor.
    pub softening: f64,
    pub seed: u64,
    /// Spawn area; `None` uses the bounds of the group's first build.
    pub region: Option<Rect>,
}

impl Default for ParticleOptions {
    fn default() -> Self {
        Self {
            count: 256,
            size: 0.01,
            min_speed: 0.0,
            max_speed: 1.0,
            damping: 0.02,
            attraction: 1e-3,
            spin: 5e-4,
            softening: 1e-3,
            seed: 0,
            region: None,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Particle {
    pub position: Point,
    pub velocity: Vec2,
}

#[derive(Copy, Clone, Debug)]
struct Attractor {
    position: Point,
    color: ColorData,
}

/// A free particle population pulled around by the curves.
///
/// Curves are not drawn. Every sampled instance acts as a point attractor
/// with an inverse-square pull and a tangential spin, and particles are
/// integrated with explicit Euler steps each frame.
#[derive(Clone, Debug)]
pub struct ParticleBrush {
    layout: Layout,
    end_mode: EndMode,
    options: ParticleOptions,
    particles: Vec<Particle>,
    attractors: Vec<Attractor>,
    geometry: Geometry,
}

impl ParticleBrush {
    pub fn new(group: &Group, options: &BrushOptions, particles: ParticleOptions) -> Result<Self> {
        let layout = Layout::new(&capacity(group)?, options);
        let region = particles
            .region
            .or_else(|| {
                bounds_of(
                    group
                        .curves()
                        .iter()
                        .flat_map(|c| c.points().iter().map(|p| p.position)),
                )
            })
            .unwrap_or(Rect::new(0.0, 0.0, 1.0, 1.0));
        let mut random = Randomness::new(particles.seed);
        let spawned = (0..particles.count)
            .map(|_| Particle {
                position: Point::new(
                    random.random_range(region.x0, region.x1),
                    random.random_range(region.y0, region.y1),
                ),
                velocity: Vec2::ZERO,
            })
            .collect();
        Ok(Self {
            layout,
            end_mode: options.end_mode.unwrap_or(EndMode::Open),
            options: particles,
            particles: spawned,
            attractors: Vec::with_capacity(layout.instances() as usize),
            geometry: Geometry::new(
                4 * particles.count as usize,
                quad_indices(particles.count),
                Topology::TriangleList,
            ),
        })
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Samples the attractors of this frame and advances every particle by `frame.dt`.
    pub fn step(&mut self, frame: &BrushFrame<'_>) {
        self.attractors.clear();
        for curve in 0..self.layout.max_curves {
            if frame.buffers.count(curve as usize) < 2 {
                continue;
            }
            for i in 0..self.layout.instances_per_curve {
                let s = frame.sample_instance(&self.layout, curve, i, self.end_mode);
                self.attractors.push(Attractor {
                    position: s.position,
                    color: s.color,
                });
            }
        }
        let o = &self.options;
        let dt = frame.dt;
        for particle in &mut self.particles {
            let mut force = Vec2::ZERO;
            for a in &self.attractors {
                let d = a.position - particle.position;
                let r2 = d.hypot2() + o.softening;
                let dir = d / r2.sqrt();
                force += (dir * o.attraction + dir.turn_90() * o.spin) / r2;
            }
            let mut velocity = particle.velocity + force * dt;
            let speed = velocity.hypot();
            if speed > o.max_speed {
                velocity *= o.max_speed / speed;
            } else if speed > 0.0 && speed < o.min_speed {
                velocity *= o.min_speed / speed;
            }
            velocity *= 1.0 - o.damping.clamp(0.0, 1.0);
            particle.velocity = velocity;
            particle.position += velocity * dt;
        }
    }

    /// Attractor colors weighted by inverse squared distance.
    fn color_at(&self, p: Point) -> [f32; 4] {
        let mut sum = [0.0_f64; 4];
        let mut weight = 0.0;
        for a in &self.attractors {
            let w = 1.0 / ((a.position - p).hypot2() + self.options.softening);
            for (s, c) in sum.iter_mut().zip(a.color.to_array()) {
                *s += w * c as f64;
            }
            weight += w;
        }
        if weight <= 0.0 {
            return ColorData::TRANSPARENT.to_array();
        }
        sum.map(|s| (s / weight) as f32)
    }
}

impl Brush for ParticleBrush {
    fn name(&self) -> &'static str {
        "particles"
    }

    fn layout(&self) -> Layout {
        self.layout
    }

    fn geometry(&mut self, frame: &BrushFrame<'_>) -> &Geometry {
        self.step(frame);
        let half = self.options.size * 0.5;
        for (ix, particle) in self.particles.iter().enumerate() {
            let rotation = particle.velocity.atan2();
            let color = self.color_at(particle.position);
            write_quad(
                &mut self.geometry.vertices,
                ix,
                particle.position,
                Vec2::new(half, half),
                rotation,
                color,
            );
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

    fn setup(options: ParticleOptions) -> ParticleBrush {
        let mut group = Group::new(
            |b| {
                b.new_curve([(0.0, 0.0), (0.0, 0.0)]);
            },
            GroupOptions::default(),
        );
        group.build(0.0);
        let brush_options = BrushOptions {
            spacing: Spacing::Count(1),
            ..BrushOptions::default()
        };
        ParticleBrush::new(&group, &brush_options, options).unwrap()
    }

    fn origin_frame<'a>(positions: &'a [PointData], colors: &'a [ColorData]) -> BrushFrame<'a> {
        BrushFrame {
            buffers: PointBuffers {
                positions,
                colors,
                counts: &[2],
                max_points: 2,
            },
            hooks: &DefaultHooks,
            dt: 0.1,
        }
    }

    #[test]
    fn particles_fall_towards_attractor() {
        let mut brush = setup(ParticleOptions {
            count: 1,
            attraction: 1.0,
            spin: 0.0,
            damping: 0.0,
            max_speed: 10.0,
            region: Some(Rect::new(1.0, 0.0, 1.0, 0.0)),
            ..ParticleOptions::default()
        });
        assert_eq!(brush.particles()[0].position, Point::new(1.0, 0.0));
        let positions = [PointData::default(); 2];
        let colors = [ColorData::default(); 2];
        let frame = origin_frame(&positions, &colors);
        brush.step(&frame);
        let p = brush.particles()[0];
        assert!(p.velocity.x < 0.0);
        assert!(p.velocity.y.abs() < 1e-9);
        assert!(p.position.x < 1.0);
    }

    #[test]
    fn speed_is_clamped_then_damped() {
        let mut brush = setup(ParticleOptions {
            count: 1,
            attraction: 1e6,
            spin: 0.0,
            damping: 0.5,
            max_speed: 2.0,
            region: Some(Rect::new(1.0, 0.0, 1.0, 0.0)),
            ..ParticleOptions::default()
        });
        let positions = [PointData::default(); 2];
        let colors = [ColorData::default(); 2];
        brush.step(&origin_frame(&positions, &colors));
        assert!((brush.particles()[0].velocity.hypot() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn spin_is_tangential() {
        let mut brush = setup(ParticleOptions {
            count: 1,
            attraction: 0.0,
            spin: 1.0,
            damping: 0.0,
            max_speed: 10.0,
            region: Some(Rect::new(1.0, 0.0, 1.0, 0.0)),
            ..ParticleOptions::default()
        });
        let positions = [PointData::default(); 2];
        let colors = [ColorData::default(); 2];
        brush.step(&origin_frame(&positions, &colors));
        let v = brush.particles()[0].velocity;
        assert!(v.x.abs() < 1e-9);
        assert!(v.y != 0.0);
    }
}
