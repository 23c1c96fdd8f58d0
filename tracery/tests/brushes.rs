// Copyright 2024 the Tracery Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Brushes sampling a group advanced on the CPU engine.

use tracery::brush::{
    BlobBrush, BlobOptions, Brush, BrushFrame, BrushOptions, DashBrush, DashOptions, DotBrush,
    LineBrush, ParticleBrush, ParticleOptions, Spacing, StripeBrush, Topology, Viewport,
};
use tracery::encoding::{InstanceContext, NO_PROGRESS};
use tracery::{BufferSync, CpuEngine, Error, Frame, Group, GroupOptions, Hooks, TextOptions};

fn count(n: u32) -> BrushOptions {
    BrushOptions {
        spacing: Spacing::Count(n),
        ..BrushOptions::default()
    }
}

fn horizontal_lines(n: usize) -> Group {
    let mut group = Group::new(
        move |b| {
            for i in 0..n {
                b.new_curve([(0.0, i as f64), (1.0, i as f64)]);
            }
        },
        GroupOptions::default(),
    );
    group.build(0.0);
    group
}

fn advanced(group: Group) -> (CpuEngine, BufferSync) {
    let mut engine = CpuEngine::new();
    let mut sync = BufferSync::new(&mut engine, group).unwrap();
    sync.frame(&mut engine, Frame::at(16.0)).unwrap();
    (engine, sync)
}

#[test]
fn brushes_need_a_built_group() {
    let group = Group::new(|_| {}, GroupOptions::default());
    assert!(matches!(
        LineBrush::new(&group, &count(4)),
        Err(Error::GroupNotBuilt)
    ));
    assert!(matches!(
        ParticleBrush::new(&group, &count(4), ParticleOptions::default()),
        Err(Error::GroupNotBuilt)
    ));
}

#[test]
fn count_spacing_is_exact() {
    let group = horizontal_lines(2);
    let brush = LineBrush::new(&group, &count(10)).unwrap();
    assert_eq!(brush.layout().instances_per_curve, 10);
    assert_eq!(brush.layout().instances(), 20);
}

#[test]
fn pixel_spacing_uses_longest_curve() {
    let group = horizontal_lines(1);
    let options = BrushOptions {
        spacing: Spacing::Pixel(3.0),
        viewport: Viewport {
            width: 100.0,
            height: 100.0,
        },
        end_mode: None,
    };
    let brush = DotBrush::new(&group, &options).unwrap();
    // floor(1.5 * 100 / 3) = 50
    assert_eq!(brush.layout().instances_per_curve, 50);
}

fn on_800_wide(n: u32) -> BrushOptions {
    BrushOptions {
        viewport: Viewport {
            width: 800.0,
            height: 600.0,
        },
        ..count(n)
    }
}

#[test]
fn line_ribbon_spans_thickness() {
    let mut group = Group::new(
        |b| {
            // 160 device pixels of an 800 pixel wide viewport.
            b.transform(&tracery::TransformPatch::new().thickness(160.0));
            b.new_curve([(0.0, 0.0), (1.0, 0.0)]);
        },
        GroupOptions::default(),
    );
    group.build(0.0);
    let (engine, sync) = advanced(group);
    let mut brush = LineBrush::new(sync.group(), &on_800_wide(3)).unwrap();
    let snapshot = engine.snapshot(&sync).unwrap();
    let geometry = brush.geometry(&BrushFrame::new(&snapshot, sync.group()));
    assert_eq!(geometry.topology, Topology::TriangleStrip);
    assert_eq!(geometry.vertices.len(), 6);
    assert_eq!(geometry.indices, vec![0, 1, 2, 3, 4, 5]);
    let [left, right] = [geometry.vertices[2], geometry.vertices[3]];
    assert!((left.position[0] - 0.5).abs() < 1e-4);
    assert!((left.position[1] - 0.1).abs() < 1e-4);
    assert!((right.position[1] + 0.1).abs() < 1e-4);
}

#[test]
fn default_thickness_is_one_pixel() {
    let group = horizontal_lines(1);
    let (engine, sync) = advanced(group);
    let snapshot = engine.snapshot(&sync).unwrap();
    let frame = BrushFrame::new(&snapshot, sync.group());
    let pixel = 1.0 / 800.0;

    let mut line = LineBrush::new(sync.group(), &on_800_wide(3)).unwrap();
    let g = line.geometry(&frame);
    let width = g.vertices[2].position[1] - g.vertices[3].position[1];
    assert!((width - pixel).abs() < 1e-6, "ribbon width {width}");

    let mut dots = DotBrush::new(sync.group(), &on_800_wide(3)).unwrap();
    let g = dots.geometry(&frame);
    // Corners 0 and 2 of a dot differ across the tangent only.
    let side = g.vertices[2].position[1] - g.vertices[0].position[1];
    assert!((side - pixel).abs() < 1e-6, "dot side {side}");
}

#[test]
fn geometry_sizes() {
    let group = horizontal_lines(3);
    let (engine, sync) = advanced(group);
    let snapshot = engine.snapshot(&sync).unwrap();
    let frame = BrushFrame::new(&snapshot, sync.group());
    let options = count(4);

    let mut line = LineBrush::new(sync.group(), &options).unwrap();
    let g = line.geometry(&frame);
    assert_eq!(g.vertices.len(), 3 * 4 * 2);
    // Three strips of 8 joined by two stitches of 2.
    assert_eq!(g.indices.len(), 3 * 8 + 2 * 2);

    let mut stripe = StripeBrush::new(sync.group(), &options).unwrap();
    let g = stripe.geometry(&frame);
    assert_eq!(g.vertices.len(), 3 * 4 * 2);
    // One pair plus the unpaired last curve.
    assert_eq!(g.indices.len(), 2 * 8 + 2);
    assert_eq!(&g.indices[..4], &[0, 9, 2, 11]);

    let mut dot = DotBrush::new(sync.group(), &options).unwrap();
    let g = dot.geometry(&frame);
    assert_eq!(g.topology, Topology::TriangleList);
    assert_eq!((g.vertices.len(), g.indices.len()), (12 * 4, 12 * 6));

    let mut dash = DashBrush::new(sync.group(), &options, DashOptions::default()).unwrap();
    let g = dash.geometry(&frame);
    assert_eq!((g.vertices.len(), g.indices.len()), (12 * 4, 12 * 6));

    let mut blob = BlobBrush::new(sync.group(), &options, BlobOptions::default()).unwrap();
    let g = blob.geometry(&frame);
    assert_eq!((g.vertices.len(), g.indices.len()), (3 * 5, 3 * 4 * 3));

    let particles = ParticleOptions {
        count: 7,
        ..ParticleOptions::default()
    };
    let mut swarm = ParticleBrush::new(sync.group(), &options, particles).unwrap();
    let g = swarm.geometry(&frame);
    assert_eq!((g.vertices.len(), g.indices.len()), (7 * 4, 7 * 6));
}

/// Hides every other instance.
struct Sparse;

impl Hooks for Sparse {
    fn point_progress(&self, progress: f32, instance: &InstanceContext) -> f32 {
        if instance.instance % 2 == 1 {
            NO_PROGRESS
        } else {
            progress
        }
    }
}

#[test]
fn progress_hook_can_hide_instances() {
    let mut group = Group::new(
        |b| {
            b.new_curve([(0.0, 0.0), (1.0, 0.0)]);
        },
        GroupOptions::default(),
    )
    .with_hooks(Sparse);
    group.build(0.0);
    let (engine, sync) = advanced(group);
    let snapshot = engine.snapshot(&sync).unwrap();
    let mut dots = DotBrush::new(sync.group(), &count(4)).unwrap();
    let g = dots.geometry(&BrushFrame::new(&snapshot, sync.group()));
    // Instance 1 collapses to a transparent point.
    assert!(g.vertices[4..8].iter().all(|v| v.color[3] == 0.0));
    assert!(g.vertices[4..8].iter().all(|v| v.position == [0.0, 0.0]));
    assert!(g.vertices[0..4].iter().all(|v| v.color[3] == 1.0));
}

#[test]
fn unused_slots_are_degenerate() {
    let n = std::rc::Rc::new(std::cell::Cell::new(2));
    let count_curves = n.clone();
    let mut group = Group::new(
        move |b| {
            for i in 0..count_curves.get() {
                b.new_curve([(0.0, i as f64), (1.0, i as f64)]);
            }
        },
        GroupOptions::default(),
    );
    group.build(0.0);
    let mut engine = CpuEngine::new();
    let mut sync = BufferSync::new(&mut engine, group).unwrap();
    n.set(1);
    sync.frame(&mut engine, Frame::at(0.0)).unwrap();
    sync.frame(&mut engine, Frame::at(16.0).reinitialize()).unwrap();
    let snapshot = engine.snapshot(&sync).unwrap();
    let mut line = LineBrush::new(sync.group(), &count(2)).unwrap();
    let g = line.geometry(&BrushFrame::new(&snapshot, sync.group()));
    assert!(g.vertices[4..].iter().all(|v| v.color == [0.0; 4]));
}

#[test]
fn text_renders_through_every_brush() {
    let mut group = Group::new(
        |b| {
            b.text("hi 42", &TextOptions::default());
        },
        GroupOptions::default(),
    );
    group.build(0.0);
    let n_curves = group.curves().len();
    assert!(n_curves >= 4);
    let (engine, sync) = advanced(group);
    let snapshot = engine.snapshot(&sync).unwrap();
    let frame = BrushFrame::new(&snapshot, sync.group());
    let options = count(16);
    let mut brushes: Vec<Box<dyn Brush>> = vec![
        Box::new(LineBrush::new(sync.group(), &options).unwrap()),
        Box::new(StripeBrush::new(sync.group(), &options).unwrap()),
        Box::new(DotBrush::new(sync.group(), &options).unwrap()),
        Box::new(DashBrush::new(sync.group(), &options, DashOptions::default()).unwrap()),
        Box::new(BlobBrush::new(sync.group(), &options, BlobOptions::default()).unwrap()),
        Box::new(ParticleBrush::new(sync.group(), &options, ParticleOptions::default()).unwrap()),
    ];
    for brush in &mut brushes {
        let name = brush.name();
        let g = brush.geometry(&frame);
        assert!(
            g.vertices
                .iter()
                .all(|v| v.position.iter().all(|c| c.is_finite())),
            "{name} produced a non-finite vertex"
        );
        let n = g.vertices.len() as u32;
        assert!(g.indices.iter().all(|&i| i < n), "{name} index out of range");
    }
}
