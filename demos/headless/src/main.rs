// Copyright 2024 the Tracery Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Headless

#![allow(
    clippy::cast_possible_truncation,
    clippy::allow_attributes_without_reason
)]

use std::borrow::Cow;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use tracery::brush::{
    BlobBrush, BlobOptions, Brush, BrushFrame, BrushOptions, DashBrush, DashOptions, DotBrush,
    Geometry, LineBrush, ParticleBrush, ParticleOptions, Spacing, StripeBrush, Viewport,
};
use tracery::encoding::{PointData, SlotContext};
use tracery::kurbo::Rect;
use tracery::{
    BufferSync, CpuEngine, Fit, Frame, Group, GroupOptions, Hooks, ReinitializePolicy,
    TextOptions, TransformPatch,
};

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
struct Args {
    /// Number of frames to run.
    #[arg(long, default_value_t = 60)]
    frames: u32,
    /// Brush sampling the curves.
    #[arg(long, value_enum, default_value_t = BrushKind::Line)]
    brush: BrushKind,
    /// Text drawn with the built-in glyph set.
    #[arg(long, default_value = "tracery")]
    text: String,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    #[arg(long, default_value_t = 1920)]
    width: u32,
    #[arg(long, default_value_t = 1080)]
    height: u32,
    /// Pixels between consecutive brush instances.
    #[arg(long, default_value_t = 4.0)]
    spacing: f64,
    /// Rebuild the scene every this many milliseconds.
    #[arg(long)]
    reinit_ms: Option<f64>,
    /// Also run the frames on a wgpu device.
    #[cfg(feature = "wgpu")]
    #[arg(long)]
    gpu: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum BrushKind {
    Line,
    Stripe,
    Dash,
    Dot,
    Blob,
    Particles,
}

/// Frame duration the demo pretends to run at.
const FRAME_MS: f64 = 1000.0 / 60.0;

/// Sways every control point sideways, more towards the end of each curve.
struct Sway;

impl Hooks for Sway {
    fn curve_position(&self, previous: PointData, slot: &SlotContext<'_>) -> PointData {
        let phase = slot.time * 2.0 + slot.curve as f32 * 0.7;
        PointData {
            x: previous.x + 0.002 * slot.progress * phase.sin(),
            ..previous
        }
    }

    fn advance_wgsl(&self) -> Option<Cow<'static, str>> {
        Some(Cow::Borrowed(
            "fn curve_position(previous: PointData, slot: SlotContext) -> PointData {
    let phase = slot.time * 2.0 + f32(slot.curve) * 0.7;
    var moved = previous;
    moved.x = previous.x + 0.002 * slot.progress * sin(phase);
    return moved;
}

fn curve_color(previous: ColorData, slot: SlotContext) -> ColorData {
    return previous;
}
",
        ))
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    if args.frames == 0 {
        bail!("--frames must be at least 1");
    }
    if args.spacing.is_nan() || args.spacing <= 0.0 {
        bail!("--spacing must be positive, got {}", args.spacing);
    }

    let group = scene(&args);
    let mut engine = CpuEngine::new();
    let mut sync =
        BufferSync::new(&mut engine, group).context("Failed to stage the first build")?;
    let options = BrushOptions {
        spacing: Spacing::Pixel(args.spacing),
        viewport: Viewport {
            width: args.width as f64,
            height: args.height as f64,
        },
        end_mode: None,
    };
    let mut brush = brush(args.brush, sync.group(), &options, args.seed)?;
    log::info!(
        "{} brush: {} instances per curve, {} curves",
        brush.name(),
        brush.layout().instances_per_curve,
        brush.layout().max_curves,
    );

    let mut totals = Totals::default();
    for i in 0..args.frames {
        sync.frame(&mut engine, Frame::at(i as f64 * FRAME_MS))
            .with_context(|| format!("Frame {i} failed"))?;
        let snapshot = engine.snapshot(&sync)?;
        let geometry = brush.geometry(&BrushFrame::new(&snapshot, sync.group()));
        totals.add(geometry);
    }
    println!(
        "{} frames, {} builds, {} curves: {} vertices and {} indices per frame on average, \
         bounds {:?}",
        args.frames,
        sync.group().generation(),
        sync.group().curves().len(),
        totals.vertices / args.frames as usize,
        totals.indices / args.frames as usize,
        totals.bounds,
    );
    sync.dispose(&mut engine)?;

    #[cfg(feature = "wgpu")]
    if args.gpu {
        pollster::block_on(run_gpu(&args))?;
    }
    Ok(())
}

fn scene(args: &Args) -> Group {
    let text = args.text.clone();
    let aspect = args.width as f64 / args.height.max(1) as f64;
    let options = GroupOptions {
        seed: args.seed,
        reinitialize: match args.reinit_ms {
            Some(ms) => ReinitializePolicy::Every(ms),
            None => ReinitializePolicy::Never,
        },
        ..GroupOptions::default()
    };
    let mut group = Group::new(
        move |b| {
            let jitter = b.random_range(-0.02, 0.02);
            b.transform(&TransformPatch::new().thickness(12.0));
            b.text(
                &text,
                &TextOptions {
                    fit: Some(Fit::new(Rect::new(0.1, 0.3 + jitter, aspect - 0.1, 0.7 + jitter))),
                    ..TextOptions::default()
                },
            );
        },
        options,
    )
    .with_hooks(Sway);
    group.build(0.0);
    group
}

fn brush(
    kind: BrushKind,
    group: &Group,
    options: &BrushOptions,
    seed: u64,
) -> Result<Box<dyn Brush>> {
    Ok(match kind {
        BrushKind::Line => Box::new(LineBrush::new(group, options)?),
        BrushKind::Stripe => Box::new(StripeBrush::new(group, options)?),
        BrushKind::Dash => Box::new(DashBrush::new(group, options, DashOptions::default())?),
        BrushKind::Dot => Box::new(DotBrush::new(group, options)?),
        BrushKind::Blob => Box::new(BlobBrush::new(group, options, BlobOptions::default())?),
        BrushKind::Particles => Box::new(ParticleBrush::new(
            group,
            options,
            ParticleOptions {
                seed,
                ..ParticleOptions::default()
            },
        )?),
    })
}

#[derive(Default)]
struct Totals {
    vertices: usize,
    indices: usize,
    bounds: Option<Rect>,
}

impl Totals {
    fn add(&mut self, geometry: &Geometry) {
        self.vertices += geometry.vertices.len();
        self.indices += geometry.indices.len();
        for v in geometry.vertices.iter().filter(|v| v.color[3] > 0.0) {
            let [x, y] = v.position.map(f64::from);
            let point = Rect::new(x, y, x, y);
            self.bounds = Some(match self.bounds {
                Some(bounds) => bounds.union(point),
                None => point,
            });
        }
    }
}

#[cfg(feature = "wgpu")]
async fn run_gpu(args: &Args) -> Result<()> {
    use tracery::WgpuEngine;
    use tracery::util::DeviceHandle;

    let handle = DeviceHandle::headless()
        .await
        .context("No compatible device found")?;
    log::info!("Running on {:?}", handle.adapter().get_info().name);
    let mut engine = WgpuEngine::new(handle.device, handle.queue);
    let mut sync = BufferSync::new(&mut engine, scene(args))?;
    for i in 0..args.frames {
        let time = i as f64 * FRAME_MS;
        engine
            .validated(|engine| sync.frame(engine, Frame::at(time)))
            .await
            .with_context(|| format!("GPU frame {i} failed"))?;
    }
    println!("{} frames advanced on the GPU", args.frames);
    sync.dispose(&mut engine)?;
    Ok(())
}
