// Copyright 2024 the Tracery Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracery turns a scene script into animated, brush-sampled 2D curves.
//!
//! A [`Group`] runs the script through a [`GroupBuilder`](tracery_encoding::GroupBuilder)
//! whenever its [`ReinitializePolicy`] fires. A [`BufferSync`] stages the
//! resulting curves into double-buffered point storage and, every frame,
//! records an `advance` pass in which the group's [`Hooks`] rewrite each
//! control point from its previous value. Brushes then sample the animated
//! curves to produce geometry.
//!
//! Work is expressed as a [`Recording`] and executed by an [`Engine`]. The
//! [`CpuEngine`] runs everything on the host; with the `wgpu` feature a
//! [`WgpuEngine`] runs the same passes as compute shaders.
//!
//! ```
//! use tracery::{BufferSync, CpuEngine, Frame, Group, GroupOptions};
//! use tracery::brush::{Brush, BrushFrame, BrushOptions, LineBrush};
//!
//! let mut group = Group::new(
//!     |b| {
//!         b.new_curve([(0.0, 0.0), (0.5, 0.5), (1.0, 0.0)]);
//!     },
//!     GroupOptions::default(),
//! );
//! group.build(0.0);
//! let mut engine = CpuEngine::new();
//! let mut sync = BufferSync::new(&mut engine, group).unwrap();
//! let mut brush = LineBrush::new(sync.group(), &BrushOptions::default()).unwrap();
//! sync.frame(&mut engine, Frame::at(16.0)).unwrap();
//! let snapshot = engine.snapshot(&sync).unwrap();
//! let geometry = brush.geometry(&BrushFrame::new(&snapshot, sync.group()));
//! assert!(!geometry.vertices.is_empty());
//! ```

// LINEBENDER LINT SET - lib.rs - v2
// See https://linebender.org/wiki/canonical-lints/
// These lints aren't included in Cargo.toml because they
// shouldn't apply to examples and tests
#![warn(unused_crate_dependencies)]
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![allow(missing_docs, reason = "We have many as-yet undocumented items.")]
#![allow(
    missing_debug_implementations,
    elided_lifetimes_in_paths,
    clippy::cast_possible_truncation,
    clippy::missing_assert_message,
    clippy::missing_errors_doc,
    clippy::exhaustive_enums,
    reason = "Deferred"
)]

pub mod brush;
mod cpu_engine;
mod engine;
mod group;
mod recording;
mod shaders;
mod sync;

#[cfg(feature = "wgpu")]
pub mod util;
#[cfg(feature = "wgpu")]
mod wgpu_engine;

pub use peniko;
pub use peniko::kurbo;
pub use tracery_encoding as encoding;

#[cfg(feature = "wgpu")]
pub use wgpu;

pub use cpu_engine::CpuEngine;
pub use engine::{CpuShaderFn, Engine};
pub use group::{Group, GroupOptions, ReinitializePolicy};
pub use recording::{BindType, BufferProxy, Command, Recording, ResourceId, ShaderId};
pub use shaders::SyncShaders;
pub use sync::{BufferSync, Frame, FrameSnapshot, SyncBuffers, SyncState};
pub use tracery_encoding::{
    CapacityOptions, ColorData, DefaultHooks, EndMode, Fit, GroupBuilder, HAlign, Hooks,
    InstanceContext, PointData, SampleContext, SlotContext, TextOptions, TransformPatch, VAlign,
};

#[cfg(feature = "wgpu")]
pub use wgpu_engine::WgpuEngine;

use thiserror::Error;

/// Errors that can occur in Tracery.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A brush or buffer sync needs a capacity, which only exists once the
    /// group has been built.
    #[error("Group has not been built yet")]
    GroupNotBuilt,
    /// A recording used a buffer that was never written or was freed.
    #[error("Buffer '{0}' is not available but used for {1}")]
    UnavailableBufferUsed(&'static str, &'static str),
    /// A frame was requested from a disposed buffer sync.
    #[error("Buffer sync has been disposed")]
    Disposed,
    /// There is no available device with the features required by Tracery.
    #[cfg(feature = "wgpu")]
    #[error("Couldn't find suitable device")]
    NoCompatibleDevice,
    /// Surfaced errors from wgpu error scopes.
    #[cfg(feature = "wgpu")]
    #[error("wgpu Error from scope")]
    WgpuErrorFromScope(#[from] wgpu::Error),
}

pub(crate) type Result<T, E = Error> = std::result::Result<T, E>;
