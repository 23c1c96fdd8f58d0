// Copyright 2024 the Tracery Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Curve model shared by the Tracery runtime and its shaders.
//!
//! This crate holds everything that does not touch a GPU: the decomposed
//! [`Transform`] algebra, the point and attribute model, the [`GroupBuilder`]
//! drawing context with its procedural glyphs, the curve [`sample`]r, and the
//! host-side [`Staging`] layout of the point buffers.

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
    single_use_lifetimes,
    clippy::return_self_not_must_use,
    clippy::cast_possible_truncation,
    clippy::missing_assert_message,
    clippy::missing_panics_doc,
    clippy::exhaustive_enums,
    reason = "Deferred"
)]

mod builder;
mod config;
mod curve;
pub mod fit;
mod glyph;
mod hooks;
pub mod math;
mod patch;
mod point;
mod random;
mod sample;
mod staging;

pub use builder::GroupBuilder;
pub use config::{
    BufferSize, BufferSizes, Capacity, CapacityOptions, GroupStats, SyncConfig, WorkgroupCounts,
    WorkgroupSize, MAX_CURVES, MAX_SLOTS, SLOT_WG,
};
pub use curve::{bounds_of, Curve, LENGTH_FACTOR};
pub use fit::{Fit, HAlign, VAlign};
pub use glyph::{glyph, TextOptions};
pub use hooks::{DefaultHooks, Hooks, InstanceContext, SampleContext, SlotContext};
pub use math::Transform;
pub use patch::{ResetMode, TransformPatch};
pub use point::{
    Attribute, ColorData, Coordinate, CurvePoint, PointAttributes, PointData, PointSettings,
};
pub use random::Randomness;
pub use sample::{
    decode_progress, progress, sample, sample_curve, CurveSample, EndMode, Mix, PointBuffers,
    MAX_LOCAL_T, NO_PROGRESS,
};
pub use staging::Staging;
