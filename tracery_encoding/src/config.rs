// Copyright 2024 the Tracery Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use bytemuck::{Pod, Zeroable};

use crate::{ColorData, Curve, PointData};

/// Threads per workgroup of the `load` and `advance` passes.
///
/// This must be kept in sync with `shader/shared.wgsl`.
pub const SLOT_WG: u32 = 64;

/// Largest curve capacity.
///
/// Progress values keep the curve index exact and at least 7 bits of local
/// parameter up to here.
pub const MAX_CURVES: u32 = 1 << 16;

/// Largest number of point slots, so buffer byte sizes fit a `u32`.
pub const MAX_SLOTS: u32 = 1 << 26;

/// Observed shape of one build of a group.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct GroupStats {
    pub n_curves: u32,
    /// Largest point count of any curve.
    pub max_points: u32,
    /// Largest estimated arc length of any curve.
    pub max_length: f64,
}

impl GroupStats {
    pub fn of(curves: &[Curve]) -> Self {
        curves.iter().fold(
            Self {
                n_curves: curves.len() as u32,
                ..Self::default()
            },
            |stats, curve| Self {
                max_points: stats.max_points.max(curve.len() as u32),
                max_length: stats.max_length.max(curve.length()),
                ..stats
            },
        )
    }
}

/// Explicit capacity limits. Unset limits are taken from the first build.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct CapacityOptions {
    pub max_curves: Option<u32>,
    pub max_points: Option<u32>,
    pub max_length: Option<f64>,
}

/// Fixed buffer capacity of a group.
///
/// Once resolved a capacity never grows; later builds that exceed it are
/// clamped when staged.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Capacity {
    pub max_curves: u32,
    pub max_points: u32,
    pub max_length: f64,
}

impl Capacity {
    /// Fills every unset option from `stats`.
    ///
    /// Point capacity is at least 2 so every slot can hold a valid curve.
    /// Curves are capped at [`MAX_CURVES`] and points so that the slot count
    /// stays within [`MAX_SLOTS`].
    pub fn resolve(options: &CapacityOptions, stats: &GroupStats) -> Self {
        let curves = options.max_curves.unwrap_or(stats.n_curves);
        let points = options.max_points.unwrap_or(stats.max_points);
        let max_curves = curves.clamp(1, MAX_CURVES);
        let max_points = points.clamp(2, MAX_SLOTS / max_curves);
        if max_curves < curves || max_points < points {
            log::warn!("capacity {curves}x{points} clamped to {max_curves}x{max_points}");
        }
        Self {
            max_curves,
            max_points,
            max_length: options.max_length.unwrap_or(stats.max_length).max(0.0),
        }
    }

    /// Total number of point slots, at most [`MAX_SLOTS`].
    pub fn slots(&self) -> u32 {
        self.max_curves.saturating_mul(self.max_points).min(MAX_SLOTS)
    }

    pub fn buffer_sizes(&self) -> BufferSizes {
        BufferSizes {
            positions: BufferSize::new(self.slots()),
            colors: BufferSize::new(self.slots()),
            counts: BufferSize::new(self.max_curves),
        }
    }

    pub fn workgroup_counts(&self) -> WorkgroupCounts {
        let slots = self.slots().div_ceil(SLOT_WG);
        WorkgroupCounts {
            load: (slots, 1, 1),
            advance: (slots, 1, 1),
        }
    }
}

/// Uniform data shared by the `load` and `advance` passes.
///
/// This must be kept in sync with the struct in `shader/shared.wgsl`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Zeroable, Pod)]
#[repr(C)]
pub struct SyncConfig {
    /// Number of curves written by the last load.
    pub n_curves: u32,
    pub max_curves: u32,
    pub max_points: u32,
    /// Frames advanced since the last load.
    pub frame: u32,
    pub max_length: f32,
    /// Elapsed time in seconds.
    pub time: f32,
    /// Time since the previous frame in seconds.
    pub dt: f32,
    pub _padding: u32,
}

impl SyncConfig {
    pub fn new(capacity: &Capacity, n_curves: u32) -> Self {
        Self {
            n_curves,
            max_curves: capacity.max_curves,
            max_points: capacity.max_points,
            max_length: capacity.max_length as f32,
            ..Self::default()
        }
    }

    pub fn slots(&self) -> u32 {
        self.max_curves.saturating_mul(self.max_points).min(MAX_SLOTS)
    }
}

static_assertions::const_assert_eq!(size_of::<SyncConfig>(), 32);

pub type WorkgroupSize = (u32, u32, u32);

/// Dispatch sizes of the two passes.
#[derive(Copy, Clone, Debug, Default)]
pub struct WorkgroupCounts {
    pub load: WorkgroupSize,
    pub advance: WorkgroupSize,
}

/// Typed buffer size primitive.
#[derive(Copy, Clone, Eq, Default, Debug)]
pub struct BufferSize<T: Sized> {
    len: u32,
    _phantom: std::marker::PhantomData<T>,
}

impl<T: Sized> BufferSize<T> {
    /// Creates a new buffer size from number of elements.
    ///
    /// Zero is rounded up to one element; empty bindings are invalid.
    pub const fn new(len: u32) -> Self {
        Self {
            len: if len > 0 { len } else { 1 },
            _phantom: std::marker::PhantomData,
        }
    }

    #[expect(clippy::len_without_is_empty, reason = "The buffer can never be empty")]
    pub const fn len(self) -> u32 {
        self.len
    }

    pub const fn size_in_bytes(self) -> u32 {
        size_of::<T>() as u32 * self.len
    }
}

impl<T: Sized> PartialEq for BufferSize<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len
    }
}

/// Sizes of every buffer owned by a buffer sync.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct BufferSizes {
    pub positions: BufferSize<PointData>,
    pub colors: BufferSize<ColorData>,
    pub counts: BufferSize<u32>,
}
