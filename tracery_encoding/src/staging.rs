// Copyright 2024 the Tracery Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{Capacity, ColorData, Curve, PointBuffers, PointData};

/// Host-side, write-only copy of one build, laid out like the GPU buffers.
///
/// Curves beyond `max_curves` are dropped and points beyond `max_points` are
/// truncated, keeping the first ones in both cases. Slots past a curve's
/// point count are zero.
#[derive(Clone, Debug, Default)]
pub struct Staging {
    pub positions: Vec<PointData>,
    pub colors: Vec<ColorData>,
    /// True point count per curve slot, zero for unused slots.
    pub counts: Vec<u32>,
    pub n_curves: u32,
    pub max_points: u32,
    /// Curves dropped by the last encode.
    pub dropped_curves: usize,
    /// Curves whose tail was cut by the last encode.
    pub truncated_curves: usize,
}

impl Staging {
    pub fn new(capacity: &Capacity) -> Self {
        let slots = capacity.slots() as usize;
        Self {
            positions: vec![PointData::default(); slots],
            colors: vec![ColorData::default(); slots],
            counts: vec![0; capacity.max_curves as usize],
            max_points: capacity.max_points,
            ..Self::default()
        }
    }

    /// Overwrites the staging arrays with `curves`, clamped to `capacity`.
    pub fn encode(&mut self, curves: &[Curve], capacity: &Capacity) {
        let slots = capacity.slots() as usize;
        let max_points = capacity.max_points as usize;
        let max_curves = capacity.max_curves as usize;
        self.positions.clear();
        self.positions.resize(slots, PointData::default());
        self.colors.clear();
        self.colors.resize(slots, ColorData::default());
        self.counts.clear();
        self.counts.resize(max_curves, 0);
        self.max_points = capacity.max_points;

        let kept = curves.len().min(max_curves);
        self.dropped_curves = curves.len() - kept;
        self.truncated_curves = 0;
        for (slot, curve) in curves[..kept].iter().enumerate() {
            let n = curve.len().min(max_points);
            if n < curve.len() {
                self.truncated_curves += 1;
            }
            let base = slot * max_points;
            for (i, point) in curve.points()[..n].iter().enumerate() {
                self.positions[base + i] = point.point_data();
                self.colors[base + i] = point.color_data();
            }
            self.counts[slot] = n as u32;
        }
        self.n_curves = kept as u32;

        if self.dropped_curves > 0 || self.truncated_curves > 0 {
            log::warn!(
                "group exceeds capacity {}x{}: dropped {} curves, truncated {} curves",
                capacity.max_curves,
                capacity.max_points,
                self.dropped_curves,
                self.truncated_curves,
            );
        }
    }

    pub fn buffers(&self) -> PointBuffers<'_> {
        PointBuffers {
            positions: &self.positions,
            colors: &self.colors,
            counts: &self.counts,
            max_points: self.max_points,
        }
    }
}
