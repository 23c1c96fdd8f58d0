// Copyright 2024 the Tracery Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Double-buffered point storage kept in step with a [`Group`].

use tracery_encoding::{
    Capacity, ColorData, PointBuffers, PointData, Staging, SyncConfig, WorkgroupCounts,
};

use crate::engine::Engine;
use crate::group::Group;
use crate::recording::{BufferProxy, Recording};
use crate::shaders::{sync_shaders, SyncShaders};
use crate::{Error, Result};

/// Lifecycle of a [`BufferSync`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SyncState {
    /// Buffers allocated but never loaded.
    Empty,
    /// Both halves hold the last build; no frame has advanced since.
    Loaded,
    /// At least one frame advanced since the last load.
    Advancing,
    /// The group is being rebuilt and staged.
    Reinitializing,
    /// Buffers have been freed.
    Disposed,
}

/// One half of the double-buffered point storage.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SyncBuffers {
    pub positions: BufferProxy,
    pub colors: BufferProxy,
}

#[derive(Copy, Clone, Debug)]
struct Resources {
    config: BufferProxy,
    counts: BufferProxy,
    staging_positions: BufferProxy,
    staging_colors: BufferProxy,
    halves: [SyncBuffers; 2],
}

impl Resources {
    fn new(capacity: &Capacity) -> Self {
        let sizes = capacity.buffer_sizes();
        let positions = sizes.positions.size_in_bytes().into();
        let colors = sizes.colors.size_in_bytes().into();
        Self {
            config: BufferProxy::new(size_of::<SyncConfig>() as u64, "config"),
            counts: BufferProxy::new(sizes.counts.size_in_bytes().into(), "counts"),
            staging_positions: BufferProxy::new(positions, "staging_positions"),
            staging_colors: BufferProxy::new(colors, "staging_colors"),
            halves: [
                SyncBuffers {
                    positions: BufferProxy::new(positions, "positions_a"),
                    colors: BufferProxy::new(colors, "colors_a"),
                },
                SyncBuffers {
                    positions: BufferProxy::new(positions, "positions_b"),
                    colors: BufferProxy::new(colors, "colors_b"),
                },
            ],
        }
    }

    fn all(&self) -> [BufferProxy; 8] {
        let [a, b] = self.halves;
        [
            self.config,
            self.counts,
            self.staging_positions,
            self.staging_colors,
            a.positions,
            a.colors,
            b.positions,
            b.colors,
        ]
    }
}

/// A frame request from the host render loop.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Frame {
    /// Elapsed time in milliseconds. Expected to increase monotonically.
    pub time_ms: f64,
    /// Rebuild the group regardless of its policy.
    pub force_reinitialize: bool,
}

impl Frame {
    pub fn at(time_ms: f64) -> Self {
        Self {
            time_ms,
            force_reinitialize: false,
        }
    }

    pub fn reinitialize(mut self) -> Self {
        self.force_reinitialize = true;
        self
    }
}

/// Keeps double-buffered point storage in step with a [`Group`].
///
/// On a load the group's curves are staged and copied into both halves. Every
/// frame the advance pass reads the front half and writes the back half, after
/// which the halves swap. Within a frame any rebuild is recorded before the
/// advance, so brushes always sample a fully advanced front half.
pub struct BufferSync {
    group: Group,
    shaders: SyncShaders,
    capacity: Capacity,
    workgroups: WorkgroupCounts,
    staging: Staging,
    config: SyncConfig,
    resources: Option<Resources>,
    allocated: bool,
    front: usize,
    state: SyncState,
    last_time_ms: Option<f64>,
}

impl BufferSync {
    /// Registers the passes for `group` and sizes buffers to its capacity.
    ///
    /// The group must have been built, which fixes its capacity.
    pub fn new<E: Engine + ?Sized>(engine: &mut E, group: Group) -> Result<Self> {
        let capacity = group.capacity().ok_or(Error::GroupNotBuilt)?;
        let shaders = sync_shaders(engine, group.hooks())?;
        Ok(Self {
            group,
            shaders,
            capacity,
            workgroups: capacity.workgroup_counts(),
            staging: Staging::new(&capacity),
            config: SyncConfig::new(&capacity, 0),
            resources: Some(Resources::new(&capacity)),
            allocated: false,
            front: 0,
            state: SyncState::Empty,
            last_time_ms: None,
        })
    }

    /// Rebuilds when due, then advances one frame.
    ///
    /// The first frame loads the curves of the group's first build.
    pub fn frame<E: Engine + ?Sized>(&mut self, engine: &mut E, frame: Frame) -> Result<()> {
        let mut recording = Recording::default();
        if self.state == SyncState::Empty {
            self.record_load(&mut recording, frame.time_ms)?;
        } else if frame.force_reinitialize || self.group.should_reinitialize(frame.time_ms) {
            self.record_reinitialize(&mut recording, frame.time_ms)?;
        }
        self.record_advance(&mut recording, frame.time_ms)?;
        engine.run_recording(&recording, "frame")
    }

    /// Rebuilds the group and loads the result into both halves.
    pub fn reinitialize<E: Engine + ?Sized>(&mut self, engine: &mut E, time_ms: f64) -> Result<()> {
        let mut recording = Recording::default();
        self.record_reinitialize(&mut recording, time_ms)?;
        engine.run_recording(&recording, "reinitialize")
    }

    /// Advances one frame without considering a rebuild.
    pub fn advance<E: Engine + ?Sized>(&mut self, engine: &mut E, time_ms: f64) -> Result<()> {
        let mut recording = Recording::default();
        if self.state == SyncState::Empty {
            self.record_load(&mut recording, time_ms)?;
        }
        self.record_advance(&mut recording, time_ms)?;
        engine.run_recording(&recording, "advance")
    }

    /// Frees every buffer. Later frames fail with [`Error::Disposed`].
    ///
    /// Callers must not dispose while a frame using these buffers is in flight.
    pub fn dispose<E: Engine + ?Sized>(&mut self, engine: &mut E) -> Result<()> {
        let Some(resources) = self.resources.take() else {
            return Ok(());
        };
        self.state = SyncState::Disposed;
        let mut recording = Recording::default();
        if self.allocated {
            for buf in resources.all() {
                recording.free_buffer(buf);
            }
        }
        engine.run_recording(&recording, "dispose")
    }

    fn record_reinitialize(&mut self, recording: &mut Recording, time_ms: f64) -> Result<()> {
        if self.resources.is_none() {
            return Err(Error::Disposed);
        }
        self.state = SyncState::Reinitializing;
        self.group.build(time_ms);
        self.record_load(recording, time_ms)
    }

    fn record_load(&mut self, recording: &mut Recording, time_ms: f64) -> Result<()> {
        let resources = self.resources.ok_or(Error::Disposed)?;
        self.staging.encode(self.group.curves(), &self.capacity);
        self.config = SyncConfig {
            time: (time_ms / 1000.0) as f32,
            ..SyncConfig::new(&self.capacity, self.staging.n_curves)
        };
        if !self.allocated {
            for half in resources.halves {
                recording.clear_all(half.positions);
                recording.clear_all(half.colors);
            }
            self.allocated = true;
        }
        recording.upload_uniform(resources.config, bytemuck::bytes_of(&self.config));
        recording.upload(resources.counts, bytemuck::cast_slice::<u32, u8>(&self.staging.counts));
        recording.upload(
            resources.staging_positions,
            bytemuck::cast_slice::<PointData, u8>(&self.staging.positions),
        );
        recording.upload(
            resources.staging_colors,
            bytemuck::cast_slice::<ColorData, u8>(&self.staging.colors),
        );
        let [a, b] = resources.halves;
        recording.dispatch(
            self.shaders.load,
            self.workgroups.load,
            [
                resources.config,
                resources.staging_positions,
                resources.staging_colors,
                a.positions,
                a.colors,
                b.positions,
                b.colors,
            ],
        );
        self.front = 0;
        self.last_time_ms = Some(time_ms);
        self.state = SyncState::Loaded;
        Ok(())
    }

    fn record_advance(&mut self, recording: &mut Recording, time_ms: f64) -> Result<()> {
        let resources = self.resources.ok_or(Error::Disposed)?;
        let dt = self
            .last_time_ms
            .map_or(0.0, |last| ((time_ms - last) / 1000.0).max(0.0));
        self.config.frame += 1;
        self.config.time = (time_ms / 1000.0) as f32;
        self.config.dt = dt as f32;
        recording.upload_uniform(resources.config, bytemuck::bytes_of(&self.config));
        let back = 1 - self.front;
        let (prev, next) = (resources.halves[self.front], resources.halves[back]);
        recording.dispatch(
            self.shaders.advance,
            self.workgroups.advance,
            [
                resources.config,
                resources.counts,
                prev.positions,
                prev.colors,
                next.positions,
                next.colors,
            ],
        );
        self.front = back;
        self.last_time_ms = Some(time_ms);
        self.state = SyncState::Advancing;
        Ok(())
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn group(&self) -> &Group {
        &self.group
    }

    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    pub fn shaders(&self) -> SyncShaders {
        self.shaders
    }

    /// Uniform data of the last recorded pass.
    pub fn config(&self) -> SyncConfig {
        self.config
    }

    /// True point count of every curve slot, as last loaded.
    pub fn counts(&self) -> &[u32] {
        &self.staging.counts
    }

    /// Staging arrays of the last load.
    pub fn staging(&self) -> &Staging {
        &self.staging
    }

    /// The half holding the most recent values, `None` once disposed.
    pub fn front_buffers(&self) -> Option<SyncBuffers> {
        self.resources.map(|r| r.halves[self.front])
    }

    /// The half the next advance writes, `None` once disposed.
    pub fn back_buffers(&self) -> Option<SyncBuffers> {
        self.resources.map(|r| r.halves[1 - self.front])
    }

    /// Uniform and count buffers, `None` once disposed.
    pub fn uniform_buffers(&self) -> Option<(BufferProxy, BufferProxy)> {
        self.resources.map(|r| (r.config, r.counts))
    }
}

impl std::fmt::Debug for BufferSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferSync")
            .field("state", &self.state)
            .field("capacity", &self.capacity)
            .field("front", &self.front)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Owned copy of the front half of a [`BufferSync`], for host-side sampling.
#[derive(Clone, Debug, Default)]
pub struct FrameSnapshot {
    pub positions: Vec<PointData>,
    pub colors: Vec<ColorData>,
    pub counts: Vec<u32>,
    pub config: SyncConfig,
}

impl FrameSnapshot {
    pub fn new(
        positions: Vec<PointData>,
        colors: Vec<ColorData>,
        counts: Vec<u32>,
        config: SyncConfig,
    ) -> Self {
        Self {
            positions,
            colors,
            counts,
            config,
        }
    }

    pub fn buffers(&self) -> PointBuffers<'_> {
        PointBuffers {
            positions: &self.positions,
            colors: &self.colors,
            counts: &self.counts,
            max_points: self.config.max_points,
        }
    }
}
