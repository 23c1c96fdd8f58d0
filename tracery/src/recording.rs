// Copyright 2024 the Tracery Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

pub use tracery_shaders::BindType;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct ShaderId(pub usize);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ResourceId(pub NonZeroU64);

impl ResourceId {
    pub fn next() -> Self {
        // Starts at 1 so the counter never yields zero.
        static ID_COUNTER: AtomicU64 = AtomicU64::new(1);
        let id = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(NonZeroU64::new(id).unwrap_or(NonZeroU64::MIN))
    }
}

/// List of [`Command`]s for an engine to execute in order.
#[derive(Default, Debug)]
pub struct Recording {
    pub commands: Vec<Command>,
}

/// Proxy used as a handle to a buffer.
///
/// A buffer is materialized by the first command that writes it and lives
/// until a [`Command::FreeBuffer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferProxy {
    pub size: u64,
    pub id: ResourceId,
    pub name: &'static str,
}

/// Single command inside a [`Recording`] to get executed by an engine.
#[derive(Debug)]
pub enum Command {
    /// Writes the data to the start of the buffer, creating it if needed.
    Upload(BufferProxy, Vec<u8>),
    /// Like `Upload`, for a buffer bound as a uniform.
    UploadUniform(BufferProxy, Vec<u8>),
    /// Clears the buffer from an offset on for a length of the given size,
    /// creating it if needed. If the size is [None], it clears until the end.
    Clear(BufferProxy, u64, Option<u64>),
    /// Commands to free the buffer.
    FreeBuffer(BufferProxy),
    Dispatch(ShaderId, (u32, u32, u32), Vec<BufferProxy>),
}

impl Recording {
    /// Appends a [`Command`] to the back of the [`Recording`].
    pub fn push(&mut self, cmd: Command) {
        self.commands.push(cmd);
    }

    /// Commands to write the given data into an existing or new buffer.
    pub fn upload(&mut self, buf: BufferProxy, data: impl Into<Vec<u8>>) {
        self.push(Command::Upload(buf, data.into()));
    }

    /// Commands to write the given data into an existing or new uniform buffer.
    pub fn upload_uniform(&mut self, buf: BufferProxy, data: impl Into<Vec<u8>>) {
        self.push(Command::UploadUniform(buf, data.into()));
    }

    pub fn dispatch(
        &mut self,
        shader: ShaderId,
        wg_size: (u32, u32, u32),
        resources: impl IntoIterator<Item = BufferProxy>,
    ) {
        self.push(Command::Dispatch(
            shader,
            wg_size,
            resources.into_iter().collect(),
        ));
    }

    /// Commands to clear the whole buffer.
    pub fn clear_all(&mut self, buf: BufferProxy) {
        self.push(Command::Clear(buf, 0, None));
    }

    /// Commands to free the given buffer.
    pub fn free_buffer(&mut self, buf: BufferProxy) {
        self.push(Command::FreeBuffer(buf));
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Returns a [`Vec`] containing all the [`Command`]s in order.
    pub fn into_commands(self) -> Vec<Command> {
        self.commands
    }
}

impl BufferProxy {
    pub fn new(size: u64, name: &'static str) -> Self {
        let id = ResourceId::next();
        debug_assert!(size > 0);
        Self { id, size, name }
    }
}
