// Copyright 2024 the Tracery Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::Arc;

use tracery_encoding::{
    Capacity, CapacityOptions, Curve, DefaultHooks, GroupBuilder, GroupStats, Hooks,
};

/// Scene script run on every build of a [`Group`].
pub type BuildFn = Box<dyn FnMut(&mut GroupBuilder)>;

/// Callback given the current time in milliseconds, returning the time of the
/// next rebuild or `None` to stop rebuilding.
pub type ScheduleFn = Box<dyn FnMut(f64) -> Option<f64>>;

/// When a built group rebuilds itself.
#[derive(Default)]
pub enum ReinitializePolicy {
    /// Build once.
    #[default]
    Never,
    /// Rebuild every given number of milliseconds.
    Every(f64),
    Custom(ScheduleFn),
}

impl ReinitializePolicy {
    pub fn custom(f: impl FnMut(f64) -> Option<f64> + 'static) -> Self {
        Self::Custom(Box::new(f))
    }

    fn next(&mut self, time_ms: f64) -> Option<f64> {
        match self {
            Self::Never => None,
            Self::Every(interval) => Some(time_ms + interval.max(0.0)),
            Self::Custom(f) => f(time_ms),
        }
    }
}

impl std::fmt::Debug for ReinitializePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Never => f.write_str("Never"),
            Self::Every(ms) => f.debug_tuple("Every").field(ms).finish(),
            Self::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// Options of a [`Group`].
#[derive(Debug, Default)]
pub struct GroupOptions {
    /// Fixed limits; unset ones are taken from the first build.
    pub capacity: CapacityOptions,
    pub reinitialize: ReinitializePolicy,
    /// Seed of the builder's random sequence.
    pub seed: u64,
    /// Whether every rebuild draws from a fresh seed. Otherwise every build
    /// sees the same random sequence.
    pub reseed: bool,
}

/// The curves of one scene script, rebuilt on a schedule.
pub struct Group {
    build: BuildFn,
    hooks: Arc<dyn Hooks>,
    builder: GroupBuilder,
    options: GroupOptions,
    capacity: Option<Capacity>,
    stats: GroupStats,
    next_build: Option<f64>,
    generation: u64,
}

impl Group {
    pub fn new(build: impl FnMut(&mut GroupBuilder) + 'static, options: GroupOptions) -> Self {
        Self {
            build: Box::new(build),
            hooks: Arc::new(DefaultHooks),
            builder: GroupBuilder::new(options.seed),
            options,
            capacity: None,
            stats: GroupStats::default(),
            next_build: None,
            generation: 0,
        }
    }

    /// Replaces the hooks of this group.
    pub fn with_hooks(mut self, hooks: impl Hooks + 'static) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    pub fn hooks(&self) -> &Arc<dyn Hooks> {
        &self.hooks
    }

    /// Runs the scene script at `time_ms` and schedules the next build.
    ///
    /// The first build fixes the group's capacity. Later builds never change
    /// it; curves beyond it are clamped when staged.
    pub fn build(&mut self, time_ms: f64) -> &[Curve] {
        let reseed = (self.options.reseed && self.generation > 0).then(|| {
            self.options
                .seed
                .wrapping_add(self.generation.wrapping_mul(0x9E37_79B9_7F4A_7C15))
        });
        self.builder.begin(time_ms / 1000.0, reseed);
        (self.build)(&mut self.builder);
        self.stats = GroupStats::of(self.builder.curves());
        let capacity = *self
            .capacity
            .get_or_insert_with(|| Capacity::resolve(&self.options.capacity, &self.stats));
        self.next_build = self.options.reinitialize.next(time_ms);
        self.generation += 1;
        log::debug!(
            "built generation {}: {} curves, {} points, length {:.3}, capacity {}x{}",
            self.generation,
            self.stats.n_curves,
            self.stats.max_points,
            self.stats.max_length,
            capacity.max_curves,
            capacity.max_points,
        );
        self.builder.curves()
    }

    /// Whether a build is due at `time_ms`.
    ///
    /// An unbuilt group is always due.
    pub fn should_reinitialize(&self, time_ms: f64) -> bool {
        if self.capacity.is_none() {
            return true;
        }
        self.next_build.is_some_and(|next| time_ms >= next)
    }

    pub fn curves(&self) -> &[Curve] {
        self.builder.curves()
    }

    /// Fixed capacity, `None` before the first build.
    pub fn capacity(&self) -> Option<Capacity> {
        self.capacity
    }

    /// Shape of the last build.
    pub fn stats(&self) -> GroupStats {
        self.stats
    }

    /// Number of completed builds.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Time of the next scheduled build in milliseconds.
    pub fn next_build(&self) -> Option<f64> {
        self.next_build
    }
}

impl std::fmt::Debug for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Group")
            .field("curves", &self.builder.len())
            .field("capacity", &self.capacity)
            .field("generation", &self.generation)
            .field("next_build", &self.next_build)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    fn lines(n: Rc<Cell<usize>>) -> impl FnMut(&mut GroupBuilder) {
        move |b| {
            for i in 0..n.get() {
                b.new_curve([(0.0, i as f64), (1.0, i as f64)]);
            }
        }
    }

    #[test]
    fn capacity_comes_from_first_build() {
        let n = Rc::new(Cell::new(2));
        let mut group = Group::new(lines(n.clone()), GroupOptions::default());
        assert!(group.capacity().is_none());
        assert!(group.should_reinitialize(0.0));
        group.build(0.0);
        let capacity = group.capacity().unwrap();
        assert_eq!((capacity.max_curves, capacity.max_points), (2, 2));
        assert_eq!(capacity.max_length, 1.5);

        n.set(5);
        group.build(10.0);
        assert_eq!(group.curves().len(), 5);
        assert_eq!(group.capacity(), Some(capacity));
    }

    #[test]
    fn explicit_capacity_wins() {
        let options = GroupOptions {
            capacity: CapacityOptions {
                max_curves: Some(8),
                ..CapacityOptions::default()
            },
            ..GroupOptions::default()
        };
        let mut group = Group::new(lines(Rc::new(Cell::new(3))), options);
        group.build(0.0);
        assert_eq!(group.capacity().unwrap().max_curves, 8);
    }

    #[test]
    fn policies_schedule_builds() {
        let mut group = Group::new(|_| {}, GroupOptions::default());
        group.build(0.0);
        assert!(!group.should_reinitialize(1e9));

        let mut group = Group::new(
            |_| {},
            GroupOptions {
                reinitialize: ReinitializePolicy::Every(100.0),
                ..GroupOptions::default()
            },
        );
        group.build(50.0);
        assert!(!group.should_reinitialize(149.0));
        assert!(group.should_reinitialize(150.0));

        let mut group = Group::new(
            |_| {},
            GroupOptions {
                reinitialize: ReinitializePolicy::custom(|t| (t < 100.0).then_some(t * 2.0 + 10.0)),
                ..GroupOptions::default()
            },
        );
        group.build(20.0);
        assert_eq!(group.next_build(), Some(50.0));
        group.build(200.0);
        assert_eq!(group.next_build(), None);
    }

    #[test]
    fn reseed_controls_randomness() {
        let record = |reseed: bool| {
            let seen = Rc::new(Cell::new(0.0));
            let sink = seen.clone();
            let mut group = Group::new(
                move |b| sink.set(b.random()),
                GroupOptions {
                    seed: 7,
                    reseed,
                    ..GroupOptions::default()
                },
            );
            group.build(0.0);
            let first = seen.get();
            group.build(1.0);
            (first, seen.get())
        };
        let (a, b) = record(false);
        assert_eq!(a, b);
        let (a, b) = record(true);
        assert_ne!(a, b);
    }

    #[test]
    fn build_passes_seconds_to_script() {
        let seen = Rc::new(Cell::new(0.0));
        let sink = seen.clone();
        let mut group = Group::new(move |b| sink.set(b.time()), GroupOptions::default());
        group.build(1500.0);
        assert_eq!(seen.get(), 1.5);
    }
}
