//! Per-session load state: resident shards, progress, and the cycle guard.

use fxhash::FxHashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Loaded/total snapshot, rendered as `"2/2 (100%)"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub loaded: usize,
    pub total: usize,
}

impl Progress {
    pub fn new(loaded: usize, total: usize) -> Self {
        Self { loaded, total }
    }

    /// Rounded percentage; an empty catalog counts as complete
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 100;
        }
        ((self.loaded as f64 / self.total as f64) * 100.0).round() as u32
    }

    pub fn is_complete(&self) -> bool {
        self.loaded >= self.total
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({}%)", self.loaded, self.total, self.percent())
    }
}

/// What is resident so far. Only ever grows during a session.
#[derive(Debug, Default, Clone)]
pub struct LoadState {
    resident: FxHashSet<String>,
    /// Resident codes in the order they completed
    order: Vec<String>,
    points: usize,
    progress: Progress,
}

impl LoadState {
    pub fn is_resident(&self, code: &str) -> bool {
        self.resident.contains(code)
    }

    /// Record a fully ingested shard. Returns false if it was already resident.
    pub fn mark_resident(&mut self, code: &str, points: usize) -> bool {
        if !self.resident.insert(code.to_string()) {
            return false;
        }
        self.order.push(code.to_string());
        self.points += points;
        true
    }

    pub fn resident_count(&self) -> usize {
        self.resident.len()
    }

    pub fn resident_codes(&self) -> &[String] {
        &self.order
    }

    /// Render points handed to the rendering layer by resident shards
    pub fn points(&self) -> usize {
        self.points
    }

    /// Recompute and store the progress snapshot
    pub fn update_progress(&mut self, total: usize) -> Progress {
        self.progress = Progress::new(self.resident.len(), total);
        self.progress
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }
}

/// Load state shared between the coordinator and the cycles the viewport
/// reactor spawns. The lock is never held across an await.
#[derive(Debug, Default)]
pub struct SharedLoadState {
    state: Mutex<LoadState>,
    cycle_in_progress: AtomicBool,
}

impl SharedLoadState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the load cycle. `None` if another cycle is already running.
    pub fn try_begin_cycle(&self) -> Option<CycleGuard<'_>> {
        self.cycle_in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CycleGuard {
                flag: &self.cycle_in_progress,
            })
    }

    pub fn is_loading(&self) -> bool {
        self.cycle_in_progress.load(Ordering::Acquire)
    }

    /// Run `f` with the state locked
    pub fn with<R>(&self, f: impl FnOnce(&mut LoadState) -> R) -> R {
        let mut guard = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }

    pub fn is_resident(&self, code: &str) -> bool {
        self.with(|s| s.is_resident(code))
    }

    pub fn mark_resident(&self, code: &str, points: usize) -> bool {
        self.with(|s| s.mark_resident(code, points))
    }

    pub fn snapshot(&self) -> LoadState {
        self.with(|s| s.clone())
    }
}

/// Held for the duration of a load cycle; releases the guard flag on drop,
/// including when the cycle future is dropped mid-way.
#[derive(Debug)]
pub struct CycleGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
