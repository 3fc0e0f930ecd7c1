//! Frame statistics for debugging and performance analysis.
//!
//! The scene accumulates counters as it renders and collects; read them with
//! [`Scene::stats`](crate::Scene::stats). A one-line summary is logged at
//! debug level on every orphanage sweep.

use std::fmt;

/// Snapshot of accumulated scene statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    pub frames_rendered: u64,
    /// Frames skipped because nothing changed
    pub frames_skipped: u64,
    pub offscreen_transitions: u64,
    /// Back-queue flushes (every collect interval)
    pub queue_flushes: u64,
    /// Orphanage sweeps (every sweep interval)
    pub sweeps: u64,
    pub resources_released: u64,
    pub proxies_finalized: u64,
}

impl FrameStats {
    /// Share of frames that were skipped, as a percentage.
    pub fn skip_rate(&self) -> f64 {
        let total = self.frames_rendered + self.frames_skipped;
        if total == 0 {
            return 0.0;
        }
        self.frames_skipped as f64 / total as f64 * 100.0
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for FrameStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frames: {} rendered, {} skipped ({:.1}% skip) | offscreen transitions: {} | \
             flushes: {} | sweeps: {} | released: {} resources, {} proxies",
            self.frames_rendered,
            self.frames_skipped,
            self.skip_rate(),
            self.offscreen_transitions,
            self.queue_flushes,
            self.sweeps,
            self.resources_released,
            self.proxies_finalized,
        )
    }
}
