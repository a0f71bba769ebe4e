//! Render timing statistics.

use std::time::Duration;

/// Number of recent render durations kept per unit.
pub const STATS_WINDOW: usize = 256;

/// Rolling window of render durations in milliseconds.
///
/// Storage is allocated once; [`add`](Self::add) never allocates, so it is
/// safe to call from the render path.
#[derive(Debug, Clone)]
pub struct TimeStatistics {
    samples: Vec<f64>,
    next: usize,
    filled: usize,
}

impl Default for TimeStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeStatistics {
    /// Empty window.
    pub fn new() -> Self {
        Self {
            samples: vec![0.0; STATS_WINDOW],
            next: 0,
            filled: 0,
        }
    }

    /// Record one render duration.
    pub fn add(&mut self, elapsed: Duration) {
        self.samples[self.next] = elapsed.as_secs_f64() * 1000.0;
        self.next = (self.next + 1) % STATS_WINDOW;
        self.filled = (self.filled + 1).min(STATS_WINDOW);
    }

    /// Number of durations in the window.
    pub fn len(&self) -> usize {
        self.filled
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// Mean duration in milliseconds; 0 when empty.
    pub fn average_ms(&self) -> f64 {
        if self.filled == 0 {
            return 0.0;
        }
        self.samples[..self.filled].iter().sum::<f64>() / self.filled as f64
    }

    /// Nearest-rank percentile in milliseconds (`p` in 0..=100); 0 when
    /// empty.
    pub fn percentile_ms(&self, p: f64) -> f64 {
        if self.filled == 0 {
            return 0.0;
        }
        let mut sorted = self.samples[..self.filled].to_vec();
        sorted.sort_by(f64::total_cmp);
        let rank = ((p.clamp(0.0, 100.0) / 100.0) * self.filled as f64).ceil() as usize;
        sorted[rank.clamp(1, self.filled) - 1]
    }

    /// Forget all recorded durations.
    pub fn reset(&mut self) {
        self.next = 0;
        self.filled = 0;
    }
}
