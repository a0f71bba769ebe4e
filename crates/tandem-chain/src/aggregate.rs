//! Chain-wide derived state.
//!
//! [`AggregateState`] is recomputed from scratch after every structural
//! mutation. [`AggregateState::from_reports`] is a pure function of the
//! per-unit [`UnitReport`]s so the rules can be tested without live units.

use core::fmt;

/// What one unit contributes to the aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UnitReport {
    /// Suspended (or not loaded).
    pub suspended: bool,
    /// Reported latency in samples.
    pub latency_samples: usize,
    /// Reported tail in seconds.
    pub tail_seconds: f64,
    /// Whether the unit renders natively at double precision.
    pub supports_double_precision: bool,
    /// Channels beyond the main bus the unit's applied layout needs.
    pub extra_channels: usize,
}

/// Derived state of a whole chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateState {
    /// Sum of latencies of non-suspended units.
    pub latency_samples: usize,
    /// Tail of the last non-suspended unit; 0 if there is none.
    pub tail_seconds: f64,
    /// True iff every unit supports double precision (true when empty).
    pub supports_double_precision: bool,
    /// Largest extra-channel requirement of any unit.
    pub extra_channels: usize,
}

impl Default for AggregateState {
    /// State of an empty chain.
    fn default() -> Self {
        Self {
            latency_samples: 0,
            tail_seconds: 0.0,
            supports_double_precision: true,
            extra_channels: 0,
        }
    }
}

impl AggregateState {
    /// Compute the aggregate of `reports`, given in render order.
    ///
    /// Suspended units contribute neither latency nor tail, but still count
    /// toward precision support and extra channels: resuming a unit must not
    /// require renegotiation.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tandem_chain::{AggregateState, UnitReport};
    ///
    /// let a = UnitReport { latency_samples: 128, tail_seconds: 0.1, supports_double_precision: true, ..Default::default() };
    /// let b = UnitReport { suspended: true, latency_samples: 64, tail_seconds: 0.5, ..Default::default() };
    /// let agg = AggregateState::from_reports([a, b]);
    /// assert_eq!(agg.latency_samples, 128);
    /// assert_eq!(agg.tail_seconds, 0.1);
    /// assert!(!agg.supports_double_precision);
    /// ```
    pub fn from_reports<I>(reports: I) -> Self
    where
        I: IntoIterator<Item = UnitReport>,
    {
        let mut state = Self::default();
        let mut last_active_tail = None;
        for report in reports {
            state.supports_double_precision &= report.supports_double_precision;
            state.extra_channels = state.extra_channels.max(report.extra_channels);
            if !report.suspended {
                state.latency_samples += report.latency_samples;
                last_active_tail = Some(report.tail_seconds);
            }
        }
        state.tail_seconds = last_active_tail.unwrap_or(0.0);
        state
    }
}

impl fmt::Display for AggregateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "latency {} samples, tail {:.3} s, {}, {} extra channel(s)",
            self.latency_samples,
            self.tail_seconds,
            if self.supports_double_precision {
                "f64 capable"
            } else {
                "f32 only"
            },
            self.extra_channels
        )
    }
}
