//! Read-only views of a chain for monitors and status displays.

use core::fmt;

use tandem_core::{BusesLayout, Precision};

use crate::aggregate::AggregateState;

/// State of one wrapper at snapshot time.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitSnapshot {
    /// Position in the chain.
    pub index: usize,
    /// Id the unit was added with.
    pub id: String,
    /// Display name; empty when not loaded.
    pub name: String,
    /// Whether an instance is loaded.
    pub ready: bool,
    /// Whether the unit is suspended (always true when not loaded).
    pub suspended: bool,
    /// Reported latency in samples.
    pub latency_samples: usize,
    /// Reported tail in seconds.
    pub tail_seconds: f64,
    /// Render precision; `None` when not loaded.
    pub precision: Option<Precision>,
    /// Extra input channels recorded by negotiation.
    pub extra_in: usize,
    /// Extra output channels recorded by negotiation.
    pub extra_out: usize,
    /// 95th percentile of recent render durations.
    pub p95_render_ms: f64,
}

/// State of a whole chain at snapshot time.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainSnapshot {
    /// Chain bus layout.
    pub layout: BusesLayout,
    /// Aggregate state.
    pub aggregate: AggregateState,
    /// Per-unit state in render order.
    pub units: Vec<UnitSnapshot>,
}

impl fmt::Display for ChainSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.aggregate)?;
        for u in &self.units {
            let state = match (u.ready, u.suspended) {
                (false, _) => "not loaded",
                (true, true) => "bypassed",
                (true, false) => "active",
            };
            writeln!(
                f,
                "  [{}] {:<12} {:<10} {:>3} {:>6} smp {:>7.3} s  +{}/{}  p95 {:.3} ms",
                u.index,
                u.name,
                state,
                u.precision.map_or("-", Precision::label),
                u.latency_samples,
                u.tail_seconds,
                u.extra_in,
                u.extra_out,
                u.p95_render_ms
            )?;
        }
        Ok(())
    }
}
