//! The chain manager.
//!
//! [`ProcessorChain`] owns an ordered sequence of [`UnitProcessor`]s. The
//! control path mutates it under one chain-wide mutex; the render path walks
//! an immutable copy of the sequence published through `ArcSwap` after every
//! mutation, so it never waits on the control path.
//!
//! ## Design Decisions
//!
//! - **Copy-on-write render list**: a unit removed while a block is in
//!   flight stays alive until that block's snapshot is dropped.
//! - **Recompute, don't patch**: aggregate state is rebuilt from every unit
//!   after each structural change, never adjusted incrementally.
//! - **Lock order**: chain units, then negotiated layout, then unit
//!   instance. Readers (snapshot, parameter values) take none of them.

use core::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tandem_core::{AudioBuffer, BusesLayout, EventBuffer, PlayHead, Precision, ProcessingUnit, Sample};
use tandem_registry::{IdScheme, UnitSource};

use crate::aggregate::AggregateState;
use crate::error::ChainError;
use crate::processor::UnitProcessor;
use crate::shared::{ChainShared, RenderSettings};
use crate::snapshot::ChainSnapshot;

type UnitList = Vec<Arc<UnitProcessor>>;

/// Ordered, dynamically reconfigurable chain of processing units.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use tandem_chain::ProcessorChain;
/// use tandem_core::{AudioBuffer, EventBuffer};
/// use tandem_registry::UnitCatalog;
///
/// let chain = ProcessorChain::new(Arc::new(UnitCatalog::with_builtins()));
/// chain.prepare_to_play(48000.0, 256);
/// chain.add_plugin_processor("builtin:gain").unwrap();
/// chain.add_plugin_processor("builtin:lookahead").unwrap();
/// assert_eq!(chain.to_string(), "Gain > Lookahead");
/// assert_eq!(chain.latency_samples(), 240);
///
/// let mut buf = AudioBuffer::<f32>::new(2, 256);
/// chain.process_block_f32(&mut buf, &mut EventBuffer::new());
/// ```
pub struct ProcessorChain {
    shared: ChainShared,
    units: Mutex<UnitList>,
    render: ArcSwap<UnitList>,
}

impl ProcessorChain {
    /// Effect chain (stereo in, stereo out) resolving units through
    /// `source`.
    pub fn new(source: Arc<dyn UnitSource>) -> Self {
        Self::with_layout(source, false)
    }

    /// Chain with the default layout for an instrument (stereo out only) or
    /// an effect.
    pub fn with_layout(source: Arc<dyn UnitSource>, instrument: bool) -> Self {
        Self {
            shared: ChainShared::new(source, instrument),
            units: Mutex::new(Vec::new()),
            render: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Host context shared with the chain's wrappers.
    pub fn shared(&self) -> &ChainShared {
        &self.shared
    }

    // ── Host lifecycle ──────────────────────────────────────────────────────

    /// Store the render settings and prepare every unit in order.
    pub fn prepare_to_play(&self, sample_rate: f64, block_size: usize) {
        self.shared.set_settings(RenderSettings {
            sample_rate,
            block_size,
        });
        let units = self.units.lock();
        for unit in units.iter() {
            unit.prepare_to_play(sample_rate, block_size);
        }
    }

    /// Release every unit's render resources.
    pub fn release_resources(&self) {
        let units = self.units.lock();
        for unit in units.iter() {
            unit.release_resources();
        }
    }

    // ── Render path ─────────────────────────────────────────────────────────

    /// Render a single-precision block through the chain.
    pub fn process_block_f32(&self, buffer: &mut AudioBuffer<f32>, events: &mut EventBuffer) {
        self.process_block(buffer, events);
    }

    /// Render a double-precision block through the chain.
    pub fn process_block_f64(&self, buffer: &mut AudioBuffer<f64>, events: &mut EventBuffer) {
        self.process_block(buffer, events);
    }

    /// Render a block at either precision, warning when it is slow.
    ///
    /// Never takes the chain mutex.
    pub fn process_block<T: Sample>(&self, buffer: &mut AudioBuffer<T>, events: &mut EventBuffer) {
        let start = Instant::now();
        let units = self.render.load();
        let mut latency = 0;
        for unit in units.iter() {
            if unit.process_block(buffer, events) {
                latency += unit.render_latency();
            }
        }
        self.shared.publish_latency(latency);

        let elapsed = start.elapsed();
        if elapsed > self.shared.slow_block_threshold() {
            tracing::warn!(
                "ProcessorChain: chain ({}): high audio processing time: {:.3} ms",
                describe(&units),
                elapsed.as_secs_f64() * 1000.0
            );
        }
    }

    // ── Structural mutation ─────────────────────────────────────────────────

    /// Change the chain's main channel counts and renegotiate every unit.
    ///
    /// Only 1 or 2 channels per side are recognized; any other count leaves
    /// that side without a main bus. Returns `false` on the first unit that
    /// rejects the new layout. Units before it keep their new layout; there
    /// is no rollback.
    pub fn update_channels(&self, channels_in: usize, channels_out: usize) -> bool {
        let layout = BusesLayout::from_channel_counts(channels_in, channels_out);
        let units = self.units.lock();
        {
            let mut negotiated = self.shared.lock_layout();
            negotiated.reset(layout);
            for (index, unit) in units.iter().enumerate() {
                if !unit.renegotiate(&mut negotiated) {
                    tracing::warn!(
                        "ProcessorChain: unit {index} ({}) rejected {channels_in}x{channels_out}",
                        unit.name()
                    );
                    return false;
                }
            }
        }
        self.update_locked(&units);
        true
    }

    /// Negotiate, choose precision, prepare and warm up a freshly created
    /// unit. Returns the precision chosen.
    pub fn init_plugin_instance(&self, unit: &mut dyn ProcessingUnit) -> Result<Precision, ChainError> {
        self.shared.init_plugin_instance(unit).map(|o| o.precision)
    }

    /// Load the unit named by `id` and append it.
    ///
    /// The chain is unchanged on failure.
    pub fn add_plugin_processor(&self, id: &str) -> Result<(), ChainError> {
        let settings = self.shared.settings();
        let mut units = self.units.lock();
        let unit = Arc::new(UnitProcessor::new(
            self.shared.clone(),
            id,
            settings.sample_rate,
            settings.block_size,
        ));
        unit.load()?;
        units.push(unit);
        self.update_locked(&units);
        tracing::info!("ProcessorChain: added {id} at {}", units.len() - 1);
        Ok(())
    }

    /// Remove the unit at `index`. Out of range is a no-op.
    pub fn del_processor(&self, index: usize) {
        let mut units = self.units.lock();
        if index < units.len() {
            let removed = units.remove(index);
            self.update_locked(&units);
            tracing::info!("ProcessorChain: removed {} from {index}", removed.id());
        }
    }

    /// Swap two units. A no-op if either index is out of range.
    ///
    /// Aggregate state is not recomputed; the tail may now come from a
    /// different unit until [`update`](Self::update) is called.
    pub fn exchange_processors(&self, a: usize, b: usize) {
        let mut units = self.units.lock();
        if a < units.len() && b < units.len() {
            units.swap(a, b);
            self.render.store(Arc::new(units.clone()));
        }
    }

    /// Suspend or resume the unit at `index` and recompute aggregate state.
    pub fn set_suspended(&self, index: usize, suspended: bool) {
        let units = self.units.lock();
        if let Some(unit) = units.get(index) {
            unit.suspend_processing(suspended);
            self.update_locked(&units);
        }
    }

    /// Release every unit, then empty the chain.
    pub fn clear(&self) {
        let mut units = self.units.lock();
        for unit in units.iter() {
            unit.release_resources();
        }
        units.clear();
        self.update_locked(&units);
    }

    /// Recompute aggregate state.
    pub fn update(&self) {
        let units = self.units.lock();
        self.update_locked(&units);
    }

    fn update_locked(&self, units: &UnitList) {
        let state = AggregateState::from_reports(units.iter().map(|u| u.report()));
        self.shared.publish_aggregate(state);
        self.render.store(Arc::new(units.clone()));
    }

    // ── Queries ─────────────────────────────────────────────────────────────

    /// Number of units.
    pub fn len(&self) -> usize {
        self.units.lock().len()
    }

    /// Returns true if the chain has no units.
    pub fn is_empty(&self) -> bool {
        self.units.lock().is_empty()
    }

    /// The wrapper at `index`.
    pub fn get_processor(&self, index: usize) -> Option<Arc<UnitProcessor>> {
        self.units.lock().get(index).cloned()
    }

    /// Value of parameter `param` of unit `unit`; 0 when either is absent.
    ///
    /// Reads the published render list; takes neither the chain mutex nor
    /// the unit's instance mutex.
    pub fn get_parameter_value(&self, unit: usize, param: usize) -> f32 {
        self.render
            .load()
            .get(unit)
            .and_then(|u| u.get_param(param))
            .unwrap_or(0.0)
    }

    /// Last published aggregate state.
    pub fn aggregate(&self) -> AggregateState {
        self.shared.aggregate()
    }

    /// Total latency in samples.
    pub fn latency_samples(&self) -> usize {
        self.shared.latency_samples()
    }

    /// Tail of the last active unit.
    pub fn tail_seconds(&self) -> f64 {
        self.shared.aggregate().tail_seconds
    }

    /// Whether every unit renders natively at double precision.
    pub fn supports_double_precision(&self) -> bool {
        self.shared.aggregate().supports_double_precision
    }

    /// Extra channels the chain carries for auxiliary buses.
    pub fn extra_channels(&self) -> usize {
        self.shared.extra_channels()
    }

    /// Chain bus layout.
    pub fn layout(&self) -> BusesLayout {
        self.shared.layout()
    }

    /// Channels a render buffer must have.
    pub fn buffer_channels(&self) -> usize {
        self.shared.negotiated().buffer_channels()
    }

    /// Whether the chain can run with `layout`.
    pub fn is_buses_layout_supported(&self, layout: &BusesLayout) -> bool {
        layout.is_supported_by_chain()
    }

    /// Point-in-time view of the chain, read from the published render list
    /// without blocking mutation or rendering.
    pub fn snapshot(&self) -> ChainSnapshot {
        let units = self.render.load();
        ChainSnapshot {
            layout: self.shared.layout(),
            aggregate: self.shared.aggregate(),
            units: units.iter().enumerate().map(|(i, u)| u.snapshot(i)).collect(),
        }
    }

    // ── Host flags ──────────────────────────────────────────────────────────

    /// Render at double precision where every unit allows it.
    pub fn set_double_precision(&self, enabled: bool) {
        self.shared.set_double_precision(enabled);
    }

    /// Select the id scheme for subsequent loads.
    pub fn set_id_scheme(&self, scheme: IdScheme) {
        self.shared.set_id_scheme(scheme);
    }

    /// Change the slow-block warning threshold.
    pub fn set_slow_block_threshold(&self, threshold: Duration) {
        self.shared.set_slow_block_threshold(threshold);
    }

    /// Host transport handle shared with every unit.
    pub fn play_head(&self) -> PlayHead {
        self.shared.play_head()
    }
}

/// Unit names joined by `" > "`, `<bypassed>` for suspended units.
fn describe(units: &[Arc<UnitProcessor>]) -> String {
    units
        .iter()
        .map(|u| {
            if u.is_suspended() {
                "<bypassed>".to_owned()
            } else {
                u.name()
            }
        })
        .collect::<Vec<_>>()
        .join(" > ")
}

impl fmt::Display for ProcessorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&describe(&self.units.lock()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_registry::UnitCatalog;

    fn chain() -> ProcessorChain {
        let chain = ProcessorChain::new(Arc::new(UnitCatalog::with_builtins()));
        chain.prepare_to_play(48000.0, 128);
        chain
    }

    #[test]
    fn empty_chain_state() {
        let c = chain();
        assert!(c.is_empty());
        assert_eq!(c.to_string(), "");
        assert_eq!(c.latency_samples(), 0);
        assert!(c.supports_double_precision());
        assert!(c.get_processor(0).is_none());
    }

    #[test]
    fn render_list_follows_mutations() {
        let c = chain();
        c.add_plugin_processor("builtin:gain").unwrap();
        c.add_plugin_processor("builtin:echo").unwrap();
        assert_eq!(c.render.load().len(), 2);
        c.exchange_processors(0, 1);
        assert_eq!(c.render.load()[0].name(), "Echo");
        c.del_processor(0);
        assert_eq!(c.render.load().len(), 1);
        c.clear();
        assert!(c.render.load().is_empty());
    }

    #[test]
    fn removed_unit_outlives_in_flight_snapshot() {
        let c = chain();
        c.add_plugin_processor("builtin:gain").unwrap();
        let in_flight = c.render.load_full();
        c.del_processor(0);
        assert!(c.is_empty());
        assert!(in_flight[0].is_loaded());
    }

    #[test]
    fn describe_marks_bypassed() {
        let c = chain();
        c.add_plugin_processor("builtin:gain").unwrap();
        c.add_plugin_processor("builtin:echo").unwrap();
        c.set_suspended(1, true);
        assert_eq!(c.to_string(), "Gain > <bypassed>");
    }
}
