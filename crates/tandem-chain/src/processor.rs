//! Processing unit wrapper.
//!
//! A [`UnitProcessor`] owns at most one loaded unit instance and mediates
//! every access to it: lifecycle on the control path, rendering on the
//! render path.
//!
//! ## Design Decisions
//!
//! - **Bounded wait on the render path**: the instance sits behind a mutex
//!   that only structural control operations take. The render path waits at
//!   most [`RENDER_LOCK_WAIT`] for it; a block that still finds it busy
//!   passes through that unit untouched.
//! - **Published view for readers**: name, precision, tail, parameter
//!   descriptors and values are published outside the instance mutex and
//!   refreshed by the render path after every block. Monitors and parameter
//!   reads never contend with rendering.
//! - **Latency-preserving bypass**: a suspended unit with non-zero latency
//!   still delays its input by that latency, so downstream alignment does
//!   not jump when bypass toggles. The render path counts that delay in the
//!   latency it publishes.
//! - **Precision fallback**: a unit initialized at single precision inside
//!   a double-precision render (or vice versa) renders through a scratch
//!   buffer of its own width.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use arc_swap::{ArcSwap, ArcSwapOption};
use parking_lot::Mutex;
use tandem_core::{AudioBuffer, DelayLine, EventBuffer, ParamDescriptor, Precision, Sample};
use tandem_registry::BoxedUnit;

use crate::aggregate::UnitReport;
use crate::error::ChainError;
use crate::negotiate::extra_channels_of;
use crate::shared::{ChainShared, NegotiatedLayout};
use crate::snapshot::UnitSnapshot;
use crate::stats::TimeStatistics;

/// Longest the render path waits for a unit busy on the control path.
pub const RENDER_LOCK_WAIT: Duration = Duration::from_millis(1);

static INSTANCE_COUNT: AtomicU32 = AtomicU32::new(0);
static LOADED_COUNT: AtomicU32 = AtomicU32::new(0);

/// Wrappers currently alive in the process.
pub fn instance_count() -> u32 {
    INSTANCE_COUNT.load(Ordering::Relaxed)
}

/// Wrappers currently holding a loaded instance.
pub fn loaded_count() -> u32 {
    LOADED_COUNT.load(Ordering::Relaxed)
}

/// Read-only view of a loaded unit, readable without the instance mutex.
struct Published {
    precision: Precision,
    supports_double_precision: bool,
    tail_bits: AtomicU64,
    params: Vec<Option<ParamDescriptor>>,
    values: Vec<AtomicU32>,
}

impl Published {
    fn capture(unit: &BoxedUnit, precision: Precision) -> Self {
        let count = unit.param_count();
        Self {
            precision,
            supports_double_precision: unit.supports_double_precision(),
            tail_bits: AtomicU64::new(unit.tail_seconds().to_bits()),
            params: (0..count).map(|i| unit.param_info(i)).collect(),
            values: (0..count).map(|i| AtomicU32::new(unit.get_param(i).to_bits())).collect(),
        }
    }

    fn tail_seconds(&self) -> f64 {
        f64::from_bits(self.tail_bits.load(Ordering::Relaxed))
    }

    fn get_param(&self, index: usize) -> Option<f32> {
        self.values
            .get(index)
            .map(|v| f32::from_bits(v.load(Ordering::Relaxed)))
    }
}

/// A loaded instance and its render-side state.
struct LoadedUnit {
    unit: BoxedUnit,
    /// Resources allocated (`prepare` called without a matching `release`).
    prepared: bool,
    precision: Precision,
    bypass: Vec<DelayLine<f64>>,
    scratch_f32: AudioBuffer<f32>,
    scratch_f64: AudioBuffer<f64>,
    published: Arc<Published>,
}

impl LoadedUnit {
    /// Copy tail and parameter values into the published view.
    fn publish(&self) {
        let published = &self.published;
        published
            .tail_bits
            .store(self.unit.tail_seconds().to_bits(), Ordering::Relaxed);
        for (index, value) in published.values.iter().enumerate() {
            value.store(self.unit.get_param(index).to_bits(), Ordering::Relaxed);
        }
    }

    fn prepare(&mut self, sample_rate: f64, block_size: usize) {
        self.unit.prepare(sample_rate, block_size);
        self.prepared = true;
    }

    fn release(&mut self) {
        if self.prepared {
            self.unit.release();
            self.prepared = false;
        }
    }

    /// Read the unit's latency, resizing bypass lines if it changed.
    fn refresh_latency(&mut self, cached: &AtomicUsize) -> usize {
        let latency = self.unit.latency_samples();
        if cached.swap(latency, Ordering::Relaxed) != latency {
            for line in &mut self.bypass {
                line.set_delay(latency);
            }
        }
        latency
    }

    fn render<T: Sample>(&mut self, buffer: &mut AudioBuffer<T>, events: &mut EventBuffer) {
        if T::PRECISION == self.precision {
            T::process(&mut *self.unit, buffer, events);
            return;
        }
        match self.precision {
            Precision::Single => {
                self.scratch_f32.copy_converted_from(buffer);
                <f32 as Sample>::process(&mut *self.unit, &mut self.scratch_f32, events);
                buffer.copy_converted_from(&self.scratch_f32);
            }
            Precision::Double => {
                self.scratch_f64.copy_converted_from(buffer);
                <f64 as Sample>::process(&mut *self.unit, &mut self.scratch_f64, events);
                buffer.copy_converted_from(&self.scratch_f64);
            }
        }
    }

    fn render_bypassed<T: Sample>(&mut self, buffer: &mut AudioBuffer<T>, latency: usize) {
        let channels = buffer.num_channels();
        if self.bypass.len() < channels {
            self.bypass.resize_with(channels, || DelayLine::new(latency));
        }
        for (ch, line) in self.bypass.iter_mut().enumerate().take(channels) {
            for s in buffer.channel_mut(ch) {
                *s = T::from_f64(line.process(s.to_f64()));
            }
        }
    }
}

/// Wrapper around one (possibly not yet loaded) unit in a chain.
pub struct UnitProcessor {
    id: String,
    sample_rate: f64,
    block_size: usize,
    shared: ChainShared,
    slot: Mutex<Option<LoadedUnit>>,
    published: ArcSwapOption<Published>,
    stats: Mutex<TimeStatistics>,
    name: ArcSwap<String>,
    loaded: AtomicBool,
    suspended: AtomicBool,
    last_known_latency: AtomicUsize,
    extra_in: AtomicUsize,
    extra_out: AtomicUsize,
}

impl UnitProcessor {
    /// Wrapper for `id`, to be instantiated at `sample_rate`/`block_size`.
    ///
    /// Nothing is loaded until [`load`](Self::load).
    pub fn new(shared: ChainShared, id: impl Into<String>, sample_rate: f64, block_size: usize) -> Self {
        INSTANCE_COUNT.fetch_add(1, Ordering::Relaxed);
        Self {
            id: id.into(),
            sample_rate,
            block_size,
            shared,
            slot: Mutex::new(None),
            published: ArcSwapOption::empty(),
            stats: Mutex::new(TimeStatistics::new()),
            name: ArcSwap::from_pointee(String::new()),
            loaded: AtomicBool::new(false),
            suspended: AtomicBool::new(false),
            last_known_latency: AtomicUsize::new(0),
            extra_in: AtomicUsize::new(0),
            extra_out: AtomicUsize::new(0),
        }
    }

    /// Id this wrapper was created with.
    pub fn id(&self) -> &str {
        &self.id
    }

    // ── Lifecycle ───────────────────────────────────────────────────────────

    /// Resolve, instantiate and initialize the unit.
    ///
    /// A no-op when already loaded. On failure nothing is loaded and the
    /// error describes which step failed.
    pub fn load(&self) -> Result<(), ChainError> {
        if self.is_loaded() {
            return Ok(());
        }

        let source = Arc::clone(self.shared.source());
        let descriptor = source
            .find_descriptor(&self.id, self.shared.id_scheme())
            .ok_or_else(|| {
                let err = ChainError::not_found(&self.id);
                tracing::warn!("UnitProcessor: {err}");
                err
            })?;
        let mut unit = source
            .instantiate(&descriptor, self.sample_rate, self.block_size)
            .map_err(|reason| {
                let err = ChainError::instantiation(&descriptor.file_or_identifier, reason);
                tracing::warn!("UnitProcessor: {err}");
                err
            })?;

        let outcome = self.shared.init_plugin_instance(unit.as_mut())?;
        let channels = self.shared.negotiated().buffer_channels();
        let published = Arc::new(Published::capture(&unit, outcome.precision));
        let mut loaded = LoadedUnit {
            unit,
            prepared: true,
            precision: outcome.precision,
            bypass: Vec::new(),
            scratch_f32: AudioBuffer::new(channels, self.block_size),
            scratch_f64: AudioBuffer::new(channels, self.block_size),
            published: Arc::clone(&published),
        };
        loaded.refresh_latency(&self.last_known_latency);
        let name = loaded.unit.name().to_owned();

        let mut slot = self.slot.lock();
        if slot.is_some() {
            // Lost a race with a concurrent load of the same wrapper.
            drop(slot);
            loaded.release();
            return Ok(());
        }
        *slot = Some(loaded);
        self.stats.lock().reset();
        self.published.store(Some(published));
        self.extra_in.store(outcome.extra_in, Ordering::Relaxed);
        self.extra_out.store(outcome.extra_out, Ordering::Relaxed);
        self.name.store(Arc::new(name));
        self.loaded.store(true, Ordering::Relaxed);
        LOADED_COUNT.fetch_add(1, Ordering::Relaxed);
        drop(slot);

        tracing::info!(
            "UnitProcessor: loaded {} as {} ({})",
            self.id,
            self.name(),
            outcome.precision.label()
        );
        Ok(())
    }

    /// Release and drop the loaded instance, if any.
    pub fn unload(&self) {
        let taken = {
            let mut slot = self.slot.lock();
            let mut taken = slot.take();
            if let Some(loaded) = taken.as_mut() {
                loaded.release();
                self.loaded.store(false, Ordering::Relaxed);
                self.published.store(None);
            }
            taken
        };
        if taken.is_some() {
            LOADED_COUNT.fetch_sub(1, Ordering::Relaxed);
            self.name.store(Arc::new(String::new()));
            tracing::debug!("UnitProcessor: unloaded {}", self.id);
        }
    }

    /// Whether an instance is loaded.
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Relaxed)
    }

    /// Suspend (release resources, bypass) or resume (prepare at the
    /// chain's current settings, render). No-op when not loaded.
    pub fn suspend_processing(&self, suspended: bool) {
        let mut slot = self.slot.lock();
        let Some(loaded) = slot.as_mut() else {
            return;
        };
        if suspended {
            self.suspended.store(true, Ordering::Relaxed);
            loaded.release();
            for line in &mut loaded.bypass {
                line.reset();
            }
        } else {
            let settings = self.shared.settings();
            loaded.prepare(settings.sample_rate, settings.block_size);
            self.suspended.store(false, Ordering::Relaxed);
        }
    }

    /// Whether the unit is suspended. True when nothing is loaded.
    pub fn is_suspended(&self) -> bool {
        !self.is_loaded() || self.suspended.load(Ordering::Relaxed)
    }

    /// Allocate render resources.
    pub fn prepare_to_play(&self, sample_rate: f64, block_size: usize) {
        if let Some(loaded) = self.slot.lock().as_mut() {
            loaded.prepare(sample_rate, block_size);
        }
    }

    /// Release render resources.
    pub fn release_resources(&self) {
        if let Some(loaded) = self.slot.lock().as_mut() {
            loaded.release();
        }
    }

    // ── Render path ─────────────────────────────────────────────────────────

    /// Render one block in place.
    ///
    /// Returns `false` when nothing is loaded. Waits at most
    /// [`RENDER_LOCK_WAIT`] for an instance busy on the control path; past
    /// that the block passes through unchanged.
    pub fn process_block<T: Sample>(&self, buffer: &mut AudioBuffer<T>, events: &mut EventBuffer) -> bool {
        let Some(mut slot) = self.slot.try_lock_for(RENDER_LOCK_WAIT) else {
            tracing::trace!("UnitProcessor: {} busy, passing block through", self.id);
            return self.is_loaded();
        };
        let Some(loaded) = slot.as_mut() else {
            return false;
        };
        if self.suspended.load(Ordering::Relaxed) {
            let latency = self.last_known_latency.load(Ordering::Relaxed);
            if latency > 0 {
                loaded.render_bypassed(buffer, latency);
            }
            return true;
        }
        let start = Instant::now();
        loaded.render(buffer, events);
        let elapsed = start.elapsed();
        loaded.refresh_latency(&self.last_known_latency);
        loaded.publish();
        drop(slot);
        // A monitor reading percentiles costs one timing sample, never audio.
        if let Some(mut stats) = self.stats.try_lock() {
            stats.add(elapsed);
        }
        true
    }

    /// Delay this unit applied to the last rendered block, without locking.
    ///
    /// A suspended unit still delays by its last known latency, so it counts.
    pub(crate) fn render_latency(&self) -> usize {
        self.last_known_latency.load(Ordering::Relaxed)
    }

    // ── Queries ─────────────────────────────────────────────────────────────

    /// Display name; empty when not loaded.
    pub fn name(&self) -> String {
        String::clone(&self.name.load())
    }

    /// Current latency reported by the unit; 0 when not loaded.
    ///
    /// Refreshes the last known latency when the instance is free, otherwise
    /// returns the value the render path last saw.
    pub fn latency_samples(&self) -> usize {
        if !self.is_loaded() {
            return 0;
        }
        if let Some(mut slot) = self.slot.try_lock()
            && let Some(loaded) = slot.as_mut()
        {
            return loaded.refresh_latency(&self.last_known_latency);
        }
        self.last_known_latency.load(Ordering::Relaxed)
    }

    /// Tail reported by the unit; 0 when not loaded.
    pub fn tail_seconds(&self) -> f64 {
        self.published.load_full().map_or(0.0, |p| p.tail_seconds())
    }

    /// Whether the unit renders natively at double precision.
    pub fn supports_double_precision(&self) -> bool {
        self.published
            .load_full()
            .is_some_and(|p| p.supports_double_precision)
    }

    /// Precision chosen at load time.
    pub fn precision(&self) -> Option<Precision> {
        self.published.load_full().map(|p| p.precision)
    }

    /// Extra input channels recorded by the last negotiation.
    pub fn extra_in_channels(&self) -> usize {
        self.extra_in.load(Ordering::Relaxed)
    }

    /// Extra output channels recorded by the last negotiation.
    pub fn extra_out_channels(&self) -> usize {
        self.extra_out.load(Ordering::Relaxed)
    }

    /// Number of unit parameters; 0 when not loaded.
    pub fn param_count(&self) -> usize {
        self.published.load_full().map_or(0, |p| p.params.len())
    }

    /// Descriptor of parameter `index`, if loaded and described.
    pub fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        self.published.load_full()?.params.get(index)?.clone()
    }

    /// Index of the parameter whose key is `key`.
    pub fn param_index(&self, key: &str) -> Option<usize> {
        let published = self.published.load_full()?;
        published
            .params
            .iter()
            .position(|p| p.as_ref().is_some_and(|p| p.key == key))
    }

    /// Value of parameter `index` as of the last block or control change.
    pub fn get_param(&self, index: usize) -> Option<f32> {
        self.published.load_full()?.get_param(index)
    }

    /// Set parameter `index`. Ignored when not loaded.
    pub fn set_param(&self, index: usize, value: f32) {
        if let Some(loaded) = self.slot.lock().as_mut() {
            loaded.unit.set_param(index, value);
            loaded.publish();
        }
    }

    /// Opaque unit state; `None` when not loaded.
    pub fn state(&self) -> Option<Vec<u8>> {
        self.slot.lock().as_ref().map(|l| l.unit.state())
    }

    /// Restore opaque unit state. Ignored when not loaded.
    pub fn set_state(&self, data: &[u8]) {
        if let Some(loaded) = self.slot.lock().as_mut() {
            loaded.unit.set_state(data);
            loaded.publish();
        }
    }

    /// Contribution to the chain aggregate.
    pub fn report(&self) -> UnitReport {
        let mut slot = self.slot.lock();
        let Some(loaded) = slot.as_mut() else {
            return UnitReport {
                suspended: true,
                supports_double_precision: true,
                ..UnitReport::default()
            };
        };
        UnitReport {
            suspended: self.suspended.load(Ordering::Relaxed),
            latency_samples: loaded.refresh_latency(&self.last_known_latency),
            tail_seconds: loaded.unit.tail_seconds(),
            supports_double_precision: loaded.unit.supports_double_precision(),
            extra_channels: extra_channels_of(&loaded.unit.buses_layout()),
        }
    }

    /// Point-in-time view for monitors. Never takes the instance mutex.
    pub fn snapshot(&self, index: usize) -> UnitSnapshot {
        let published = self.published.load_full();
        let (tail_seconds, precision) = match &published {
            Some(p) => (p.tail_seconds(), Some(p.precision)),
            None => (0.0, None),
        };
        UnitSnapshot {
            index,
            id: self.id.clone(),
            name: self.name(),
            ready: published.is_some(),
            suspended: self.is_suspended(),
            latency_samples: if published.is_some() {
                self.last_known_latency.load(Ordering::Relaxed)
            } else {
                0
            },
            tail_seconds,
            precision,
            extra_in: self.extra_in_channels(),
            extra_out: self.extra_out_channels(),
            p95_render_ms: self.stats.lock().percentile_ms(95.0),
        }
    }

    /// Negotiate the loaded unit against a changed chain layout.
    ///
    /// Fails when nothing is loaded.
    pub(crate) fn renegotiate(&self, negotiated: &mut NegotiatedLayout) -> bool {
        let mut slot = self.slot.lock();
        let Some(loaded) = slot.as_mut() else {
            return false;
        };
        let Some(outcome) = negotiated.negotiate(&mut *loaded.unit) else {
            return false;
        };
        let (extra_in, extra_out) = outcome.extra();
        self.extra_in.store(extra_in, Ordering::Relaxed);
        self.extra_out.store(extra_out, Ordering::Relaxed);
        true
    }
}

impl Drop for UnitProcessor {
    fn drop(&mut self) {
        self.unload();
        INSTANCE_COUNT.fetch_sub(1, Ordering::Relaxed);
    }
}
