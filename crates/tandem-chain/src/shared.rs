//! Host context shared between a chain and its unit wrappers.
//!
//! [`ChainShared`] holds everything a wrapper needs from its owning chain
//! while loading: render settings, the negotiated layout, precision flags,
//! the play head and the unit source. Wrappers keep a clone instead of a
//! back-reference to the chain, so there is no ownership cycle.
//!
//! # Thread Safety
//!
//! - **Render settings**: `RwLock`, written only by `prepare_to_play`.
//! - **Negotiated layout**: `Mutex`, taken after the chain's unit lock and
//!   before any unit instance lock.
//! - **Aggregate state**: `ArcSwap`, wait-free reads.
//! - **Flags, latency, threshold**: atomics, relaxed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use arc_swap::ArcSwap;
use parking_lot::{Mutex, MutexGuard, RwLock};
use tandem_core::{AudioBuffer, BusesLayout, EventBuffer, PlayHead, Precision, ProcessingUnit, Sample};
use tandem_registry::{IdScheme, UnitSource};

use crate::aggregate::AggregateState;
use crate::error::ChainError;
use crate::negotiate::{Negotiation, negotiate};

/// Default slow-block warning threshold.
pub const DEFAULT_SLOW_BLOCK: Duration = Duration::from_millis(20);

/// Samples rendered through a freshly initialized unit before it joins the
/// chain.
pub const WARM_UP_SAMPLES: usize = 8192;

/// Sample rate and maximum block size the chain renders at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    /// Sample rate in Hz.
    pub sample_rate: f64,
    /// Maximum block size in frames.
    pub block_size: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            block_size: 512,
        }
    }
}

/// Chain layout plus the extra channels carried for auxiliary buses.
#[derive(Debug, Clone, PartialEq)]
pub struct NegotiatedLayout {
    /// Host-defined chain layout. Never modified by negotiation.
    pub layout: BusesLayout,
    /// Largest extra-channel requirement recorded so far.
    pub extra_channels: usize,
}

impl NegotiatedLayout {
    /// Negotiate `unit` against the chain layout, recording its extra
    /// channel requirement on success.
    pub fn negotiate(&mut self, unit: &mut dyn ProcessingUnit) -> Option<Negotiation> {
        let outcome = negotiate(&self.layout, unit)?;
        let (extra_in, extra_out) = outcome.extra();
        self.extra_channels = self.extra_channels.max(extra_in).max(extra_out);
        Some(outcome)
    }

    /// Replace the chain layout and forget recorded extra channels.
    pub fn reset(&mut self, layout: BusesLayout) {
        self.layout = layout;
        self.extra_channels = 0;
    }

    /// Channels a render buffer needs: the wider main bus plus extras.
    pub fn buffer_channels(&self) -> usize {
        self.layout
            .main_input_channels()
            .max(self.layout.main_output_channels())
            + self.extra_channels
    }
}

/// Result of initializing a freshly created unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct InitOutcome {
    pub precision: Precision,
    pub extra_in: usize,
    pub extra_out: usize,
}

struct ChainSharedData {
    settings: RwLock<RenderSettings>,
    negotiated: Mutex<NegotiatedLayout>,
    aggregate: ArcSwap<AggregateState>,
    /// Latency last published by either recomputation or the render path.
    latency_samples: AtomicUsize,
    double_precision: AtomicBool,
    identifier_ids: AtomicBool,
    slow_block_micros: AtomicU64,
    play_head: PlayHead,
    source: Arc<dyn UnitSource>,
}

/// Cloneable handle to a chain's host context.
#[derive(Clone)]
pub struct ChainShared {
    inner: Arc<ChainSharedData>,
}

impl ChainShared {
    /// Context for a chain resolving units through `source`.
    ///
    /// Instrument chains start with a stereo output and no input; effect
    /// chains with stereo in and out.
    pub fn new(source: Arc<dyn UnitSource>, instrument: bool) -> Self {
        Self {
            inner: Arc::new(ChainSharedData {
                settings: RwLock::new(RenderSettings::default()),
                negotiated: Mutex::new(NegotiatedLayout {
                    layout: BusesLayout::for_chain(instrument),
                    extra_channels: 0,
                }),
                aggregate: ArcSwap::from_pointee(AggregateState::default()),
                latency_samples: AtomicUsize::new(0),
                double_precision: AtomicBool::new(false),
                identifier_ids: AtomicBool::new(false),
                slow_block_micros: AtomicU64::new(micros(DEFAULT_SLOW_BLOCK)),
                play_head: PlayHead::default(),
                source,
            }),
        }
    }

    // ── Render settings ─────────────────────────────────────────────────────

    /// Current render settings.
    pub fn settings(&self) -> RenderSettings {
        *self.inner.settings.read()
    }

    /// Current sample rate.
    pub fn sample_rate(&self) -> f64 {
        self.settings().sample_rate
    }

    /// Current maximum block size.
    pub fn block_size(&self) -> usize {
        self.settings().block_size
    }

    pub(crate) fn set_settings(&self, settings: RenderSettings) {
        *self.inner.settings.write() = settings;
    }

    // ── Layout ──────────────────────────────────────────────────────────────

    /// Lock the negotiated layout.
    pub(crate) fn lock_layout(&self) -> MutexGuard<'_, NegotiatedLayout> {
        self.inner.negotiated.lock()
    }

    /// Copy of the negotiated layout.
    pub fn negotiated(&self) -> NegotiatedLayout {
        self.inner.negotiated.lock().clone()
    }

    /// Chain bus layout.
    pub fn layout(&self) -> BusesLayout {
        self.inner.negotiated.lock().layout.clone()
    }

    /// Extra channels currently carried by the chain.
    pub fn extra_channels(&self) -> usize {
        self.inner.negotiated.lock().extra_channels
    }

    // ── Aggregate state ─────────────────────────────────────────────────────

    /// Last published aggregate state.
    pub fn aggregate(&self) -> AggregateState {
        **self.inner.aggregate.load()
    }

    /// Publish a recomputed aggregate.
    pub(crate) fn publish_aggregate(&self, state: AggregateState) {
        self.inner.negotiated.lock().extra_channels = state.extra_channels;
        self.inner.aggregate.store(Arc::new(state));
        self.publish_latency(state.latency_samples);
    }

    /// Total chain latency in samples.
    pub fn latency_samples(&self) -> usize {
        self.inner.latency_samples.load(Ordering::Relaxed)
    }

    pub(crate) fn publish_latency(&self, latency: usize) {
        let previous = self.inner.latency_samples.swap(latency, Ordering::Relaxed);
        if previous != latency {
            tracing::debug!("ProcessorChain: updating latency samples to {latency}");
        }
    }

    // ── Host flags ──────────────────────────────────────────────────────────

    /// Whether the host renders the chain at double precision.
    pub fn double_precision(&self) -> bool {
        self.inner.double_precision.load(Ordering::Relaxed)
    }

    /// Select double-precision rendering for units loaded from now on.
    pub fn set_double_precision(&self, enabled: bool) {
        self.inner.double_precision.store(enabled, Ordering::Relaxed);
    }

    /// Active id scheme.
    pub fn id_scheme(&self) -> IdScheme {
        if self.inner.identifier_ids.load(Ordering::Relaxed) {
            IdScheme::Identifier
        } else {
            IdScheme::Native
        }
    }

    /// Select the id scheme used to resolve units.
    pub fn set_id_scheme(&self, scheme: IdScheme) {
        self.inner
            .identifier_ids
            .store(scheme == IdScheme::Identifier, Ordering::Relaxed);
    }

    /// Render duration above which a block is logged as slow.
    pub fn slow_block_threshold(&self) -> Duration {
        Duration::from_micros(self.inner.slow_block_micros.load(Ordering::Relaxed))
    }

    /// Change the slow-block threshold.
    pub fn set_slow_block_threshold(&self, threshold: Duration) {
        self.inner
            .slow_block_micros
            .store(micros(threshold), Ordering::Relaxed);
    }

    /// Host transport handle given to every unit.
    pub fn play_head(&self) -> PlayHead {
        self.inner.play_head.clone()
    }

    /// Unit source.
    pub fn source(&self) -> &Arc<dyn UnitSource> {
        &self.inner.source
    }

    // ── Unit initialization ─────────────────────────────────────────────────

    /// Negotiate, choose precision, prepare and warm up a new unit.
    pub(crate) fn init_plugin_instance(
        &self,
        unit: &mut dyn ProcessingUnit,
    ) -> Result<InitOutcome, ChainError> {
        let (outcome, buffer_channels) = {
            let mut negotiated = self.lock_layout();
            let Some(outcome) = negotiated.negotiate(unit) else {
                let err = ChainError::LayoutNotSupported {
                    inputs: negotiated.layout.main_input_channels(),
                    outputs: negotiated.layout.main_output_channels(),
                    extra: negotiated.extra_channels,
                    unit: unit.name().to_owned(),
                };
                tracing::warn!("ProcessorChain: {err}");
                return Err(err);
            };
            (outcome, negotiated.buffer_channels())
        };

        let wants_double = self.double_precision() && self.aggregate().supports_double_precision;
        let precision = if wants_double && unit.supports_double_precision() {
            Precision::Double
        } else {
            if wants_double {
                tracing::info!(
                    "ProcessorChain: host wants double precision but unit '{}' does not support it",
                    unit.name()
                );
            }
            Precision::Single
        };

        let RenderSettings {
            sample_rate,
            block_size,
        } = self.settings();
        unit.set_precision(precision);
        unit.prepare(sample_rate, block_size);
        unit.set_play_head(Some(self.play_head()));
        match precision {
            Precision::Single => warm_up::<f32>(unit, buffer_channels, block_size),
            Precision::Double => warm_up::<f64>(unit, buffer_channels, block_size),
        }

        let (extra_in, extra_out) = outcome.extra();
        Ok(InitOutcome {
            precision,
            extra_in,
            extra_out,
        })
    }
}

/// Render silence through `unit` until [`WARM_UP_SAMPLES`] have passed.
fn warm_up<T: Sample>(unit: &mut dyn ProcessingUnit, channels: usize, block_size: usize) {
    if block_size == 0 {
        return;
    }
    let mut buffer = AudioBuffer::<T>::new(channels, block_size);
    let mut events = EventBuffer::new();
    let mut processed = 0;
    while processed < WARM_UP_SAMPLES {
        T::process(&mut *unit, &mut buffer, &mut events);
        processed += block_size;
    }
}

fn micros(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}
