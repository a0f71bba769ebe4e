//! The processing unit interface.
//!
//! A [`ProcessingUnit`] is an opaque, independently developed effect or
//! instrument that the host loads at runtime. The chain only talks to units
//! through this trait: lifecycle (`prepare`/`release`), rendering at either
//! precision, capability reports (latency, tail, bus layouts, precision
//! support), parameters, and an opaque state blob.
//!
//! ## Design Decisions
//!
//! - **Two render entry points**: `process_f32` and `process_f64` are both
//!   required. A unit that cannot render natively at double precision reports
//!   `supports_double_precision() == false`; the host then never selects
//!   [`Precision::Double`] for it and converts at the boundary instead.
//!
//! - **Object-safe**: units live behind `Box<dyn ProcessingUnit + Send>`.
//!
//! - **Layouts are negotiated, not assumed**: the host asks
//!   [`check_buses_layout_supported`](ProcessingUnit::check_buses_layout_supported)
//!   before calling [`set_buses_layout`](ProcessingUnit::set_buses_layout).

use crate::buffer::AudioBuffer;
use crate::channel::BusesLayout;
use crate::event::EventBuffer;
use crate::param::ParamDescriptor;
use crate::sample::Precision;
use crate::transport::PlayHead;

/// A loadable audio processing unit.
///
/// # Example
///
/// ```rust
/// use tandem_core::{AudioBuffer, BusesLayout, EventBuffer, ProcessingUnit};
///
/// struct Silence {
///     layout: BusesLayout,
/// }
///
/// impl ProcessingUnit for Silence {
///     fn name(&self) -> &str {
///         "Silence"
///     }
///     fn prepare(&mut self, _sample_rate: f64, _block_size: usize) {}
///     fn release(&mut self) {}
///     fn process_f32(&mut self, buffer: &mut AudioBuffer<f32>, _events: &mut EventBuffer) {
///         buffer.clear();
///     }
///     fn process_f64(&mut self, buffer: &mut AudioBuffer<f64>, _events: &mut EventBuffer) {
///         buffer.clear();
///     }
///     fn buses_layout(&self) -> BusesLayout {
///         self.layout.clone()
///     }
///     fn check_buses_layout_supported(&self, layout: &BusesLayout) -> bool {
///         layout.main_output_channels() == layout.main_input_channels()
///     }
///     fn set_buses_layout(&mut self, layout: &BusesLayout) -> bool {
///         self.layout = layout.clone();
///         true
///     }
/// }
///
/// let mut unit = Silence { layout: BusesLayout::for_chain(false) };
/// let mut buf = AudioBuffer::from_channels(vec![vec![1.0_f32; 4]; 2]);
/// unit.process_f32(&mut buf, &mut EventBuffer::new());
/// assert_eq!(buf.peak(), 0.0);
/// ```
pub trait ProcessingUnit {
    /// Display name.
    fn name(&self) -> &str;

    /// Allocate render resources for the given rate and maximum block size.
    fn prepare(&mut self, sample_rate: f64, block_size: usize);

    /// Release render resources allocated by [`prepare`](Self::prepare).
    fn release(&mut self);

    /// Render a single-precision block in place.
    fn process_f32(&mut self, buffer: &mut AudioBuffer<f32>, events: &mut EventBuffer);

    /// Render a double-precision block in place.
    fn process_f64(&mut self, buffer: &mut AudioBuffer<f64>, events: &mut EventBuffer);

    /// Latency introduced by the unit, in samples.
    fn latency_samples(&self) -> usize {
        0
    }

    /// Seconds of output the unit keeps producing after its input goes silent.
    fn tail_seconds(&self) -> f64 {
        0.0
    }

    /// Whether [`process_f64`](Self::process_f64) renders natively.
    fn supports_double_precision(&self) -> bool {
        false
    }

    /// Select the precision the host will render at.
    fn set_precision(&mut self, _precision: Precision) {}

    /// Currently applied (or preferred, before negotiation) bus layout.
    fn buses_layout(&self) -> BusesLayout;

    /// Whether the unit could run with `layout`.
    fn check_buses_layout_supported(&self, layout: &BusesLayout) -> bool;

    /// Apply `layout`. Returns `false` if the unit refused it.
    fn set_buses_layout(&mut self, layout: &BusesLayout) -> bool;

    /// Attach (or detach) the host transport.
    fn set_play_head(&mut self, _play_head: Option<PlayHead>) {}

    /// Number of parameters.
    fn param_count(&self) -> usize {
        0
    }

    /// Descriptor for parameter `index`.
    fn param_info(&self, _index: usize) -> Option<ParamDescriptor> {
        None
    }

    /// Current value of parameter `index`; 0 when out of range.
    fn get_param(&self, _index: usize) -> f32 {
        0.0
    }

    /// Set parameter `index`. Out-of-range indices are ignored.
    fn set_param(&mut self, _index: usize, _value: f32) {}

    /// Opaque state blob.
    fn state(&self) -> Vec<u8> {
        Vec::new()
    }

    /// Restore state previously returned by [`state`](Self::state).
    fn set_state(&mut self, _data: &[u8]) {}
}
