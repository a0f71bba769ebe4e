//! Tandem Core - the processing unit interface and the data that flows
//! between units.
//!
//! This crate defines what a loadable unit looks like to the host and the
//! types passed through a chain on every block.
//!
//! # Core Abstractions
//!
//! - [`ProcessingUnit`] - Object-safe trait for loadable effects and instruments
//! - [`Sample`] / [`Precision`] - `f32`/`f64` rendering, sealed to those two types
//! - [`AudioBuffer`] - Planar multi-channel block
//! - [`BusesLayout`] / [`ChannelSet`] - Main and auxiliary bus topology
//! - [`EventBuffer`] - Side-channel control events
//! - [`PlayHead`] - Host transport position shared with every unit
//!
//! ## Utilities
//!
//! - [`DelayLine`] - Integer-sample delay, used for latency-preserving bypass
//! - [`ParamDescriptor`] - Parameter metadata
//!
//! # Example
//!
//! ```rust
//! use tandem_core::{AudioBuffer, BusesLayout, ChannelSet};
//!
//! let layout = BusesLayout::from_channel_counts(2, 2);
//! assert_eq!(layout.main_output(), Some(ChannelSet::Stereo));
//!
//! let buf = AudioBuffer::<f64>::new(layout.total_output_channels(), 256);
//! assert_eq!(buf.num_channels(), 2);
//! ```

pub mod buffer;
pub mod channel;
pub mod delay;
pub mod event;
pub mod param;
pub mod sample;
pub mod transport;
pub mod unit;

pub use buffer::AudioBuffer;
pub use channel::{BusesLayout, ChannelSet};
pub use delay::DelayLine;
pub use event::{ControlEvent, EventBuffer};
pub use param::{ParamDescriptor, ParamUnit};
pub use sample::{Precision, Sample};
pub use transport::{PlayHead, PositionInfo, TransportState};
pub use unit::ProcessingUnit;

/// Convert decibels to linear gain.
#[inline]
pub fn db_to_linear(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Convert linear gain to decibels, flooring silence at -120 dB.
#[inline]
pub fn linear_to_db(linear: f64) -> f64 {
    20.0 * linear.max(1e-6).log10()
}
