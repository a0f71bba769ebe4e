//! Sample formats and rendering precision.
//!
//! The chain renders either `f32` or `f64` blocks end to end. [`Sample`] is
//! sealed and implemented for exactly those two types so generic render code
//! can dispatch to the matching [`ProcessingUnit`] entry point without
//! specialization.

use crate::buffer::AudioBuffer;
use crate::event::EventBuffer;
use crate::unit::ProcessingUnit;

/// Floating-point width a unit renders at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Precision {
    /// 32-bit samples.
    #[default]
    Single,
    /// 64-bit samples.
    Double,
}

impl Precision {
    /// Short label used in logs and snapshots.
    pub const fn label(self) -> &'static str {
        match self {
            Precision::Single => "f32",
            Precision::Double => "f64",
        }
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// A sample type the chain can render.
///
/// Implemented for `f32` and `f64` only.
pub trait Sample:
    sealed::Sealed + Copy + Default + PartialEq + PartialOrd + core::fmt::Debug + Send + Sync + 'static
{
    /// Precision this sample type corresponds to.
    const PRECISION: Precision;

    /// Additive identity.
    const ZERO: Self;

    /// Convert from `f64`, rounding when narrowing.
    fn from_f64(value: f64) -> Self;

    /// Widen to `f64`.
    fn to_f64(self) -> f64;

    /// Render `buffer` through the unit's entry point for this sample type.
    fn process(unit: &mut dyn ProcessingUnit, buffer: &mut AudioBuffer<Self>, events: &mut EventBuffer);
}

impl Sample for f32 {
    const PRECISION: Precision = Precision::Single;
    const ZERO: Self = 0.0;

    #[inline]
    fn from_f64(value: f64) -> Self {
        value as f32
    }

    #[inline]
    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    #[inline]
    fn process(unit: &mut dyn ProcessingUnit, buffer: &mut AudioBuffer<Self>, events: &mut EventBuffer) {
        unit.process_f32(buffer, events);
    }
}

impl Sample for f64 {
    const PRECISION: Precision = Precision::Double;
    const ZERO: Self = 0.0;

    #[inline]
    fn from_f64(value: f64) -> Self {
        value
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn process(unit: &mut dyn ProcessingUnit, buffer: &mut AudioBuffer<Self>, events: &mut EventBuffer) {
        unit.process_f64(buffer, events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precision_matches_sample_type() {
        assert_eq!(<f32 as Sample>::PRECISION, Precision::Single);
        assert_eq!(<f64 as Sample>::PRECISION, Precision::Double);
    }

    #[test]
    fn conversion_roundtrip_is_lossless_for_f64() {
        let v = 0.123_456_789_012_345_f64;
        assert_eq!(f64::from_f64(v).to_f64(), v);
        assert!((f32::from_f64(v).to_f64() - v).abs() < 1e-7);
    }

    #[test]
    fn labels() {
        assert_eq!(Precision::Single.label(), "f32");
        assert_eq!(Precision::Double.label(), "f64");
        assert_eq!(Precision::default(), Precision::Single);
    }
}
