//! Parameter metadata for processing units.
//!
//! Parameters are addressed by index. A unit reports how many it has and a
//! [`ParamDescriptor`] for each; values are plain (unnormalized) `f32`.

use core::fmt;

/// Unit a parameter value is displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamUnit {
    /// Decibels (dB).
    Decibels,
    /// Hertz (Hz).
    Hertz,
    /// Milliseconds (ms).
    Milliseconds,
    /// Percentage (%).
    Percent,
    /// Ratio (n:1).
    Ratio,
    /// Dimensionless.
    #[default]
    None,
}

impl ParamUnit {
    /// Suffix appended to formatted values.
    pub const fn suffix(self) -> &'static str {
        match self {
            ParamUnit::Decibels => " dB",
            ParamUnit::Hertz => " Hz",
            ParamUnit::Milliseconds => " ms",
            ParamUnit::Percent => "%",
            ParamUnit::Ratio => ":1",
            ParamUnit::None => "",
        }
    }
}

/// Describes one parameter of a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDescriptor {
    /// Full display name.
    pub name: &'static str,
    /// Stable identifier used in configuration files.
    pub key: &'static str,
    /// Display unit.
    pub unit: ParamUnit,
    /// Minimum value.
    pub min: f32,
    /// Maximum value.
    pub max: f32,
    /// Initial value.
    pub default: f32,
}

impl ParamDescriptor {
    /// Dimensionless parameter.
    pub const fn custom(name: &'static str, key: &'static str, min: f32, max: f32, default: f32) -> Self {
        Self {
            name,
            key,
            unit: ParamUnit::None,
            min,
            max,
            default,
        }
    }

    /// Gain parameter in decibels.
    pub const fn gain_db(name: &'static str, key: &'static str, min: f32, max: f32, default: f32) -> Self {
        Self {
            name,
            key,
            unit: ParamUnit::Decibels,
            min,
            max,
            default,
        }
    }

    /// Time parameter in milliseconds.
    pub const fn time_ms(name: &'static str, key: &'static str, min: f32, max: f32, default: f32) -> Self {
        Self {
            name,
            key,
            unit: ParamUnit::Milliseconds,
            min,
            max,
            default,
        }
    }

    /// Override the display unit.
    pub const fn with_unit(mut self, unit: ParamUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Clamp `value` into `[min, max]`.
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }
}

impl fmt::Display for ParamDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}..{}{}] default {}",
            self.name,
            self.min,
            self.max,
            self.unit.suffix(),
            self.default
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_respects_bounds() {
        let d = ParamDescriptor::gain_db("Gain", "gain_db", -60.0, 12.0, 0.0);
        assert_eq!(d.clamp(24.0), 12.0);
        assert_eq!(d.clamp(-100.0), -60.0);
        assert_eq!(d.clamp(3.0), 3.0);
    }

    #[test]
    fn display_includes_unit() {
        let d = ParamDescriptor::time_ms("Time", "time_ms", 1.0, 1000.0, 250.0);
        assert_eq!(d.to_string(), "Time [1..1000 ms] default 250");
    }

    #[test]
    fn with_unit_overrides() {
        let d = ParamDescriptor::custom("Ratio", "ratio", 1.0, 20.0, 4.0).with_unit(ParamUnit::Ratio);
        assert_eq!(d.unit.suffix(), ":1");
    }
}
