//! Channel sets and bus layouts.
//!
//! A [`BusesLayout`] lists the input and output buses a unit (or the chain)
//! exchanges audio on. Bus 0 on each side is the main bus; any further buses
//! are auxiliary (sidechain inputs, extra outputs) and their channels follow
//! the main bus channels in the rendered [`AudioBuffer`](crate::AudioBuffer).

use core::fmt;

/// Channel configuration of a single bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelSet {
    /// Bus present but carrying no channels.
    #[default]
    Disabled,
    /// One channel.
    Mono,
    /// Left/right pair.
    Stereo,
    /// Any other channel count, unassigned speaker positions.
    Discrete(usize),
}

impl ChannelSet {
    /// Number of channels in the set.
    pub const fn size(self) -> usize {
        match self {
            ChannelSet::Disabled => 0,
            ChannelSet::Mono => 1,
            ChannelSet::Stereo => 2,
            ChannelSet::Discrete(n) => n,
        }
    }

    /// Canonical set for a channel count.
    pub const fn with_channels(n: usize) -> Self {
        match n {
            0 => ChannelSet::Disabled,
            1 => ChannelSet::Mono,
            2 => ChannelSet::Stereo,
            n => ChannelSet::Discrete(n),
        }
    }

    /// Abbreviated channel names, e.g. `["L", "R"]` for stereo.
    pub fn abbreviated_names(self) -> Vec<String> {
        match self {
            ChannelSet::Disabled => Vec::new(),
            ChannelSet::Mono => vec!["C".to_owned()],
            ChannelSet::Stereo => vec!["L".to_owned(), "R".to_owned()],
            ChannelSet::Discrete(n) => (1..=n).map(|i| format!("D{i}")).collect(),
        }
    }
}

impl fmt::Display for ChannelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelSet::Disabled => write!(f, "disabled"),
            ChannelSet::Mono => write!(f, "mono"),
            ChannelSet::Stereo => write!(f, "stereo"),
            ChannelSet::Discrete(n) => write!(f, "discrete({n})"),
        }
    }
}

/// Input and output buses of a unit or chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BusesLayout {
    /// Input buses; index 0 is the main input.
    pub inputs: Vec<ChannelSet>,
    /// Output buses; index 0 is the main output.
    pub outputs: Vec<ChannelSet>,
}

impl BusesLayout {
    /// Layout with a single main bus on each side.
    pub fn new(input: ChannelSet, output: ChannelSet) -> Self {
        Self {
            inputs: vec![input],
            outputs: vec![output],
        }
    }

    /// Derive a layout from requested channel counts.
    ///
    /// Only mono (1) and stereo (2) are recognized; any other count leaves
    /// that side without a main bus.
    pub fn from_channel_counts(channels_in: usize, channels_out: usize) -> Self {
        let side = |n: usize| match n {
            1 => vec![ChannelSet::Mono],
            2 => vec![ChannelSet::Stereo],
            _ => Vec::new(),
        };
        Self {
            inputs: side(channels_in),
            outputs: side(channels_out),
        }
    }

    /// Default layout for a chain: stereo in/out for effects, stereo out only
    /// for instruments.
    pub fn for_chain(instrument: bool) -> Self {
        if instrument {
            Self {
                inputs: Vec::new(),
                outputs: vec![ChannelSet::Stereo],
            }
        } else {
            Self::new(ChannelSet::Stereo, ChannelSet::Stereo)
        }
    }

    /// Main input bus, if any.
    pub fn main_input(&self) -> Option<ChannelSet> {
        self.inputs.first().copied()
    }

    /// Main output bus, if any.
    pub fn main_output(&self) -> Option<ChannelSet> {
        self.outputs.first().copied()
    }

    /// Channel count of the main input bus (0 when absent).
    pub fn main_input_channels(&self) -> usize {
        self.main_input().map_or(0, ChannelSet::size)
    }

    /// Channel count of the main output bus (0 when absent).
    pub fn main_output_channels(&self) -> usize {
        self.main_output().map_or(0, ChannelSet::size)
    }

    /// Channels across all input buses.
    pub fn total_input_channels(&self) -> usize {
        self.inputs.iter().map(|b| b.size()).sum()
    }

    /// Channels across all output buses.
    pub fn total_output_channels(&self) -> usize {
        self.outputs.iter().map(|b| b.size()).sum()
    }

    /// Auxiliary (non-main) input buses.
    pub fn aux_inputs(&self) -> &[ChannelSet] {
        self.inputs.get(1..).unwrap_or(&[])
    }

    /// Auxiliary (non-main) output buses.
    pub fn aux_outputs(&self) -> &[ChannelSet] {
        self.outputs.get(1..).unwrap_or(&[])
    }

    /// Whether a chain can run with this layout.
    ///
    /// The main output must be mono, stereo, or match the main input.
    pub fn is_supported_by_chain(&self) -> bool {
        matches!(self.main_output(), Some(ChannelSet::Mono | ChannelSet::Stereo))
            || self.main_output() == self.main_input()
    }
}

impl fmt::Display for BusesLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "input buses: {}", self.inputs.len())?;
        for (i, bus) in self.inputs.iter().enumerate() {
            writeln!(f, "  [{i}] {} channel(s) {}", bus.size(), bus.abbreviated_names().join(" "))?;
        }
        writeln!(f, "output buses: {}", self.outputs.len())?;
        for (i, bus) in self.outputs.iter().enumerate() {
            writeln!(f, "  [{i}] {} channel(s) {}", bus.size(), bus.abbreviated_names().join(" "))?;
        }
        Ok(())
    }
}
