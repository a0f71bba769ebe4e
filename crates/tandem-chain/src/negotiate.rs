//! Bus layout negotiation between a chain and one unit.
//!
//! The chain has a single host-defined layout. A unit either accepts it as
//! is, or needs the chain to carry extra channels for its auxiliary buses
//! (a sidechain input, say). Negotiation only ever widens: the chain's main
//! buses are kept and the unit's non-main buses are appended.
//!
//! ## Design Decisions
//!
//! - **The chain layout is read-only here.** [`negotiate`] takes it by
//!   reference and only mutates the unit. Recording the chain-wide extra
//!   channel count is the caller's job.
//! - **Best effort.** A unit whose main bus is narrower than the chain's and
//!   has no auxiliary buses cannot be negotiated; there is no narrowing step.

use tandem_core::{BusesLayout, ProcessingUnit};

/// Successful negotiation outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Negotiation {
    /// The unit accepted the chain layout unchanged.
    Direct,
    /// The unit accepted a widened layout.
    Widened {
        /// Extra input channels the unit needs.
        extra_in: usize,
        /// Extra output channels the unit needs.
        extra_out: usize,
    },
}

impl Negotiation {
    /// Extra (input, output) channels.
    pub fn extra(self) -> (usize, usize) {
        match self {
            Negotiation::Direct => (0, 0),
            Negotiation::Widened {
                extra_in,
                extra_out,
            } => (extra_in, extra_out),
        }
    }
}

/// Configure `unit` for `chain_layout`, widening if required.
///
/// Returns `None` when the unit accepts neither the chain layout nor the
/// widened one. The unit is left with whatever layout it had if both
/// attempts are refused.
pub fn negotiate(chain_layout: &BusesLayout, unit: &mut dyn ProcessingUnit) -> Option<Negotiation> {
    if unit.check_buses_layout_supported(chain_layout) {
        return unit
            .set_buses_layout(chain_layout)
            .then_some(Negotiation::Direct);
    }

    let preferred = unit.buses_layout();
    let mut widened = chain_layout.clone();

    let mut extra_in = signed(preferred.main_input_channels()) - signed(chain_layout.main_input_channels());
    for bus in preferred.aux_inputs() {
        extra_in += signed(bus.size());
        widened.inputs.push(*bus);
    }
    let mut extra_out =
        signed(preferred.main_output_channels()) - signed(chain_layout.main_output_channels());
    for bus in preferred.aux_outputs() {
        extra_out += signed(bus.size());
        widened.outputs.push(*bus);
    }

    if (extra_in > 0 || extra_out > 0)
        && unit.check_buses_layout_supported(&widened)
        && unit.set_buses_layout(&widened)
    {
        tracing::debug!(
            "negotiate: {}: {extra_in} extra input(s), {extra_out} extra output(s)",
            unit.name()
        );
        return Some(Negotiation::Widened {
            extra_in: usize::try_from(extra_in).unwrap_or(0),
            extra_out: usize::try_from(extra_out).unwrap_or(0),
        });
    }

    tracing::debug!("negotiate: {} rejected\n{widened}", unit.name());
    None
}

/// Channels beyond the main buses a layout carries, the larger of either
/// direction.
pub fn extra_channels_of(layout: &BusesLayout) -> usize {
    let extra_in = layout.total_input_channels() - layout.main_input_channels();
    let extra_out = layout.total_output_channels() - layout.main_output_channels();
    extra_in.max(extra_out)
}

fn signed(n: usize) -> isize {
    isize::try_from(n).unwrap_or(isize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_core::{AudioBuffer, ChannelSet, EventBuffer};

    /// Unit that accepts exactly the layouts in `accepts`.
    struct Picky {
        preferred: BusesLayout,
        accepts: Vec<BusesLayout>,
        applied: Option<BusesLayout>,
    }

    impl ProcessingUnit for Picky {
        fn name(&self) -> &str {
            "Picky"
        }
        fn prepare(&mut self, _: f64, _: usize) {}
        fn release(&mut self) {}
        fn process_f32(&mut self, _: &mut AudioBuffer<f32>, _: &mut EventBuffer) {}
        fn process_f64(&mut self, _: &mut AudioBuffer<f64>, _: &mut EventBuffer) {}
        fn buses_layout(&self) -> BusesLayout {
            self.applied.clone().unwrap_or_else(|| self.preferred.clone())
        }
        fn check_buses_layout_supported(&self, layout: &BusesLayout) -> bool {
            self.accepts.contains(layout)
        }
        fn set_buses_layout(&mut self, layout: &BusesLayout) -> bool {
            self.applied = Some(layout.clone());
            true
        }
    }

    fn stereo() -> BusesLayout {
        BusesLayout::from_channel_counts(2, 2)
    }

    fn with_sidechain() -> BusesLayout {
        BusesLayout {
            inputs: vec![ChannelSet::Stereo, ChannelSet::Stereo],
            outputs: vec![ChannelSet::Stereo],
        }
    }

    #[test]
    fn matching_layout_applied_directly() {
        let mut unit = Picky {
            preferred: stereo(),
            accepts: vec![stereo()],
            applied: None,
        };
        assert_eq!(negotiate(&stereo(), &mut unit), Some(Negotiation::Direct));
        assert_eq!(unit.applied, Some(stereo()));
    }

    #[test]
    fn sidechain_widens_inputs() {
        let mut unit = Picky {
            preferred: with_sidechain(),
            accepts: vec![with_sidechain()],
            applied: None,
        };
        let chain = stereo();
        let outcome = negotiate(&chain, &mut unit);
        assert_eq!(
            outcome,
            Some(Negotiation::Widened {
                extra_in: 2,
                extra_out: 0
            })
        );
        assert_eq!(unit.applied, Some(with_sidechain()));
        assert_eq!(chain, stereo());
    }

    #[test]
    fn rejected_widening_fails_without_applying() {
        let mut unit = Picky {
            preferred: with_sidechain(),
            accepts: vec![],
            applied: None,
        };
        assert_eq!(negotiate(&stereo(), &mut unit), None);
        assert_eq!(unit.applied, None);
    }

    #[test]
    fn narrower_unit_is_not_negotiable() {
        let mono = BusesLayout::from_channel_counts(1, 1);
        let mut unit = Picky {
            preferred: mono.clone(),
            accepts: vec![mono],
            applied: None,
        };
        assert_eq!(negotiate(&stereo(), &mut unit), None);
    }

    #[test]
    fn extra_channels_of_layout() {
        assert_eq!(extra_channels_of(&stereo()), 0);
        assert_eq!(extra_channels_of(&with_sidechain()), 2);
        let mut out_aux = stereo();
        out_aux.outputs.push(ChannelSet::Discrete(6));
        assert_eq!(extra_channels_of(&out_aux), 6);
    }
}
