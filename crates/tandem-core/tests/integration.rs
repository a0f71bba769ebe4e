//! Integration tests for tandem-core.
//!
//! Exercises the unit trait through a trait object at both precisions, and
//! checks delay-line and layout behavior over generated inputs.

use proptest::prelude::*;
use tandem_core::{
    AudioBuffer, BusesLayout, ChannelSet, DelayLine, EventBuffer, ProcessingUnit, Sample,
};

/// Unit that scales every sample and counts render calls per precision.
struct Scale {
    factor: f64,
    layout: BusesLayout,
    f32_calls: usize,
    f64_calls: usize,
}

impl Scale {
    fn new(factor: f64) -> Self {
        Self {
            factor,
            layout: BusesLayout::for_chain(false),
            f32_calls: 0,
            f64_calls: 0,
        }
    }

    fn render<T: Sample>(&self, buffer: &mut AudioBuffer<T>) {
        for ch in buffer.channels_mut() {
            for s in ch.iter_mut() {
                *s = T::from_f64(s.to_f64() * self.factor);
            }
        }
    }
}

impl ProcessingUnit for Scale {
    fn name(&self) -> &str {
        "Scale"
    }
    fn prepare(&mut self, _sample_rate: f64, _block_size: usize) {}
    fn release(&mut self) {}
    fn process_f32(&mut self, buffer: &mut AudioBuffer<f32>, _events: &mut EventBuffer) {
        self.f32_calls += 1;
        self.render(buffer);
    }
    fn process_f64(&mut self, buffer: &mut AudioBuffer<f64>, _events: &mut EventBuffer) {
        self.f64_calls += 1;
        self.render(buffer);
    }
    fn supports_double_precision(&self) -> bool {
        true
    }
    fn buses_layout(&self) -> BusesLayout {
        self.layout.clone()
    }
    fn check_buses_layout_supported(&self, layout: &BusesLayout) -> bool {
        layout.main_input() == layout.main_output()
    }
    fn set_buses_layout(&mut self, layout: &BusesLayout) -> bool {
        self.layout = layout.clone();
        true
    }
}

#[test]
fn sample_dispatch_reaches_matching_entry_point() {
    let mut unit = Scale::new(0.5);
    let mut events = EventBuffer::new();

    let mut single = AudioBuffer::from_channels(vec![vec![1.0_f32; 8]; 2]);
    <f32 as Sample>::process(&mut unit, &mut single, &mut events);
    let mut double = AudioBuffer::from_channels(vec![vec![1.0_f64; 8]; 2]);
    <f64 as Sample>::process(&mut unit, &mut double, &mut events);

    assert_eq!(unit.f32_calls, 1);
    assert_eq!(unit.f64_calls, 1);
    assert_eq!(single.channel(1)[7], 0.5);
    assert_eq!(double.channel(0)[0], 0.5);
}

#[test]
fn defaults_report_no_latency_or_params() {
    let unit = Scale::new(1.0);
    assert_eq!(unit.latency_samples(), 0);
    assert_eq!(unit.tail_seconds(), 0.0);
    assert_eq!(unit.param_count(), 0);
    assert!(unit.param_info(0).is_none());
    assert_eq!(unit.get_param(3), 0.0);
    assert!(unit.state().is_empty());
}

#[test]
fn unit_rejects_mismatched_main_buses() {
    let unit = Scale::new(1.0);
    assert!(!unit.check_buses_layout_supported(&BusesLayout::new(
        ChannelSet::Mono,
        ChannelSet::Stereo
    )));
    assert!(unit.check_buses_layout_supported(&BusesLayout::from_channel_counts(1, 1)));
}

proptest! {
    #[test]
    fn delay_line_shifts_signal(delay in 0usize..64, input in prop::collection::vec(-1.0f32..1.0, 1..256)) {
        let mut line = DelayLine::<f32>::new(delay);
        let mut block = input.clone();
        line.process_block_inplace(&mut block);
        for (i, &out) in block.iter().enumerate() {
            let expected = if i >= delay { input[i - delay] } else { 0.0 };
            prop_assert_eq!(out, expected);
        }
    }

    #[test]
    fn channel_counts_outside_mono_stereo_leave_side_unset(cin in 0usize..8, cout in 0usize..8) {
        let layout = BusesLayout::from_channel_counts(cin, cout);
        prop_assert_eq!(layout.inputs.is_empty(), !(1..=2).contains(&cin));
        prop_assert_eq!(layout.outputs.is_empty(), !(1..=2).contains(&cout));
        if (1..=2).contains(&cin) {
            prop_assert_eq!(layout.main_input_channels(), cin);
        }
    }
}
