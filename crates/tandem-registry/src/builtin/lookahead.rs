use tandem_core::{
    AudioBuffer, BusesLayout, DelayLine, EventBuffer, ParamDescriptor, ProcessingUnit, Sample,
};

use super::{decode_params, encode_params, is_plain_effect_layout};

const PARAMS: [ParamDescriptor; 1] =
    [ParamDescriptor::time_ms("Lookahead", "lookahead_ms", 0.0, 50.0, 5.0)];

/// Pure delay that reports its length as latency.
///
/// Stands in for any unit with lookahead (limiters, linear-phase filters):
/// the signal is unchanged apart from being late, so chain latency
/// compensation can be checked sample-exactly.
#[derive(Debug, Clone)]
pub struct Lookahead {
    values: [f32; 1],
    sample_rate: f64,
    layout: BusesLayout,
    lines_f32: Vec<DelayLine<f32>>,
    lines_f64: Vec<DelayLine<f64>>,
}

impl Lookahead {
    /// Default lookahead at `sample_rate`.
    pub fn new(sample_rate: f64) -> Self {
        Self {
            values: [PARAMS[0].default],
            sample_rate,
            layout: BusesLayout::for_chain(false),
            lines_f32: Vec::new(),
            lines_f64: Vec::new(),
        }
    }

    fn delay_samples(&self) -> usize {
        (f64::from(self.values[0]) * self.sample_rate / 1000.0).round() as usize
    }

    fn rebuild_lines(&mut self) {
        let delay = self.delay_samples();
        let channels = self.layout.main_output_channels();
        self.lines_f32 = (0..channels).map(|_| DelayLine::new(delay)).collect();
        self.lines_f64 = (0..channels).map(|_| DelayLine::new(delay)).collect();
    }
}

fn delay_block<T: Sample>(lines: &mut Vec<DelayLine<T>>, delay: usize, buffer: &mut AudioBuffer<T>, channels: usize) {
    let channels = channels.min(buffer.num_channels());
    if lines.len() < channels {
        lines.resize_with(channels, || DelayLine::new(delay));
    }
    for (ch, line) in lines.iter_mut().enumerate().take(channels) {
        line.process_block_inplace(buffer.channel_mut(ch));
    }
}

impl ProcessingUnit for Lookahead {
    fn name(&self) -> &str {
        "Lookahead"
    }

    fn prepare(&mut self, sample_rate: f64, _block_size: usize) {
        self.sample_rate = sample_rate;
        self.rebuild_lines();
    }

    fn release(&mut self) {
        self.lines_f32.clear();
        self.lines_f64.clear();
    }

    fn process_f32(&mut self, buffer: &mut AudioBuffer<f32>, _events: &mut EventBuffer) {
        let delay = self.delay_samples();
        delay_block(&mut self.lines_f32, delay, buffer, self.layout.main_output_channels());
    }

    fn process_f64(&mut self, buffer: &mut AudioBuffer<f64>, _events: &mut EventBuffer) {
        let delay = self.delay_samples();
        delay_block(&mut self.lines_f64, delay, buffer, self.layout.main_output_channels());
    }

    fn latency_samples(&self) -> usize {
        self.delay_samples()
    }

    fn supports_double_precision(&self) -> bool {
        true
    }

    fn buses_layout(&self) -> BusesLayout {
        self.layout.clone()
    }

    fn check_buses_layout_supported(&self, layout: &BusesLayout) -> bool {
        is_plain_effect_layout(layout)
    }

    fn set_buses_layout(&mut self, layout: &BusesLayout) -> bool {
        if !is_plain_effect_layout(layout) {
            return false;
        }
        self.layout = layout.clone();
        self.rebuild_lines();
        true
    }

    fn param_count(&self) -> usize {
        PARAMS.len()
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        PARAMS.get(index).cloned()
    }

    fn get_param(&self, index: usize) -> f32 {
        self.values.get(index).copied().unwrap_or(0.0)
    }

    fn set_param(&mut self, index: usize, value: f32) {
        if let (Some(v), Some(desc)) = (self.values.get_mut(index), PARAMS.get(index)) {
            *v = desc.clamp(value);
            self.rebuild_lines();
        }
    }

    fn state(&self) -> Vec<u8> {
        encode_params(&self.values)
    }

    fn set_state(&mut self, data: &[u8]) {
        if decode_params(data, &PARAMS, &mut self.values) {
            self.rebuild_lines();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_follows_param() {
        let mut unit = Lookahead::new(48000.0);
        assert_eq!(unit.latency_samples(), 240);
        unit.set_param(0, 1.0);
        assert_eq!(unit.latency_samples(), 48);
        unit.set_param(0, 0.0);
        assert_eq!(unit.latency_samples(), 0);
    }

    #[test]
    fn test_output_is_input_delayed() {
        let mut unit = Lookahead::new(1000.0);
        unit.set_param(0, 3.0);
        unit.prepare(1000.0, 8);
        let input: Vec<f32> = (1..=8).map(|i| i as f32).collect();
        let mut buf = AudioBuffer::from_channels(vec![input.clone(), input]);
        unit.process_f32(&mut buf, &mut EventBuffer::new());
        assert_eq!(buf.channel(0), &[0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(buf.channel(1)[3], 1.0);
    }
}
