use tandem_core::{
    AudioBuffer, BusesLayout, EventBuffer, ParamDescriptor, ProcessingUnit, Sample, db_to_linear,
};

use super::{decode_params, encode_params, is_plain_effect_layout};

const PARAMS: [ParamDescriptor; 1] = [ParamDescriptor::gain_db("Gain", "gain_db", -60.0, 24.0, 0.0)];

/// Static gain on the main bus.
#[derive(Debug, Clone)]
pub struct Gain {
    values: [f32; 1],
    layout: BusesLayout,
}

impl Default for Gain {
    fn default() -> Self {
        Self::new()
    }
}

impl Gain {
    /// Unity gain, stereo.
    pub fn new() -> Self {
        Self {
            values: [PARAMS[0].default],
            layout: BusesLayout::for_chain(false),
        }
    }

    fn render<T: Sample>(&self, buffer: &mut AudioBuffer<T>) {
        let gain = db_to_linear(f64::from(self.values[0]));
        let channels = self.layout.main_output_channels().min(buffer.num_channels());
        for ch in 0..channels {
            for s in buffer.channel_mut(ch) {
                *s = T::from_f64(s.to_f64() * gain);
            }
        }
    }
}

impl ProcessingUnit for Gain {
    fn name(&self) -> &str {
        "Gain"
    }

    fn prepare(&mut self, _sample_rate: f64, _block_size: usize) {}

    fn release(&mut self) {}

    fn process_f32(&mut self, buffer: &mut AudioBuffer<f32>, _events: &mut EventBuffer) {
        self.render(buffer);
    }

    fn process_f64(&mut self, buffer: &mut AudioBuffer<f64>, _events: &mut EventBuffer) {
        self.render(buffer);
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
        }
    }

    fn state(&self) -> Vec<u8> {
        encode_params(&self.values)
    }

    fn set_state(&mut self, data: &[u8]) {
        decode_params(data, &PARAMS, &mut self.values);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minus_six_db_halves() {
        let mut gain = Gain::new();
        gain.set_param(0, -6.020_6);
        let mut buf = AudioBuffer::from_channels(vec![vec![1.0_f64; 4]; 2]);
        gain.process_f64(&mut buf, &mut EventBuffer::new());
        assert!((buf.channel(1)[3] - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_param_clamped_and_out_of_range_ignored() {
        let mut gain = Gain::new();
        gain.set_param(0, 100.0);
        assert_eq!(gain.get_param(0), 24.0);
        gain.set_param(5, 1.0);
        assert_eq!(gain.get_param(5), 0.0);
    }

    #[test]
    fn test_state_round_trip() {
        let mut a = Gain::new();
        a.set_param(0, -12.0);
        let mut b = Gain::new();
        b.set_state(&a.state());
        assert_eq!(b.get_param(0), -12.0);
    }

    #[test]
    fn test_extra_channels_untouched() {
        let mut gain = Gain::new();
        gain.set_param(0, -60.0);
        let mut buf = AudioBuffer::from_channels(vec![vec![1.0_f32; 2]; 3]);
        gain.process_f32(&mut buf, &mut EventBuffer::new());
        assert!(buf.channel(0)[0] < 0.01);
        assert_eq!(buf.channel(2)[0], 1.0);
    }
}
