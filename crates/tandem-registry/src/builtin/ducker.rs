use tandem_core::{
    AudioBuffer, BusesLayout, ChannelSet, EventBuffer, ParamDescriptor, ProcessingUnit, Sample,
    db_to_linear, linear_to_db,
};

use super::{decode_params, encode_params};

const THRESHOLD: usize = 0;
const DEPTH: usize = 1;
const RELEASE: usize = 2;

const PARAMS: [ParamDescriptor; 3] = [
    ParamDescriptor::gain_db("Threshold", "threshold_db", -60.0, 0.0, -24.0),
    ParamDescriptor::gain_db("Depth", "depth_db", 0.0, 48.0, 12.0),
    ParamDescriptor::time_ms("Release", "release_ms", 10.0, 1000.0, 150.0),
];

const ATTACK_MS: f64 = 1.0;

/// Sidechain ducker.
///
/// Lowers the main bus while the stereo auxiliary input is above the
/// threshold. The auxiliary bus is mandatory, so a chain must widen its
/// layout to host this unit.
#[derive(Debug, Clone)]
pub struct Ducker {
    values: [f32; 3],
    sample_rate: f64,
    layout: BusesLayout,
    envelope: f64,
}

impl Ducker {
    /// Default ducker at `sample_rate`.
    pub fn new(sample_rate: f64) -> Self {
        Self {
            values: [PARAMS[THRESHOLD].default, PARAMS[DEPTH].default, PARAMS[RELEASE].default],
            sample_rate,
            layout: BusesLayout {
                inputs: vec![ChannelSet::Stereo, ChannelSet::Stereo],
                outputs: vec![ChannelSet::Stereo],
            },
            envelope: 0.0,
        }
    }

    fn coefficient(&self, ms: f64) -> f64 {
        (-1.0 / (ms * 0.001 * self.sample_rate)).exp()
    }

    fn render<T: Sample>(&mut self, buffer: &mut AudioBuffer<T>) {
        let main = self.layout.main_output_channels();
        let side = self.layout.main_input_channels();
        if buffer.num_channels() < side + 2 {
            return;
        }
        let attack = self.coefficient(ATTACK_MS);
        let release = self.coefficient(f64::from(self.values[RELEASE]));
        let threshold = f64::from(self.values[THRESHOLD]);
        let depth = f64::from(self.values[DEPTH]);

        for i in 0..buffer.num_frames() {
            let level = buffer.channel(side)[i]
                .to_f64()
                .abs()
                .max(buffer.channel(side + 1)[i].to_f64().abs());
            let coeff = if level > self.envelope { attack } else { release };
            self.envelope = level + coeff * (self.envelope - level);

            let over = linear_to_db(self.envelope) - threshold;
            if over <= 0.0 {
                continue;
            }
            let gain = db_to_linear(-over.min(depth));
            for ch in 0..main {
                let s = &mut buffer.channel_mut(ch)[i];
                *s = T::from_f64(s.to_f64() * gain);
            }
        }
    }
}

fn is_sidechain_layout(layout: &BusesLayout) -> bool {
    matches!(
        layout.main_input(),
        Some(ChannelSet::Mono | ChannelSet::Stereo)
    ) && layout.main_input() == layout.main_output()
        && layout.aux_inputs() == [ChannelSet::Stereo]
        && layout.aux_outputs().is_empty()
}

impl ProcessingUnit for Ducker {
    fn name(&self) -> &str {
        "Ducker"
    }

    fn prepare(&mut self, sample_rate: f64, _block_size: usize) {
        self.sample_rate = sample_rate;
        self.envelope = 0.0;
    }

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
        is_sidechain_layout(layout)
    }

    fn set_buses_layout(&mut self, layout: &BusesLayout) -> bool {
        if !is_sidechain_layout(layout) {
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
