use tandem_core::{
    AudioBuffer, BusesLayout, EventBuffer, ParamDescriptor, ParamUnit, ProcessingUnit, Sample,
};

use super::{decode_params, encode_params, is_plain_effect_layout};

const TIME: usize = 0;
const FEEDBACK: usize = 1;
const MIX: usize = 2;

const MAX_TIME_MS: f32 = 2000.0;

const PARAMS: [ParamDescriptor; 3] = [
    ParamDescriptor::time_ms("Time", "time_ms", 1.0, MAX_TIME_MS, 250.0),
    ParamDescriptor::custom("Feedback", "feedback", 0.0, 0.95, 0.5).with_unit(ParamUnit::Percent),
    ParamDescriptor::custom("Mix", "mix", 0.0, 1.0, 0.35).with_unit(ParamUnit::Percent),
];

/// Feedback delay with a decaying tail.
///
/// Keeps its history in `f32` and does not render natively at double
/// precision.
#[derive(Debug, Clone)]
pub struct Echo {
    values: [f32; 3],
    sample_rate: f64,
    layout: BusesLayout,
    history: Vec<Vec<f32>>,
    write_pos: usize,
}

impl Echo {
    /// Default echo at `sample_rate`.
    pub fn new(sample_rate: f64) -> Self {
        let mut echo = Self {
            values: [PARAMS[TIME].default, PARAMS[FEEDBACK].default, PARAMS[MIX].default],
            sample_rate,
            layout: BusesLayout::for_chain(false),
            history: Vec::new(),
            write_pos: 0,
        };
        echo.allocate();
        echo
    }

    fn allocate(&mut self) {
        let len = (f64::from(MAX_TIME_MS) * self.sample_rate / 1000.0).ceil() as usize + 1;
        let channels = self.layout.main_output_channels();
        self.history = vec![vec![0.0; len]; channels];
        self.write_pos = 0;
    }

    fn delay_samples(&self) -> usize {
        ((f64::from(self.values[TIME]) * self.sample_rate / 1000.0).round() as usize).max(1)
    }

    fn render<T: Sample>(&mut self, buffer: &mut AudioBuffer<T>) {
        let len = self.history.first().map_or(0, Vec::len);
        if len == 0 {
            return;
        }
        let delay = self.delay_samples().min(len - 1);
        let feedback = self.values[FEEDBACK];
        let mix = self.values[MIX];
        let channels = self.history.len().min(buffer.num_channels());

        let start = self.write_pos;
        let mut end = start;
        for ch in 0..channels {
            let mut pos = start;
            let line = &mut self.history[ch];
            for s in buffer.channel_mut(ch) {
                let dry = s.to_f64() as f32;
                let wet = line[(pos + len - delay) % len];
                line[pos] = dry + wet * feedback;
                *s = T::from_f64(f64::from(dry * (1.0 - mix) + wet * mix));
                pos = (pos + 1) % len;
            }
            end = pos;
        }
        self.write_pos = end;
    }
}

impl ProcessingUnit for Echo {
    fn name(&self) -> &str {
        "Echo"
    }

    fn prepare(&mut self, sample_rate: f64, _block_size: usize) {
        self.sample_rate = sample_rate;
        self.allocate();
    }

    fn release(&mut self) {
        self.history.clear();
    }

    fn process_f32(&mut self, buffer: &mut AudioBuffer<f32>, _events: &mut EventBuffer) {
        self.render(buffer);
    }

    fn process_f64(&mut self, buffer: &mut AudioBuffer<f64>, _events: &mut EventBuffer) {
        self.render(buffer);
    }

    /// Time until the feedback decays by 60 dB.
    fn tail_seconds(&self) -> f64 {
        let time = f64::from(self.values[TIME]) / 1000.0;
        let feedback = f64::from(self.values[FEEDBACK]);
        if feedback <= 0.001 {
            return time;
        }
        time * (1.0 + 3.0 / -feedback.log10())
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
        self.allocate();
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
