//! Shared test fixtures: a configurable mock unit and a catalog builder.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use tandem_core::{AudioBuffer, BusesLayout, EventBuffer, PlayHead, Precision, ProcessingUnit, Sample};
use tandem_registry::{UnitCatalog, UnitDescriptor};

/// Observations recorded by a [`MockUnit`], shared with the test.
#[derive(Default)]
pub struct Probe {
    pub prepares: AtomicUsize,
    pub releases: AtomicUsize,
    pub f32_blocks: AtomicUsize,
    pub f64_blocks: AtomicUsize,
    pub latency: AtomicUsize,
    pub play_head: AtomicBool,
    pub precision: Mutex<Option<Precision>>,
    pub applied: Mutex<Option<BusesLayout>>,
}

impl Probe {
    pub fn new(latency: usize) -> Arc<Self> {
        let probe = Self::default();
        probe.latency.store(latency, Ordering::Relaxed);
        Arc::new(probe)
    }

    pub fn f32_blocks(&self) -> usize {
        self.f32_blocks.load(Ordering::Relaxed)
    }

    pub fn f64_blocks(&self) -> usize {
        self.f64_blocks.load(Ordering::Relaxed)
    }

    pub fn prepares(&self) -> usize {
        self.prepares.load(Ordering::Relaxed)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::Relaxed)
    }

    pub fn set_latency(&self, latency: usize) {
        self.latency.store(latency, Ordering::Relaxed);
    }
}

/// Static behavior of a mock unit.
#[derive(Clone)]
pub struct MockSpec {
    pub name: &'static str,
    pub tail: f64,
    pub double: bool,
    pub gain: f64,
    pub preferred: BusesLayout,
    /// Layouts accepted; `None` accepts any layout whose main input equals
    /// its main output and has no auxiliary buses.
    pub accepts: Option<Vec<BusesLayout>>,
    pub params: Vec<f32>,
}

impl MockSpec {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            tail: 0.0,
            double: true,
            gain: 1.0,
            preferred: BusesLayout::from_channel_counts(2, 2),
            accepts: None,
            params: vec![0.25, 0.75],
        }
    }

    pub fn tail(mut self, tail: f64) -> Self {
        self.tail = tail;
        self
    }

    pub fn single_only(mut self) -> Self {
        self.double = false;
        self
    }

    pub fn gain(mut self, gain: f64) -> Self {
        self.gain = gain;
        self
    }

    pub fn preferring(mut self, layout: BusesLayout) -> Self {
        self.preferred = layout;
        self
    }

    pub fn accepting(mut self, layouts: Vec<BusesLayout>) -> Self {
        self.accepts = Some(layouts);
        self
    }
}

pub struct MockUnit {
    spec: MockSpec,
    probe: Arc<Probe>,
    layout: BusesLayout,
    params: Vec<f32>,
}

impl MockUnit {
    pub fn new(spec: MockSpec, probe: Arc<Probe>) -> Self {
        Self {
            layout: spec.preferred.clone(),
            params: spec.params.clone(),
            spec,
            probe,
        }
    }

    fn render<T: Sample>(&self, buffer: &mut AudioBuffer<T>) {
        for ch in buffer.channels_mut() {
            for s in ch.iter_mut() {
                *s = T::from_f64(s.to_f64() * self.spec.gain);
            }
        }
    }
}

impl ProcessingUnit for MockUnit {
    fn name(&self) -> &str {
        self.spec.name
    }
    fn prepare(&mut self, _sample_rate: f64, _block_size: usize) {
        self.probe.prepares.fetch_add(1, Ordering::Relaxed);
    }
    fn release(&mut self) {
        self.probe.releases.fetch_add(1, Ordering::Relaxed);
    }
    fn process_f32(&mut self, buffer: &mut AudioBuffer<f32>, _events: &mut EventBuffer) {
        self.probe.f32_blocks.fetch_add(1, Ordering::Relaxed);
        self.render(buffer);
    }
    fn process_f64(&mut self, buffer: &mut AudioBuffer<f64>, _events: &mut EventBuffer) {
        self.probe.f64_blocks.fetch_add(1, Ordering::Relaxed);
        self.render(buffer);
    }
    fn latency_samples(&self) -> usize {
        self.probe.latency.load(Ordering::Relaxed)
    }
    fn tail_seconds(&self) -> f64 {
        self.spec.tail
    }
    fn supports_double_precision(&self) -> bool {
        self.spec.double
    }
    fn set_precision(&mut self, precision: Precision) {
        *self.probe.precision.lock() = Some(precision);
    }
    fn buses_layout(&self) -> BusesLayout {
        self.layout.clone()
    }
    fn check_buses_layout_supported(&self, layout: &BusesLayout) -> bool {
        match &self.spec.accepts {
            Some(accepted) => accepted.contains(layout),
            None => {
                layout.main_input().is_some()
                    && layout.main_input() == layout.main_output()
                    && layout.aux_inputs().is_empty()
                    && layout.aux_outputs().is_empty()
            }
        }
    }
    fn set_buses_layout(&mut self, layout: &BusesLayout) -> bool {
        self.layout = layout.clone();
        *self.probe.applied.lock() = Some(layout.clone());
        true
    }
    fn set_play_head(&mut self, play_head: Option<PlayHead>) {
        self.probe.play_head.store(play_head.is_some(), Ordering::Relaxed);
    }
    fn param_count(&self) -> usize {
        self.params.len()
    }
    fn get_param(&self, index: usize) -> f32 {
        self.params.get(index).copied().unwrap_or(0.0)
    }
    fn set_param(&mut self, index: usize, value: f32) {
        if let Some(p) = self.params.get_mut(index) {
            *p = value;
        }
    }
}

pub fn descriptor(name: &str, uid: u32) -> UnitDescriptor {
    UnitDescriptor {
        name: name.to_owned(),
        manufacturer: "Mock".to_owned(),
        format: "Mock".to_owned(),
        category: "Test".to_owned(),
        uid,
        version: "0".to_owned(),
        file_or_identifier: format!("/mock/{}.so", name.to_lowercase()),
        is_instrument: false,
    }
}

/// Native id of the mock registered with `name` and `uid`.
pub fn id(name: &str, uid: u32) -> String {
    format!("Mock-{name}-{uid:x}")
}

/// Catalog builder that hands out probes for each registered mock.
pub struct MockCatalog {
    catalog: UnitCatalog,
    next_uid: u32,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self {
            catalog: UnitCatalog::with_builtins(),
            next_uid: 1,
        }
    }

    /// Register a mock with a fixed initial latency. Returns its id and
    /// probe.
    pub fn add(&mut self, spec: MockSpec, latency: usize) -> (String, Arc<Probe>) {
        let uid = self.next_uid;
        self.next_uid += 1;
        let probe = Probe::new(latency);
        let shared = Arc::clone(&probe);
        let name = spec.name;
        self.catalog.register(descriptor(name, uid), move |_, _| {
            Ok(Box::new(MockUnit::new(spec.clone(), Arc::clone(&shared))))
        });
        (id(name, uid), probe)
    }

    /// Register a descriptor whose instantiation always fails.
    pub fn add_broken(&mut self, name: &str) -> String {
        let uid = self.next_uid;
        self.next_uid += 1;
        self.catalog
            .register(descriptor(name, uid), |_, _| Err("bad binary".to_owned()));
        id(name, uid)
    }

    pub fn build(self) -> Arc<UnitCatalog> {
        Arc::new(self.catalog)
    }
}
