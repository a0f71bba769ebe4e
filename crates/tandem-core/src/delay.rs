//! Integer-sample delay line.
//!
//! Used wherever a signal must be held back by a whole number of samples:
//! latency-preserving bypass and the reference lookahead unit.

use crate::sample::Sample;

/// Ring-buffer delay of a fixed number of samples.
///
/// A zero-length delay passes samples through unchanged.
#[derive(Debug, Clone)]
pub struct DelayLine<T: Sample> {
    buffer: Vec<T>,
    write_pos: usize,
}

impl<T: Sample> Default for DelayLine<T> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<T: Sample> DelayLine<T> {
    /// Create a delay of `delay_samples`.
    pub fn new(delay_samples: usize) -> Self {
        Self {
            buffer: vec![T::ZERO; delay_samples],
            write_pos: 0,
        }
    }

    /// Current delay in samples.
    #[inline]
    pub fn delay(&self) -> usize {
        self.buffer.len()
    }

    /// Change the delay, clearing history.
    pub fn set_delay(&mut self, delay_samples: usize) {
        self.buffer.clear();
        self.buffer.resize(delay_samples, T::ZERO);
        self.write_pos = 0;
    }

    /// Push one sample in, returning the sample from `delay()` samples ago.
    #[inline]
    pub fn process(&mut self, input: T) -> T {
        if self.buffer.is_empty() {
            return input;
        }
        let out = self.buffer[self.write_pos];
        self.buffer[self.write_pos] = input;
        self.write_pos += 1;
        if self.write_pos == self.buffer.len() {
            self.write_pos = 0;
        }
        out
    }

    /// Delay a block in place.
    pub fn process_block_inplace(&mut self, block: &mut [T]) {
        for s in block.iter_mut() {
            *s = self.process(*s);
        }
    }

    /// Zero history without changing the delay.
    pub fn reset(&mut self) {
        self.buffer.fill(T::ZERO);
        self.write_pos = 0;
    }
}
