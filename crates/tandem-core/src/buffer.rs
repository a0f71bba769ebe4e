//! Planar multi-channel audio buffers.
//!
//! [`AudioBuffer`] stores one contiguous `Vec` per channel. It is the block
//! type passed through every unit in the chain; auxiliary bus channels follow
//! the main bus channels in index order.

use crate::sample::Sample;

/// A planar block of audio samples.
///
/// # Example
///
/// ```rust
/// use tandem_core::AudioBuffer;
///
/// let mut buf = AudioBuffer::<f32>::new(2, 64);
/// buf.channel_mut(0)[0] = 1.0;
/// assert_eq!(buf.num_channels(), 2);
/// assert_eq!(buf.num_frames(), 64);
/// assert_eq!(buf.channel(0)[0], 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer<T: Sample> {
    channels: Vec<Vec<T>>,
    frames: usize,
}

impl<T: Sample> AudioBuffer<T> {
    /// Create a zeroed buffer with `channels` channels of `frames` samples.
    pub fn new(channels: usize, frames: usize) -> Self {
        Self {
            channels: (0..channels).map(|_| vec![T::ZERO; frames]).collect(),
            frames,
        }
    }

    /// Build a buffer from per-channel sample vectors.
    ///
    /// Shorter channels are zero-padded to the longest one.
    pub fn from_channels(mut channels: Vec<Vec<T>>) -> Self {
        let frames = channels.iter().map(Vec::len).max().unwrap_or(0);
        for ch in &mut channels {
            ch.resize(frames, T::ZERO);
        }
        Self { channels, frames }
    }

    /// Number of channels.
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of frames (samples per channel).
    #[inline]
    pub fn num_frames(&self) -> usize {
        self.frames
    }

    /// Immutable access to one channel.
    ///
    /// # Panics
    /// Panics if `index >= num_channels()`.
    #[inline]
    pub fn channel(&self, index: usize) -> &[T] {
        &self.channels[index]
    }

    /// Mutable access to one channel.
    ///
    /// # Panics
    /// Panics if `index >= num_channels()`.
    #[inline]
    pub fn channel_mut(&mut self, index: usize) -> &mut [T] {
        &mut self.channels[index]
    }

    /// Iterate mutably over all channels.
    pub fn channels_mut(&mut self) -> impl Iterator<Item = &mut [T]> {
        self.channels.iter_mut().map(Vec::as_mut_slice)
    }

    /// Zero every sample.
    pub fn clear(&mut self) {
        for ch in &mut self.channels {
            ch.fill(T::ZERO);
        }
    }

    /// Change the shape, zeroing any newly exposed samples.
    ///
    /// Allocates only when the buffer grows.
    pub fn resize(&mut self, channels: usize, frames: usize) {
        self.channels.resize_with(channels, Vec::new);
        for ch in &mut self.channels {
            ch.resize(frames, T::ZERO);
        }
        self.frames = frames;
    }

    /// Copy `other` into `self`, converting sample width.
    ///
    /// `self` is resized to `other`'s shape first, so converting into a
    /// pre-sized scratch buffer of the same shape does not allocate.
    pub fn copy_converted_from<U: Sample>(&mut self, other: &AudioBuffer<U>) {
        if self.num_channels() != other.num_channels() || self.frames != other.frames {
            self.resize(other.num_channels(), other.frames);
        }
        for (dst, src) in self.channels.iter_mut().zip(&other.channels) {
            for (d, s) in dst.iter_mut().zip(src) {
                *d = T::from_f64(s.to_f64());
            }
        }
    }

    /// Peak absolute value across all channels.
    pub fn peak(&self) -> f64 {
        self.channels
            .iter()
            .flat_map(|ch| ch.iter())
            .map(|s| s.to_f64().abs())
            .fold(0.0, f64::max)
    }
}
