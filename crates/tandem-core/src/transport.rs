//! Transport position shared between the host and every unit.
//!
//! The host publishes a [`PositionInfo`] once per block through a
//! [`PlayHead`]; units read it wait-free during rendering.

use std::sync::Arc;

use arc_swap::ArcSwap;

/// Transport state for tempo-aware processing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransportState {
    /// Transport halted.
    #[default]
    Stopped,
    /// Transport running.
    Playing,
    /// Transport running and recording.
    Recording,
}

/// Musical and sample position of the host transport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionInfo {
    /// Tempo in beats per minute.
    pub bpm: f64,
    /// Time signature numerator.
    pub time_sig_numerator: u32,
    /// Time signature denominator.
    pub time_sig_denominator: u32,
    /// Position of the block start in samples since transport zero.
    pub time_in_samples: i64,
    /// Position of the block start in quarter notes.
    pub ppq_position: f64,
    /// Current transport state.
    pub state: TransportState,
}

impl Default for PositionInfo {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            time_sig_numerator: 4,
            time_sig_denominator: 4,
            time_in_samples: 0,
            ppq_position: 0.0,
            state: TransportState::Stopped,
        }
    }
}

impl PositionInfo {
    /// Whether the transport is running.
    pub fn is_playing(&self) -> bool {
        matches!(self.state, TransportState::Playing | TransportState::Recording)
    }

    /// Advance by `frames` samples at `sample_rate`, updating the quarter-note
    /// position from the current tempo.
    pub fn advance(&mut self, frames: usize, sample_rate: f64) {
        if !self.is_playing() || sample_rate <= 0.0 {
            return;
        }
        self.time_in_samples += frames as i64;
        self.ppq_position += frames as f64 / sample_rate * self.bpm / 60.0;
    }
}

/// Cloneable handle to the host's transport position.
///
/// All clones observe the same position.
#[derive(Clone, Debug)]
pub struct PlayHead {
    position: Arc<ArcSwap<PositionInfo>>,
}

impl Default for PlayHead {
    fn default() -> Self {
        Self::new(PositionInfo::default())
    }
}

impl PlayHead {
    /// Create a play head at `position`.
    pub fn new(position: PositionInfo) -> Self {
        Self {
            position: Arc::new(ArcSwap::from_pointee(position)),
        }
    }

    /// Current position (wait-free).
    pub fn position(&self) -> PositionInfo {
        **self.position.load()
    }

    /// Publish a new position.
    pub fn set_position(&self, position: PositionInfo) {
        self.position.store(Arc::new(position));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_position() {
        let head = PlayHead::default();
        let reader = head.clone();
        head.set_position(PositionInfo {
            bpm: 90.0,
            state: TransportState::Playing,
            ..PositionInfo::default()
        });
        assert_eq!(reader.position().bpm, 90.0);
        assert!(reader.position().is_playing());
    }

    #[test]
    fn advance_only_while_playing() {
        let mut pos = PositionInfo::default();
        pos.advance(48000, 48000.0);
        assert_eq!(pos.time_in_samples, 0);

        pos.state = TransportState::Playing;
        pos.advance(48000, 48000.0);
        assert_eq!(pos.time_in_samples, 48000);
        // one second at 120 bpm is two quarter notes
        assert!((pos.ppq_position - 2.0).abs() < 1e-9);
    }
}
