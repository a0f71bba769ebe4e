//! Side-channel control events rendered alongside audio.

/// A short control message (MIDI-style) stamped with its frame offset in the
/// current block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlEvent {
    /// Frame offset within the block.
    pub frame: u32,
    /// Status byte followed by up to two data bytes.
    pub data: [u8; 3],
}

impl ControlEvent {
    /// Create an event at `frame`.
    pub const fn new(frame: u32, data: [u8; 3]) -> Self {
        Self { frame, data }
    }
}

/// Ordered events for one block.
///
/// Units may consume, append, or rewrite events; whatever remains is handed to
/// the next unit in the chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventBuffer {
    events: Vec<ControlEvent>,
}

impl EventBuffer {
    /// Empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty buffer with room for `capacity` events.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
        }
    }

    /// Insert an event, keeping frame order stable.
    pub fn push(&mut self, event: ControlEvent) {
        let pos = self.events.partition_point(|e| e.frame <= event.frame);
        self.events.insert(pos, event);
    }

    /// Events in frame order.
    pub fn iter(&self) -> impl Iterator<Item = &ControlEvent> {
        self.events.iter()
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether there are no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Remove all events, keeping capacity.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_keeps_frame_order() {
        let mut ev = EventBuffer::new();
        ev.push(ControlEvent::new(10, [0x90, 60, 100]));
        ev.push(ControlEvent::new(2, [0x90, 62, 100]));
        ev.push(ControlEvent::new(10, [0x80, 60, 0]));
        let frames: Vec<u32> = ev.iter().map(|e| e.frame).collect();
        assert_eq!(frames, vec![2, 10, 10]);
        // equal frames keep insertion order
        assert_eq!(ev.iter().nth(2).unwrap().data[0], 0x80);
    }

    #[test]
    fn clear_empties() {
        let mut ev = EventBuffer::with_capacity(4);
        ev.push(ControlEvent::new(0, [0xB0, 1, 2]));
        assert_eq!(ev.len(), 1);
        ev.clear();
        assert!(ev.is_empty());
    }
}
