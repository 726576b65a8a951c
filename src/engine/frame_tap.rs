//! Lock-free latest-frame handoff to the display thread

use std::sync::{Arc, Mutex};
use triple_buffer::TripleBuffer;

/// Producer end of the monitor tap.
///
/// Publishes the most recent raw frame of the monitor channel so a UI can
/// draw a live preview without touching the ring store. Overwritten on every
/// frame; only the newest snapshot survives.
pub struct FrameTap {
    producer: triple_buffer::Input<Vec<f32>>,
}

/// Cloneable consumer end, read from the display thread.
#[derive(Clone)]
pub struct FrameTapConsumer {
    output: Arc<Mutex<triple_buffer::Output<Vec<f32>>>>,
}

impl FrameTap {
    pub fn new() -> (Self, FrameTapConsumer) {
        let (producer, consumer) = TripleBuffer::new(&Vec::new()).split();
        (
            Self { producer },
            FrameTapConsumer {
                output: Arc::new(Mutex::new(consumer)),
            },
        )
    }

    /// Publish a frame snapshot (called on the producer's schedule).
    ///
    /// Writes into the owned back buffer in place, so steady-state
    /// publishing does not allocate.
    pub fn publish(&mut self, frame: &[f32]) {
        let buffer = self.producer.input_buffer_mut();
        buffer.clear();
        buffer.extend_from_slice(frame);
        self.producer.publish();
    }
}

impl FrameTapConsumer {
    /// Latest published frame; empty until the first publish.
    ///
    /// Uses try-lock so the display thread skips a repaint instead of
    /// waiting when consumer clones contend.
    pub fn read(&self) -> Vec<f32> {
        if let Ok(mut output) = self.output.try_lock() {
            output.read().clone()
        } else {
            Vec::new()
        }
    }
}
