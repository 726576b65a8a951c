//! Overlap framer
//!
//! Turns a stream of variable-length sample blocks into a stream of exactly
//! frame-sized frames, retaining up to `frame_size - 1` samples of carry-over
//! per channel between calls. No sample is ever dropped or duplicated: the
//! total consumed into frames plus the carry-over always equals the total
//! pushed.

use crate::engine::error::EngineError;

/// Per-channel carry-over state, kept together per the channel rather than
/// in parallel arrays so the `carry.len() < frame_size` invariant is local.
struct ChannelCarry {
    carry: Vec<f32>,
}

struct FramerConfig {
    frame_size: usize,
    channel_count: usize,
    step: usize,
}

/// Reframes arbitrary-length sample blocks into fixed-size overlapping
/// frames.
///
/// `configure` must be called before the first `push_block` and again on any
/// channel-count or frame-size change; it resets all carry-over state.
pub struct OverlapFramer {
    config: Option<FramerConfig>,
    channels: Vec<ChannelCarry>,

    // Scratch for carry ++ block, reused across calls
    scratch: Vec<f32>,

    // Emitted frames, flattened channel-major: frame k of channel c starts at
    // (c * frames_emitted + k) * frame_size
    emitted: Vec<f32>,
    frames_emitted: usize,
}

impl OverlapFramer {
    pub fn new() -> Self {
        Self {
            config: None,
            channels: Vec::new(),
            scratch: Vec::new(),
            emitted: Vec::new(),
            frames_emitted: 0,
        }
    }

    /// Set frame size, channel count and hop, clearing all carry-over.
    ///
    /// Calling this twice with identical parameters is equivalent to calling
    /// it once: both clear the retained state. Not safe to call while a
    /// producer is mid-stream; the pipeline serializes this behind its
    /// enable/disable gate.
    pub fn configure(
        &mut self,
        frame_size: usize,
        channel_count: usize,
        step: usize,
    ) -> Result<(), EngineError> {
        if frame_size == 0 {
            return Err(EngineError::InvalidConfiguration(
                "frame_size must be positive".into(),
            ));
        }
        if channel_count == 0 {
            return Err(EngineError::InvalidConfiguration(
                "channel_count must be positive".into(),
            ));
        }
        if step == 0 || step > frame_size {
            return Err(EngineError::InvalidConfiguration(format!(
                "step must be in 1..={}, got {}",
                frame_size, step
            )));
        }

        self.channels.clear();
        for _ in 0..channel_count {
            self.channels.push(ChannelCarry {
                carry: Vec::with_capacity(frame_size - 1),
            });
        }
        self.scratch.clear();
        self.emitted.clear();
        self.frames_emitted = 0;
        self.config = Some(FramerConfig {
            frame_size,
            channel_count,
            step,
        });

        log::debug!(
            "framer configured: frame_size={}, channels={}, step={}",
            frame_size,
            channel_count,
            step
        );
        Ok(())
    }

    /// Current carry-over length, identical across channels by construction.
    pub fn carry_len(&self) -> usize {
        self.channels.first().map_or(0, |ch| ch.carry.len())
    }

    /// Consume one block (one slice per channel, equal lengths) and emit all
    /// completable frames.
    ///
    /// Returns an empty batch when `carry + block` is still shorter than one
    /// frame; downstream never observes a partial or padded frame. The block
    /// is caller-owned: everything retained is copied into the carry-over.
    pub fn push_block(&mut self, block: &[&[f32]]) -> Result<FrameBatch<'_>, EngineError> {
        let config = self.config.as_ref().ok_or(EngineError::NotConfigured)?;
        if block.len() != config.channel_count {
            return Err(EngineError::ChannelCountMismatch {
                expected: config.channel_count,
                actual: block.len(),
            });
        }

        let frame_size = config.frame_size;
        let step = config.step;
        let samples = block.first().map_or(0, |ch| ch.len());
        debug_assert!(
            block.iter().all(|ch| ch.len() == samples),
            "ragged sample block"
        );

        let channel_count = config.channel_count;
        let available = self.carry_len() + samples;
        self.emitted.clear();
        self.frames_emitted = 0;

        if available < frame_size {
            // Not enough for a single frame yet, retain everything
            for (channel, input) in self.channels.iter_mut().zip(block.iter()) {
                channel.carry.extend_from_slice(input);
            }
            return Ok(self.batch(frame_size, channel_count));
        }

        // Frame k spans [k*step, k*step + frame_size) in carry ++ block
        let max_start = available - frame_size + 1;
        let steps = max_start.div_ceil(step);
        let consumed = steps * step;

        self.emitted
            .reserve(steps * frame_size * config.channel_count);

        for (channel, input) in self.channels.iter_mut().zip(block.iter()) {
            self.scratch.clear();
            self.scratch.extend_from_slice(&channel.carry);
            self.scratch.extend_from_slice(input);

            for k in 0..steps {
                let start = k * step;
                self.emitted
                    .extend_from_slice(&self.scratch[start..start + frame_size]);
            }

            channel.carry.clear();
            channel.carry.extend_from_slice(&self.scratch[consumed..]);
            // Another step was missed if this ever fails; a logic bug, not
            // bad input
            assert!(
                channel.carry.len() < frame_size,
                "carry-over reached a full frame"
            );
        }

        self.frames_emitted = steps;
        Ok(self.batch(frame_size, channel_count))
    }

    fn batch(&self, frame_size: usize, channel_count: usize) -> FrameBatch<'_> {
        FrameBatch {
            data: &self.emitted,
            frames: self.frames_emitted,
            frame_size,
            channel_count,
        }
    }
}

impl Default for OverlapFramer {
    fn default() -> Self {
        Self::new()
    }
}

/// Frames produced by one `push_block` call, valid until the next call.
///
/// Frame `k` of every channel covers the same logical time window; frames are
/// ordered by increasing time.
pub struct FrameBatch<'a> {
    data: &'a [f32],
    frames: usize,
    frame_size: usize,
    channel_count: usize,
}

impl<'a> FrameBatch<'a> {
    /// Number of frames emitted (per channel).
    pub fn len(&self) -> usize {
        self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Frame `k` of `channel` as a slice of `frame_size` samples.
    pub fn frame(&self, channel: usize, k: usize) -> &'a [f32] {
        assert!(channel < self.channel_count && k < self.frames);
        let start = (channel * self.frames + k) * self.frame_size;
        &self.data[start..start + self.frame_size]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framer(frame_size: usize, channels: usize, step: usize) -> OverlapFramer {
        let mut f = OverlapFramer::new();
        f.configure(frame_size, channels, step).unwrap();
        f
    }

    #[test]
    fn push_before_configure_is_rejected() {
        let mut f = OverlapFramer::new();
        let block = [1.0f32, 2.0];
        assert_eq!(
            f.push_block(&[&block]).err(),
            Some(EngineError::NotConfigured)
        );
    }

    #[test]
    fn channel_count_mismatch_is_rejected() {
        let mut f = framer(4, 2, 4);
        let block = [1.0f32, 2.0];
        assert_eq!(
            f.push_block(&[&block]).err(),
            Some(EngineError::ChannelCountMismatch {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn invalid_configure_parameters() {
        let mut f = OverlapFramer::new();
        assert!(f.configure(0, 1, 1).is_err());
        assert!(f.configure(4, 0, 1).is_err());
        assert!(f.configure(4, 1, 0).is_err());
        assert!(f.configure(4, 1, 5).is_err());
    }

    #[test]
    fn short_block_accumulates_into_carry() {
        let mut f = framer(8, 1, 8);
        let block = [1.0f32, 2.0, 3.0];
        let batch = f.push_block(&[&block]).unwrap();
        assert!(batch.is_empty());
        assert_eq!(f.carry_len(), 3);
    }

    #[test]
    fn plain_chunking_exact_multiple() {
        // step == frame_size: k*F samples -> k frames, no carry
        let mut f = framer(4, 1, 4);
        let block: Vec<f32> = (1..=12).map(|v| v as f32).collect();
        let batch = f.push_block(&[&block]).unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.frame(0, 0), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(batch.frame(0, 2), &[9.0, 10.0, 11.0, 12.0]);
        assert_eq!(f.carry_len(), 0);
    }

    #[test]
    fn plain_chunking_with_remainder() {
        // k*F + r samples -> k frames, carry of length r
        let mut f = framer(4, 1, 4);
        let block: Vec<f32> = (1..=10).map(|v| v as f32).collect();
        let batch = f.push_block(&[&block]).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(f.carry_len(), 2);
    }

    #[test]
    fn overlapping_frames_share_the_tail() {
        // F + step samples -> exactly 2 frames; second frame's first
        // F - step samples equal the first frame's last F - step samples
        let frame_size = 8;
        let step = 3;
        let mut f = framer(frame_size, 1, step);
        let block: Vec<f32> = (0..frame_size + step).map(|v| v as f32).collect();
        let batch = f.push_block(&[&block]).unwrap();
        assert_eq!(batch.len(), 2);
        let first = batch.frame(0, 0);
        let second = batch.frame(0, 1);
        assert_eq!(&second[..frame_size - step], &first[step..]);
    }

    #[test]
    fn no_sample_created_or_destroyed() {
        // Consumed-into-frames (counting hops) plus carry equals total input
        // across irregular block sizes, for several step/frame combinations
        for &(frame_size, step) in &[(8usize, 8usize), (8, 3), (8, 1), (5, 2)] {
            let mut f = framer(frame_size, 1, step);
            let mut pushed = 0usize;
            let mut consumed = 0usize;
            let mut next = 0f32;
            for &block_len in &[3usize, 13, 1, 0, 27, 8, 2, 19] {
                let block: Vec<f32> = (0..block_len)
                    .map(|_| {
                        next += 1.0;
                        next
                    })
                    .collect();
                pushed += block_len;
                let batch = f.push_block(&[&block]).unwrap();
                consumed += batch.len() * step;
                assert!(f.carry_len() < frame_size);
                assert_eq!(consumed + f.carry_len(), pushed);
            }
        }
    }

    #[test]
    fn frames_are_continuous_across_block_boundaries() {
        // Feed a ramp in awkward chunks; every emitted frame must be a
        // contiguous run of the ramp
        let mut f = framer(4, 1, 4);
        let ramp: Vec<f32> = (0..32).map(|v| v as f32).collect();
        let mut seen = Vec::new();
        for chunk in ramp.chunks(5) {
            let batch = f.push_block(&[chunk]).unwrap();
            for k in 0..batch.len() {
                seen.extend_from_slice(batch.frame(0, k));
            }
        }
        assert_eq!(seen, ramp[..seen.len()].to_vec());
    }

    #[test]
    fn channels_stay_aligned() {
        let mut f = framer(4, 2, 4);
        let left: Vec<f32> = (0..9).map(|v| v as f32).collect();
        let right: Vec<f32> = (0..9).map(|v| 100.0 + v as f32).collect();
        let batch = f.push_block(&[&left, &right]).unwrap();
        assert_eq!(batch.len(), 2);
        for k in 0..2 {
            let l = batch.frame(0, k);
            let r = batch.frame(1, k);
            for (a, b) in l.iter().zip(r.iter()) {
                assert_eq!(b - a, 100.0);
            }
        }
    }

    #[test]
    fn reconfigure_clears_carry() {
        let mut f = framer(8, 1, 8);
        let block = [1.0f32, 2.0, 3.0];
        f.push_block(&[&block]).unwrap();
        assert_eq!(f.carry_len(), 3);

        f.configure(8, 1, 8).unwrap();
        assert_eq!(f.carry_len(), 0);

        // Identical parameters twice behave like a single call
        f.push_block(&[&block]).unwrap();
        f.configure(8, 1, 8).unwrap();
        f.configure(8, 1, 8).unwrap();
        assert_eq!(f.carry_len(), 0);
    }

    #[test]
    fn step_one_emits_every_position() {
        let mut f = framer(4, 1, 1);
        let block: Vec<f32> = (0..6).map(|v| v as f32).collect();
        let batch = f.push_block(&[&block]).unwrap();
        // Starts at 0, 1, 2 (max_start = 3)
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.frame(0, 1), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(f.carry_len(), 3);
    }

    #[test]
    fn carry_completes_the_next_frame() {
        // F=4, step=4: push 9 samples -> frames [1..4], [5..8], carry [9];
        // push 3 more -> frame [9..12], carry empty
        let mut f = framer(4, 1, 4);
        let first: Vec<f32> = (1..=9).map(|v| v as f32).collect();
        let batch = f.push_block(&[&first]).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.frame(0, 0), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(batch.frame(0, 1), &[5.0, 6.0, 7.0, 8.0]);
        assert_eq!(f.carry_len(), 1);

        let second = [10.0f32, 11.0, 12.0];
        let batch = f.push_block(&[&second]).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.frame(0, 0), &[9.0, 10.0, 11.0, 12.0]);
        assert_eq!(f.carry_len(), 0);
    }
}
