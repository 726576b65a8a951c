//! Circular frame store shared between one producer and the renderer
//!
//! Per channel, the store holds the most recent `capacity` frames in a flat
//! slab of atomic samples. The producer's `append` writes slot contents and
//! only then bumps a monotonic written counter with Release ordering, so a
//! reader that has observed the counter always sees complete frames. Readers
//! snapshot the counter once per call (Acquire) and tolerate the producer
//! advancing underneath them; they simply catch up again next cycle.
//!
//! The written counter is an absolute frame count, not an index mod
//! `capacity`. The slot index is derived (`counter % capacity`), and the
//! "more than a full buffer arrived since the last read" overrun case stays
//! exactly detectable instead of aliasing.

use crate::engine::error::EngineError;
use atomic_float::AtomicF32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// One channel's slab of `capacity * frame_size` samples plus its write
/// counter; all per-channel bookkeeping lives here rather than in parallel
/// arrays.
struct ChannelRing {
    slots: Vec<AtomicF32>,
    written: AtomicU64,
}

/// Fixed-capacity per-channel circular store of frames.
///
/// Constructed through [`FrameRingStore::split`], which hands out the single
/// [`RingWriter`] and a cloneable [`RingReader`]. Reconfiguration means
/// building a fresh store; readers of the old one must re-attach.
pub struct FrameRingStore {
    channels: Vec<ChannelRing>,
    capacity: usize,
    frame_size: usize,
}

impl FrameRingStore {
    /// Allocate a store and split it into its writer/reader halves.
    pub fn split(
        channel_count: usize,
        capacity: usize,
        frame_size: usize,
    ) -> Result<(RingWriter, RingReader), EngineError> {
        if channel_count == 0 || capacity == 0 || frame_size == 0 {
            return Err(EngineError::InvalidConfiguration(format!(
                "ring store needs positive dimensions, got {} channels x {} frames x {} samples",
                channel_count, capacity, frame_size
            )));
        }

        let channels = (0..channel_count)
            .map(|_| ChannelRing {
                slots: (0..capacity * frame_size)
                    .map(|_| AtomicF32::new(0.0))
                    .collect(),
                written: AtomicU64::new(0),
            })
            .collect();

        let store = Arc::new(Self {
            channels,
            capacity,
            frame_size,
        });
        Ok((
            RingWriter {
                store: Arc::clone(&store),
            },
            RingReader { store },
        ))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Total frames ever appended to `channel`.
    fn written(&self, channel: usize) -> u64 {
        self.channels[channel].written.load(Ordering::Acquire)
    }

    /// Next slot to be overwritten, equivalently one past the most recent
    /// frame.
    pub fn write_index(&self, channel: usize) -> usize {
        (self.written(channel) % self.capacity as u64) as usize
    }

    fn check_channel(&self, channel: usize) -> Result<(), EngineError> {
        if channel >= self.channels.len() {
            return Err(EngineError::InvalidConfiguration(format!(
                "channel {} out of range for {} channels",
                channel,
                self.channels.len()
            )));
        }
        Ok(())
    }

    /// Copy `count` frames starting at absolute frame number `start` into
    /// `out`, in at most two contiguous segments around the wrap point.
    fn copy_frames(&self, channel: usize, start: u64, count: usize, out: &mut Vec<f32>) {
        let ring = &self.channels[channel];
        let capacity = self.capacity as u64;

        let mut remaining = count;
        let mut abs = start;
        while remaining > 0 {
            let slot = (abs % capacity) as usize;
            // Frames until the wrap point, then one more segment from slot 0
            let contiguous = remaining.min(self.capacity - slot);
            let base = slot * self.frame_size;
            for sample in &ring.slots[base..base + contiguous * self.frame_size] {
                out.push(sample.load(Ordering::Relaxed));
            }
            abs += contiguous as u64;
            remaining -= contiguous;
        }
    }
}

/// The sole producer handle; deliberately not `Clone` so the single-writer
/// contract is enforced by the type system.
pub struct RingWriter {
    store: Arc<FrameRingStore>,
}

impl RingWriter {
    /// Append one frame to `channel`, overwriting the oldest slot once the
    /// store is full.
    ///
    /// Slot samples are stored first; the written counter is published last
    /// with Release ordering so a reader never observes a half-written frame.
    /// Never blocks, never allocates.
    pub fn append(&self, channel: usize, frame: &[f32]) -> Result<(), EngineError> {
        let store = &self.store;
        store.check_channel(channel)?;
        if frame.len() != store.frame_size {
            return Err(EngineError::InvalidConfiguration(format!(
                "frame length {} does not match configured frame size {}",
                frame.len(),
                store.frame_size
            )));
        }

        let ring = &store.channels[channel];
        let written = ring.written.load(Ordering::Relaxed);
        let base = (written % store.capacity as u64) as usize * store.frame_size;
        for (slot, &sample) in ring.slots[base..base + store.frame_size]
            .iter()
            .zip(frame.iter())
        {
            slot.store(sample, Ordering::Relaxed);
        }
        ring.written.store(written + 1, Ordering::Release);
        Ok(())
    }

    /// Append every frame of `channel` from a flattened sequence
    /// (`frames.len()` must be a multiple of the frame size).
    pub fn append_frames(&self, channel: usize, frames: &[f32]) -> Result<(), EngineError> {
        if frames.len() % self.store.frame_size != 0 {
            return Err(EngineError::InvalidConfiguration(format!(
                "frame sequence length {} is not a multiple of frame size {}",
                frames.len(),
                self.store.frame_size
            )));
        }
        for frame in frames.chunks_exact(self.store.frame_size) {
            self.append(channel, frame)?;
        }
        Ok(())
    }

    /// Zero all slots and reset every channel's counter.
    ///
    /// Only valid while the producer is the sole party touching the store,
    /// i.e. with streaming paused; readers re-attach afterwards.
    pub fn clear(&self) {
        for ring in &self.store.channels {
            for slot in &ring.slots {
                slot.store(0.0, Ordering::Relaxed);
            }
            ring.written.store(0, Ordering::Release);
        }
    }
}

/// Read-only handle for renderers; cloneable, one [`ReadCursor`] per reader.
#[derive(Clone)]
pub struct RingReader {
    store: Arc<FrameRingStore>,
}

/// Per-channel result of one catch-up call.
pub struct ChannelCatchUp {
    /// Newly available frames, flattened oldest-to-newest
    pub frames: Vec<f32>,
    /// Number of frames in `frames`
    pub count: usize,
    /// True when this read resynchronized (fresh cursor or overrun) instead
    /// of continuing incrementally
    pub refilled: bool,
}

/// Frames returned by [`RingReader::catch_up`], indexed by channel.
pub struct CatchUp {
    pub channels: Vec<ChannelCatchUp>,
}

/// A reader's bookmark into the stream, detached until its first catch-up.
///
/// Cursors from before a reconfiguration are meaningless; obtain a fresh
/// reader and cursor instead of reusing them.
pub struct ReadCursor {
    last_seen: Vec<u64>,
    window_width: usize,
    attached: bool,
}

impl ReadCursor {
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Display window used for refill reads.
    pub fn window_width(&self) -> usize {
        self.window_width
    }
}

impl RingReader {
    pub fn capacity(&self) -> usize {
        self.store.capacity
    }

    pub fn frame_size(&self) -> usize {
        self.store.frame_size
    }

    pub fn channel_count(&self) -> usize {
        self.store.channel_count()
    }

    pub fn write_index(&self, channel: usize) -> usize {
        self.store.write_index(channel)
    }

    /// Create a detached cursor whose refill reads cover `window_width`
    /// frames, clamped to the store capacity.
    pub fn cursor(&self, window_width: usize) -> ReadCursor {
        let clamped = window_width.min(self.store.capacity).max(1);
        if clamped != window_width {
            log::warn!(
                "cursor window_width {} clamped to {}",
                window_width,
                clamped
            );
        }
        ReadCursor {
            last_seen: vec![0; self.store.channel_count()],
            window_width: clamped,
            attached: false,
        }
    }

    /// Non-destructive read of `count` frames starting at ring slot
    /// `from_slot`, wrapping through slot 0. `count == 0` is a legal no-op;
    /// `count` is clamped to the capacity. May race with a concurrent append;
    /// never indexes outside the ring.
    pub fn read_range(
        &self,
        channel: usize,
        from_slot: usize,
        count: usize,
    ) -> Result<Vec<f32>, EngineError> {
        self.store.check_channel(channel)?;
        if from_slot >= self.store.capacity {
            return Err(EngineError::InvalidConfiguration(format!(
                "read position {} out of range for capacity {}",
                from_slot, self.store.capacity
            )));
        }
        let count = count.min(self.store.capacity);
        let mut out = Vec::with_capacity(count * self.store.frame_size);
        self.store
            .copy_frames(channel, from_slot as u64, count, &mut out);
        Ok(out)
    }

    /// Pull everything that arrived since the cursor's last read.
    ///
    /// Per channel, one snapshot of the written counter is taken up front and
    /// used for the whole call. A detached cursor, or a cursor that fell more
    /// than a full capacity behind, gets a refill of the last
    /// `min(available, window_width)` frames ending at the snapshot instead
    /// of an incremental range; the `refilled` flag reports it. Two
    /// successive calls with no intervening append return an empty set the
    /// second time.
    pub fn catch_up(&self, cursor: &mut ReadCursor) -> CatchUp {
        debug_assert_eq!(cursor.last_seen.len(), self.store.channel_count());

        let capacity = self.store.capacity as u64;
        let mut channels = Vec::with_capacity(self.store.channel_count());

        for channel in 0..self.store.channel_count() {
            let snapshot = self.store.written(channel);
            let last = cursor.last_seen[channel];

            let (start, count, refilled) = if !cursor.attached || snapshot < last {
                // Fresh observation (or a cleared store): resynchronize on
                // the most recent window
                let count = snapshot.min(cursor.window_width as u64);
                (snapshot - count, count as usize, true)
            } else if snapshot - last > capacity {
                // Overrun: the producer lapped us, report a refill rather
                // than silently skipping
                log::trace!(
                    "reader overrun on channel {}: {} frames behind",
                    channel,
                    snapshot - last
                );
                let count = (snapshot - last)
                    .min(cursor.window_width as u64)
                    .min(capacity);
                (snapshot - count, count as usize, true)
            } else {
                // Incremental half-open range [last, snapshot)
                (last, (snapshot - last) as usize, false)
            };

            let mut frames = Vec::with_capacity(count * self.store.frame_size);
            self.store.copy_frames(channel, start, count, &mut frames);
            cursor.last_seen[channel] = snapshot;

            channels.push(ChannelCatchUp {
                frames,
                count,
                refilled,
            });
        }

        cursor.attached = true;
        CatchUp { channels }
    }
}
