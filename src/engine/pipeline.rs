//! Producer-side orchestration: framer -> transform -> ring store
//!
//! The pipeline owns the pieces the acquisition thread drives and carries the
//! host's enable/disable acquisition state. Reconfiguration is only legal
//! while disabled; that explicit paused state is what serializes `configure`
//! against `process_block` and renderer reads, instead of internal locking.

use crate::engine::config::ScanConfig;
use crate::engine::error::EngineError;
use crate::engine::frame_tap::{FrameTap, FrameTapConsumer};
use crate::engine::framer::OverlapFramer;
use crate::engine::ring_store::{FrameRingStore, RingReader, RingWriter};
use crate::engine::transform::FrameTransform;

pub struct ScanPipeline {
    config: Option<ScanConfig>,
    framer: OverlapFramer,
    transform: Box<dyn FrameTransform>,

    // Rebuilt on every reconfiguration; readers from before a reconfigure
    // keep the old storage alive but must re-attach through reader()
    writer: Option<RingWriter>,
    reader: Option<RingReader>,

    tap: FrameTap,
    tap_consumer: FrameTapConsumer,

    // Scratch for one transformed frame, preallocated at configure time
    transformed: Vec<f32>,

    enabled: bool,
}

impl ScanPipeline {
    /// Build an unconfigured, disabled pipeline around a transform.
    pub fn new(transform: Box<dyn FrameTransform>) -> Self {
        let (tap, tap_consumer) = FrameTap::new();
        Self {
            config: None,
            framer: OverlapFramer::new(),
            transform,
            writer: None,
            reader: None,
            tap,
            tap_consumer,
            transformed: Vec::new(),
            enabled: false,
        }
    }

    /// Apply a configuration, rebuilding the framer and the ring store.
    ///
    /// Must be called while disabled; a configure racing active streaming is
    /// rejected rather than resolved. All carry-over and ring contents are
    /// cleared, and previously handed-out readers and cursors become stale:
    /// the renderer re-attaches via [`ScanPipeline::reader`].
    pub fn configure(&mut self, config: ScanConfig) -> Result<(), EngineError> {
        if self.enabled {
            return Err(EngineError::ReconfigurationRace);
        }
        let config = config.validated()?;

        // A fixed-size transform (e.g. a planned DFT) only accepts frames of
        // the length it was built for
        if let Some(expected) = self.transform.expected_input_len() {
            if expected != config.frame_size {
                return Err(EngineError::InvalidConfiguration(format!(
                    "transform expects {}-sample frames, configured frame_size is {}",
                    expected, config.frame_size
                )));
            }
        }

        self.framer
            .configure(config.frame_size, config.channel_count, config.step)?;

        // The ring stores transformed frames, which may differ in length
        // from the input frames (e.g. DFT bins)
        let stored_frame_size = self.transform.output_len(config.frame_size);
        let (writer, reader) =
            FrameRingStore::split(config.channel_count, config.capacity, stored_frame_size)?;

        log::debug!(
            "pipeline configured: {:?}, stored frame size {}",
            config,
            stored_frame_size
        );

        self.transformed = vec![0.0; stored_frame_size];
        self.writer = Some(writer);
        self.reader = Some(reader);
        self.config = Some(config);
        Ok(())
    }

    /// Start accepting blocks. Errors when never configured.
    pub fn enable(&mut self) -> Result<(), EngineError> {
        if self.config.is_none() {
            return Err(EngineError::NotConfigured);
        }
        self.enabled = true;
        Ok(())
    }

    /// Stop accepting blocks; blocks pushed while disabled are discarded.
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Feed one sample block through framing, the transform, and the ring
    /// store. Returns the number of frames produced per channel.
    ///
    /// While disabled the block is discarded and 0 returned: a paused
    /// producer is not acquiring. Before any configuration this is an error.
    pub fn process_block(&mut self, block: &[&[f32]]) -> Result<usize, EngineError> {
        let (config, writer) = match (self.config.as_ref(), self.writer.as_ref()) {
            (Some(config), Some(writer)) => (config, writer),
            _ => return Err(EngineError::NotConfigured),
        };
        if !self.enabled {
            return Ok(0);
        }
        let monitor_channel = config.monitor_channel;
        let batch = self.framer.push_block(block)?;

        for k in 0..batch.len() {
            for channel in 0..batch.channel_count() {
                let frame = batch.frame(channel, k);
                if channel == monitor_channel {
                    self.tap.publish(frame);
                }
                self.transform.process(frame, &mut self.transformed);
                writer.append(channel, &self.transformed)?;
            }
        }
        Ok(batch.len())
    }

    /// A fresh reader onto the current ring store.
    pub fn reader(&self) -> Result<RingReader, EngineError> {
        self.reader.clone().ok_or(EngineError::NotConfigured)
    }

    /// Consumer end of the monitor tap (stable across reconfigurations).
    pub fn tap_consumer(&self) -> FrameTapConsumer {
        self.tap_consumer.clone()
    }

    /// Effective configuration, if any.
    pub fn config(&self) -> Option<&ScanConfig> {
        self.config.as_ref()
    }

    /// Default display window for readers, from the configuration.
    pub fn window_width(&self) -> Result<usize, EngineError> {
        self.config
            .as_ref()
            .map(|c| c.window_width)
            .ok_or(EngineError::NotConfigured)
    }
}
