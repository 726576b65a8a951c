//! Streaming frame assembly and circular frame storage for multi-channel
//! scan displays.
//!
//! An acquisition thread pushes variable-length sample blocks into a
//! [`ScanPipeline`]. The pipeline reassembles them into fixed-size,
//! possibly overlapping frames with [`OverlapFramer`], runs each frame
//! through a [`FrameTransform`] (identity passthrough or a windowed DFT),
//! and appends the result to a per-channel [`FrameRingStore`] holding the
//! most recent frames. A display thread holds a [`RingReader`] and a
//! [`ReadCursor`] and calls [`RingReader::catch_up`] once per refresh to
//! pull exactly the frames it has not seen yet, without blocking the
//! producer.
//!
//! ```
//! use bscan_stream::{IdentityTransform, ScanConfig, ScanPipeline};
//!
//! let mut pipeline = ScanPipeline::new(Box::new(IdentityTransform));
//! pipeline
//!     .configure(ScanConfig {
//!         channel_count: 1,
//!         frame_size: 4,
//!         step: 4,
//!         capacity: 3,
//!         window_width: 3,
//!         monitor_channel: 0,
//!     })
//!     .unwrap();
//! pipeline.enable().unwrap();
//!
//! let reader = pipeline.reader().unwrap();
//! let mut cursor = reader.cursor(3);
//!
//! let block: Vec<f32> = (1..=9).map(|v| v as f32).collect();
//! pipeline.process_block(&[&block]).unwrap();
//!
//! let caught = reader.catch_up(&mut cursor);
//! assert_eq!(caught.channels[0].count, 2);
//! ```

mod engine;

pub use engine::config::ScanConfig;
pub use engine::error::EngineError;
pub use engine::frame_tap::{FrameTap, FrameTapConsumer};
pub use engine::framer::{FrameBatch, OverlapFramer};
pub use engine::pipeline::ScanPipeline;
pub use engine::ring_store::{
    CatchUp, ChannelCatchUp, FrameRingStore, ReadCursor, RingReader, RingWriter,
};
pub use engine::transform::{DftTransform, FrameTransform, IdentityTransform};
pub use engine::window_functions::WindowType;
