//! Configuration surface exposed to the host

use crate::engine::error::EngineError;

/// Parameters for the full framing + storage pipeline.
///
/// Frame size is an explicit value set here, once, and is never derived from
/// any per-channel attribute. Reconfiguring with a new `ScanConfig` clears all
/// carry-over and ring contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Number of input channels; fixed until the next reconfiguration
    pub channel_count: usize,

    /// Samples per frame (one transform window / one display column)
    pub frame_size: usize,

    /// Advance between consecutive frame starts; `step == frame_size` means
    /// plain chunking, `step < frame_size` means overlapping frames
    pub step: usize,

    /// Ring capacity in frames per channel
    pub capacity: usize,

    /// Display window width in frames used by refill reads; clamped to
    /// `capacity` when larger
    pub window_width: usize,

    /// Channel whose raw frames are published to the monitor tap
    pub monitor_channel: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            channel_count: 2,
            frame_size: 2048,
            // 50% overlap
            step: 1024,
            capacity: 480,
            window_width: 480,
            monitor_channel: 0,
        }
    }
}

impl ScanConfig {
    /// Check every parameter and return the effective configuration.
    ///
    /// `window_width` larger than `capacity` is clamped rather than rejected;
    /// everything else out of range is an error.
    pub fn validated(mut self) -> Result<Self, EngineError> {
        if self.channel_count == 0 {
            return Err(EngineError::InvalidConfiguration(
                "channel_count must be positive".into(),
            ));
        }
        if self.frame_size == 0 {
            return Err(EngineError::InvalidConfiguration(
                "frame_size must be positive".into(),
            ));
        }
        if self.step == 0 || self.step > self.frame_size {
            return Err(EngineError::InvalidConfiguration(format!(
                "step must be in 1..={}, got {}",
                self.frame_size, self.step
            )));
        }
        if self.capacity == 0 {
            return Err(EngineError::InvalidConfiguration(
                "capacity must be positive".into(),
            ));
        }
        if self.window_width == 0 {
            return Err(EngineError::InvalidConfiguration(
                "window_width must be positive".into(),
            ));
        }
        if self.monitor_channel >= self.channel_count {
            return Err(EngineError::InvalidConfiguration(format!(
                "monitor_channel {} out of range for {} channels",
                self.monitor_channel, self.channel_count
            )));
        }
        if self.window_width > self.capacity {
            log::warn!(
                "window_width {} exceeds ring capacity {}, clamping",
                self.window_width,
                self.capacity
            );
            self.window_width = self.capacity;
        }
        Ok(self)
    }

    /// Overlap between consecutive frames, `frame_size - step`.
    pub fn overlap(&self) -> usize {
        self.frame_size - self.step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ScanConfig {
        ScanConfig {
            channel_count: 1,
            frame_size: 8,
            step: 8,
            capacity: 4,
            window_width: 4,
            monitor_channel: 0,
        }
    }

    #[test]
    fn default_is_valid() {
        assert!(ScanConfig::default().validated().is_ok());
    }

    #[test]
    fn rejects_zero_frame_size() {
        let cfg = ScanConfig {
            frame_size: 0,
            ..base()
        };
        assert!(matches!(
            cfg.validated(),
            Err(EngineError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn rejects_step_above_frame_size() {
        let cfg = ScanConfig { step: 9, ..base() };
        assert!(cfg.validated().is_err());
    }

    #[test]
    fn rejects_zero_step_and_capacity() {
        assert!(ScanConfig { step: 0, ..base() }.validated().is_err());
        assert!(ScanConfig {
            capacity: 0,
            ..base()
        }
        .validated()
        .is_err());
    }

    #[test]
    fn rejects_monitor_channel_out_of_range() {
        let cfg = ScanConfig {
            monitor_channel: 1,
            ..base()
        };
        assert!(cfg.validated().is_err());
    }

    #[test]
    fn clamps_window_width_to_capacity() {
        let cfg = ScanConfig {
            window_width: 9,
            ..base()
        };
        assert_eq!(cfg.validated().unwrap().window_width, 4);
    }

    #[test]
    fn overlap_is_frame_size_minus_step() {
        let cfg = ScanConfig {
            frame_size: 8,
            step: 6,
            ..base()
        };
        assert_eq!(cfg.overlap(), 2);
    }
}
