//! Error types for the streaming engine

use std::fmt;

/// Errors surfaced by configuration and streaming calls.
///
/// These are lightweight values suitable for the producer's real-time path;
/// none of the constructors allocate except `InvalidConfiguration`, which is
/// only ever built during (re)configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A streaming operation was attempted before `configure`
    NotConfigured,

    /// An input block's channel count disagrees with the configuration
    ChannelCountMismatch { expected: usize, actual: usize },

    /// Non-positive frame size/step/capacity, step exceeding the frame size,
    /// a wrong-length frame on append, or an out-of-range channel index
    InvalidConfiguration(String),

    /// Reconfiguration attempted while the producer is still streaming
    ReconfigurationRace,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::NotConfigured => {
                write!(f, "operation attempted before configure()")
            }
            EngineError::ChannelCountMismatch { expected, actual } => {
                write!(
                    f,
                    "channel count mismatch: configured {}, got {}",
                    expected, actual
                )
            }
            EngineError::InvalidConfiguration(msg) => {
                write!(f, "invalid configuration: {}", msg)
            }
            EngineError::ReconfigurationRace => {
                write!(f, "configure() called while streaming is enabled")
            }
        }
    }
}

impl std::error::Error for EngineError {}
