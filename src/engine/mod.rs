pub mod config;
pub mod error;
pub mod frame_tap;
pub mod framer;
pub mod pipeline;
pub mod ring_store;
pub mod transform;
pub mod window_functions;
