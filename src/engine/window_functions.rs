//! Window functions for the frame transform
//!
//! Frames are tapered before the DFT to reduce spectral leakage. Coefficients
//! are precomputed once at configuration time so the streaming path never
//! touches trig.

/// Window shape applied to each frame before the transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowType {
    /// No windowing, maximum frequency resolution
    Rectangular,
    /// Good general-purpose balance (-31.5 dB sidelobes)
    Hann,
    /// Better sidelobe suppression (-41 dB) at slower rolloff
    Hamming,
    /// Excellent sidelobe suppression (-58 dB), wider main lobe
    Blackman,
}

impl WindowType {
    /// Generate window coefficients of the given length.
    pub fn generate(self, window_size: usize) -> Vec<f32> {
        if window_size < 2 {
            // apodize requires at least two points; a 1-sample window is flat
            return vec![1.0; window_size];
        }
        match self {
            Self::Rectangular => vec![1.0; window_size],
            Self::Hann => apodize::hanning_iter(window_size)
                .map(|w| w as f32)
                .collect(),
            Self::Hamming => apodize::hamming_iter(window_size)
                .map(|w| w as f32)
                .collect(),
            Self::Blackman => apodize::blackman_iter(window_size)
                .map(|w| w as f32)
                .collect(),
        }
    }

    /// Average coefficient value, used to compensate the amplitude loss the
    /// window introduces (Hann ~0.5, Blackman ~0.42, Rectangular 1.0).
    pub fn coherent_gain(self, coefficients: &[f32]) -> f32 {
        if coefficients.is_empty() {
            return 1.0;
        }
        coefficients.iter().sum::<f32>() / coefficients.len() as f32
    }
}
