//! The frame transform seam
//!
//! The engine only guarantees correctly framed input; what happens to each
//! frame before it reaches the ring store is pluggable. [`DftTransform`] is
//! the stock implementation (window -> real FFT -> magnitudes in dB), and
//! [`IdentityTransform`] passes frames through untouched for raw displays.

use crate::engine::window_functions::WindowType;
use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};
use std::sync::Arc;

/// Floor for dB conversion, prevents log(0)
const MAGNITUDE_FLOOR_DB: f32 = -120.0;

/// Per-frame transform applied between the framer and the ring store.
///
/// Implementations must be deterministic in output length: every input frame
/// of the configured size produces exactly `output_len(frame_size)` samples.
pub trait FrameTransform: Send {
    /// Number of samples produced for one input frame of `frame_size` samples.
    fn output_len(&self, frame_size: usize) -> usize;

    /// Input frame length this transform was planned for, or `None` when any
    /// length is accepted. Checked against the configured frame size at
    /// pipeline configuration.
    fn expected_input_len(&self) -> Option<usize> {
        None
    }

    /// Transform one frame into `output`, which is sized to
    /// `output_len(frame.len())`. Called once per frame on the producer's
    /// schedule; must not allocate.
    fn process(&mut self, frame: &[f32], output: &mut [f32]);
}

/// Passthrough transform for displays that render raw frames.
pub struct IdentityTransform;

impl FrameTransform for IdentityTransform {
    fn output_len(&self, frame_size: usize) -> usize {
        frame_size
    }

    fn process(&mut self, frame: &[f32], output: &mut [f32]) {
        output.copy_from_slice(frame);
    }
}

/// Windowed real-DFT magnitude transform.
///
/// Each frame becomes `frame_size / 2 + 1` magnitude values in dB, suitable
/// for one spectrogram column.
pub struct DftTransform {
    fft: Arc<dyn RealToComplex<f32>>,

    // Buffers, preallocated so process() stays allocation-free
    input_buffer: Vec<f32>,        // windowed samples
    output_buffer: Vec<Complex32>, // size/2 + 1 bins

    // Window coefficients precomputed at construction
    window: Vec<f32>,
    coherent_gain: f32,

    size: usize,
}

impl DftTransform {
    pub fn new(frame_size: usize, window_type: WindowType) -> Self {
        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(frame_size);

        let window = window_type.generate(frame_size);
        let coherent_gain = window_type.coherent_gain(&window);

        // Real FFT of size N produces N/2 + 1 complex outputs
        let output_buffer = vec![Complex32::new(0.0, 0.0); frame_size / 2 + 1];

        Self {
            fft,
            input_buffer: vec![0.0; frame_size],
            output_buffer,
            window,
            coherent_gain,
            size: frame_size,
        }
    }
}

impl FrameTransform for DftTransform {
    fn output_len(&self, frame_size: usize) -> usize {
        frame_size / 2 + 1
    }

    fn expected_input_len(&self) -> Option<usize> {
        Some(self.size)
    }

    fn process(&mut self, frame: &[f32], output: &mut [f32]) {
        // The plan is fixed-size; configuration rejects mismatched frames
        debug_assert_eq!(frame.len(), self.size);

        // Step 1: apply the window while copying into the FFT input
        for ((dst, &sample), &coeff) in self
            .input_buffer
            .iter_mut()
            .zip(frame.iter())
            .zip(self.window.iter())
        {
            *dst = sample * coeff;
        }

        // Step 2: time domain -> frequency domain
        if self
            .fft
            .process(&mut self.input_buffer, &mut self.output_buffer)
            .is_err()
        {
            // Skip this frame rather than panic on the producer's schedule
            output.fill(MAGNITUDE_FLOOR_DB);
            return;
        }

        // Step 3: magnitudes in dB, compensating for the window's
        // amplitude loss
        let scale = 1.0 / ((self.size as f32) * self.coherent_gain);
        for (value, bin) in output.iter_mut().zip(self.output_buffer.iter()) {
            let amplitude = bin.norm() * scale;
            *value = if amplitude > 1e-10 {
                20.0 * libm::log10f(amplitude)
            } else {
                MAGNITUDE_FLOOR_DB
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    #[test]
    fn identity_copies_frame() {
        let mut transform = IdentityTransform;
        let frame = [1.0, -2.0, 3.0, -4.0];
        let mut out = [0.0; 4];
        transform.process(&frame, &mut out);
        assert_eq!(out, frame);
        assert_eq!(transform.output_len(4), 4);
    }

    #[test]
    fn dft_output_len_is_half_plus_one() {
        let transform = DftTransform::new(256, WindowType::Hann);
        assert_eq!(transform.output_len(256), 129);
    }

    #[test]
    fn dft_reports_its_planned_frame_size() {
        let transform = DftTransform::new(64, WindowType::Hann);
        assert_eq!(transform.expected_input_len(), Some(64));
        assert_eq!(IdentityTransform.expected_input_len(), None);
    }

    #[test]
    fn dft_peaks_at_sine_bin() {
        const SIZE: usize = 256;
        let mut transform = DftTransform::new(SIZE, WindowType::Hann);

        // Sine exactly on bin 16 (16 cycles over the frame)
        let frame: Vec<f32> = (0..SIZE)
            .map(|n| (TAU * 16.0 * n as f32 / SIZE as f32).sin())
            .collect();

        let mut out = vec![0.0; SIZE / 2 + 1];
        transform.process(&frame, &mut out);

        let peak_bin = out
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak_bin, 16);

        // Distant bins sit far below the peak
        assert!(out[16] - out[100] > 40.0);
    }

    #[test]
    fn dft_silence_hits_the_floor() {
        const SIZE: usize = 64;
        let mut transform = DftTransform::new(SIZE, WindowType::Blackman);
        let frame = vec![0.0; SIZE];
        let mut out = vec![0.0; SIZE / 2 + 1];
        transform.process(&frame, &mut out);
        assert!(out.iter().all(|&db| db == MAGNITUDE_FLOOR_DB));
    }
}
