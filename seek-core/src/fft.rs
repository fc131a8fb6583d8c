//! # Fast Fourier Transform (FFT) Module
//!
//! Signal conditioning and FFT-based autocorrelation for the pitch estimator.
//!
//! ## Features
//! - DC offset removal for accurate periodicity analysis
//! - Linear autocorrelation via RustFFT (Wiener-Khinchin)

use rustfft::{num_complex::Complex, FftPlanner};

/// Removes the DC offset from a signal by making its average value zero.
///
/// A constant bias adds the same positive term to every autocorrelation
/// lag and flattens the periodicity peaks. Centering the signal keeps
/// the peaks at their true relative height.
///
/// # Arguments
/// * `signal` - Audio signal to process (modified in-place)
pub fn remove_dc_offset(signal: &mut [f32]) {
    let len = signal.len();
    if len == 0 {
        return;
    }
    let avg = signal.iter().sum::<f32>() / len as f32;
    if avg.abs() > 1e-6 {
        for sample in signal.iter_mut() {
            *sample -= avg;
        }
    }
}

/// Root mean square of a signal. Returns 0.0 for an empty slice.
pub fn rms(signal: &[f32]) -> f32 {
    if signal.is_empty() {
        return 0.0;
    }
    (signal.iter().map(|&s| s * s).sum::<f32>() / signal.len() as f32).sqrt()
}

/// Computes the linear (non-circular) autocorrelation of a signal.
///
/// The signal is zero-padded to at least twice its length so the circular
/// correlation of the FFT does not wrap around. Entry `k` of the result is
/// `sum(x[i] * x[i + k])` for `k` in `0..signal.len()`.
///
/// # Arguments
/// * `signal` - Input audio signal of any length
///
/// # Returns
/// * `Vec<f32>` - Autocorrelation for every lag, same length as the input
pub fn autocorrelation(signal: &[f32]) -> Vec<f32> {
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }

    let fft_len = (2 * n).next_power_of_two();
    let mut planner = FftPlanner::new();
    let forward = planner.plan_fft_forward(fft_len);
    let inverse = planner.plan_fft_inverse(fft_len);

    let mut buffer: Vec<Complex<f32>> = signal
        .iter()
        .map(|&sample| Complex { re: sample, im: 0.0 })
        .chain(std::iter::repeat(Complex { re: 0.0, im: 0.0 }))
        .take(fft_len)
        .collect();

    forward.process(&mut buffer);
    // The power spectrum is the transform of the autocorrelation.
    for bin in buffer.iter_mut() {
        *bin = Complex { re: bin.norm_sqr(), im: 0.0 };
    }
    inverse.process(&mut buffer);

    // RustFFT does not normalize the inverse transform.
    let scale = 1.0 / fft_len as f32;
    buffer.iter().take(n).map(|c| c.re * scale).collect()
}
