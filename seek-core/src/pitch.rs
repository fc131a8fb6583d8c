//! # Pitch Detection Module
//!
//! Estimates the fundamental frequency of one recorded attempt. The
//! estimator works on a single fixed-length buffer, not a live stream.
//!
//! ## Algorithm
//! 1. Fail fast on an invalid band or a buffer shorter than a few periods
//!    of the lowest frequency
//! 2. Take the centre of the buffer and remove its DC offset
//! 3. Noise gate: a buffer below the RMS floor is silence
//! 4. Normalized square difference function (NSDF), computed from an FFT
//!    autocorrelation and restricted to the lags of the frequency band
//! 5. Pick the first peak that comes close to the highest one
//! 6. Parabolic interpolation for sub-sample accuracy
//! 7. Confidence gate on the peak height
//!
//! ## Known limitation
//! When the player's fundamental is weak and a harmonic dominates, the
//! estimate can land an octave off. No attempt is made to correct it.

use serde::Serialize;
use tracing::debug;

use crate::audio::AudioBuffer;
use crate::config::EstimatorConfig;
use crate::fft;

/// Outcome of one estimation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PitchEstimate {
    Detected {
        /// Fundamental frequency in Hz
        frequency: f32,
        /// Periodicity strength, 0.0 to 1.0
        confidence: f32,
    },
    NotDetected,
}

impl PitchEstimate {
    pub fn frequency(&self) -> Option<f32> {
        match *self {
            PitchEstimate::Detected { frequency, .. } => Some(frequency),
            PitchEstimate::NotDetected => None,
        }
    }

    pub fn is_detected(&self) -> bool {
        matches!(self, PitchEstimate::Detected { .. })
    }
}

/// Fundamental frequency estimator. A pure function of its inputs.
#[derive(Debug, Clone, Default)]
pub struct PitchEstimator {
    config: EstimatorConfig,
}

impl PitchEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Estimates the fundamental of `buffer` within `[min_hz, max_hz]`.
    ///
    /// # Returns
    /// * `Detected` - A periodic signal was found in the band
    /// * `NotDetected` - Invalid band, short buffer, silence, or no clear
    ///   periodicity
    pub fn estimate(&self, buffer: &AudioBuffer, min_hz: f32, max_hz: f32) -> PitchEstimate {
        let config = &self.config;
        if buffer.sample_rate == 0 || !(min_hz > 0.0) || !(max_hz > min_hz) || !max_hz.is_finite() {
            debug!(min_hz, max_hz, sample_rate = buffer.sample_rate, "Invalid detection band");
            return PitchEstimate::NotDetected;
        }
        let sample_rate = buffer.sample_rate as f32;

        // The buffer must hold a few periods of the lowest frequency.
        let required = (config.min_periods * sample_rate / min_hz).ceil() as usize;
        if buffer.samples.len() < required {
            debug!(
                len = buffer.samples.len(),
                required, "Buffer too short for the detection band"
            );
            return PitchEstimate::NotDetected;
        }

        let lag_min = ((sample_rate / max_hz).floor() as usize).max(1);
        let lag_max = (sample_rate / min_hz).ceil() as usize;

        // --- Analysis window from the centre of the buffer ---
        let window_len = config.analysis_window.max(required).min(buffer.samples.len());
        if lag_max + 1 >= window_len {
            return PitchEstimate::NotDetected;
        }
        let start = (buffer.samples.len() - window_len) / 2;
        let mut frame = buffer.samples[start..start + window_len].to_vec();
        fft::remove_dc_offset(&mut frame);

        // --- Noise Gate: RMS below the floor is silence ---
        let rms = fft::rms(&frame);
        if !(rms >= config.silence_rms_floor) || rms == 0.0 {
            debug!(rms, "Below the silence floor");
            return PitchEstimate::NotDetected;
        }

        let nsdf = normalized_square_difference(&frame, lag_max + 1);

        // --- Peak picking: first key maximum near the highest one ---
        let peaks: Vec<usize> = (lag_min..=lag_max)
            .filter(|&k| nsdf[k] > 0.0 && nsdf[k] > nsdf[k - 1] && nsdf[k] >= nsdf[k + 1])
            .collect();
        let Some(highest) = peaks.iter().map(|&k| nsdf[k]).max_by(f32::total_cmp) else {
            debug!("No periodicity peak in band");
            return PitchEstimate::NotDetected;
        };
        let Some(&period) = peaks
            .iter()
            .find(|&&k| nsdf[k] >= config.peak_cutoff * highest)
        else {
            return PitchEstimate::NotDetected;
        };

        // --- Parabolic interpolation for better precision ---
        let y1 = nsdf[period - 1];
        let y2 = nsdf[period];
        let y3 = nsdf[period + 1];
        let denominator = y1 - 2.0 * y2 + y3;
        let (shift, peak_value) = if denominator.abs() > 1e-9 {
            let shift = (y1 - y3) / (2.0 * denominator);
            (shift, y2 - 0.25 * (y1 - y3) * shift)
        } else {
            (0.0, y2)
        };

        let frequency = sample_rate / (period as f32 + shift);
        let confidence = peak_value.clamp(0.0, 1.0);
        debug!(period, frequency, confidence, "Periodicity peak");

        if !frequency.is_finite() || frequency <= 0.0 {
            return PitchEstimate::NotDetected;
        }
        if confidence < config.min_confidence {
            debug!(confidence, "Peak too weak");
            return PitchEstimate::NotDetected;
        }

        PitchEstimate::Detected { frequency, confidence }
    }
}

/// NSDF for lags `0..=max_lag`.
///
/// `n(k) = 2 r(k) / m(k)`, where `r` is the autocorrelation and `m(k)` the
/// summed energy of the two overlapping segments. Values lie in [-1, 1] and
/// reach 1 for a perfectly periodic signal at its period.
fn normalized_square_difference(frame: &[f32], max_lag: usize) -> Vec<f32> {
    let n = frame.len();
    let acf = fft::autocorrelation(frame);
    let mut nsdf = vec![0.0_f32; max_lag + 1];

    let mut energy: f64 = 2.0 * frame.iter().map(|&s| f64::from(s * s)).sum::<f64>();
    nsdf[0] = 1.0;
    for k in 1..=max_lag.min(n - 1) {
        energy -= f64::from(frame[k - 1] * frame[k - 1]) + f64::from(frame[n - k] * frame[n - k]);
        nsdf[k] = if energy > 0.0 {
            (2.0 * f64::from(acf[k]) / energy) as f32
        } else {
            0.0
        };
    }
    nsdf
}
