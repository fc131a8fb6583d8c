//! # Cents Comparison Module
//!
//! Cents are a logarithmic unit of pitch:
//! - 100 cents = 1 semitone
//! - 1200 cents = 1 octave
//! - Positive values are sharp, negative values are flat

use serde::Serialize;

use crate::pitch::PitchEstimate;

/// Which way a detected pitch sits relative to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Sharp,
    Flat,
    InTune,
}

/// Judgement of one attempt against its target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Verdict {
    /// Signed distance from the target. `None` when no pitch was detected.
    pub cents_offset: Option<f32>,
    pub matched: bool,
    /// The frequency the offset was computed from.
    pub detected_hz: Option<f32>,
}

impl Verdict {
    /// The failing verdict for an attempt with no usable pitch.
    pub fn missing() -> Self {
        Self {
            cents_offset: None,
            matched: false,
            detected_hz: None,
        }
    }

    /// Direction of the miss, if a pitch was detected.
    pub fn direction(&self) -> Option<Direction> {
        self.cents_offset.map(|cents| {
            if cents > 0.0 {
                Direction::Sharp
            } else if cents < 0.0 {
                Direction::Flat
            } else {
                Direction::InTune
            }
        })
    }
}

/// Slack on the tolerance bound. An f32 frequency carries roughly 1e-4
/// cents of rounding, so a pitch built exactly at the bound still matches.
pub const CENTS_EPSILON: f64 = 1e-3;

/// Calculates the deviation of `freq` from `target_freq` in cents.
///
/// # Returns
/// * Cent deviation (positive = sharp, negative = flat)
pub fn cents_offset(freq: f32, target_freq: f32) -> f32 {
    cents_offset_f64(freq, target_freq) as f32
}

fn cents_offset_f64(freq: f32, target_freq: f32) -> f64 {
    1200.0 * (f64::from(freq) / f64::from(target_freq)).log2()
}

/// Shifts `freq` by `cents`: `freq * 2^(cents / 1200)`.
pub fn detune(freq: f32, cents: f32) -> f32 {
    (f64::from(freq) * 2.0_f64.powf(f64::from(cents) / 1200.0)) as f32
}

/// Compares a detected pitch with its target.
///
/// A `NotDetected` estimate never matches and carries no offset. The
/// tolerance bound is inclusive, up to [`CENTS_EPSILON`], and the offset is
/// not rounded.
pub fn compare(target_hz: f32, detected: &PitchEstimate, tolerance_cents: f32) -> Verdict {
    match detected.frequency() {
        Some(frequency) if frequency > 0.0 && target_hz > 0.0 => {
            let offset = cents_offset_f64(frequency, target_hz);
            if !offset.is_finite() {
                return Verdict::missing();
            }
            // Normalize -0.0 so an exact match always reports +0.
            let offset = if offset == 0.0 { 0.0 } else { offset };
            Verdict {
                cents_offset: Some(offset as f32),
                matched: offset.abs() <= f64::from(tolerance_cents) + CENTS_EPSILON,
                detected_hz: Some(frequency),
            }
        }
        _ => Verdict::missing(),
    }
}
