//! # Configuration Module
//!
//! Session settings are passed explicitly into `GameSession` and
//! `ScaleDetective`. Every field has a default, so a partial JSON file is
//! enough to override a single knob.

use serde::{Deserialize, Serialize};

use crate::error::{SeekError, SeekResult};

/// Tuning knobs for the pitch estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Minimum RMS (after DC removal) for a buffer to count as signal.
    pub silence_rms_floor: f32,
    /// Estimates below this confidence are reported as `NotDetected`.
    pub min_confidence: f32,
    /// A peak must reach this fraction of the highest peak to be chosen.
    pub peak_cutoff: f32,
    /// Periods of the lowest frequency a buffer must hold.
    pub min_periods: f32,
    /// Number of samples analysed from the centre of the buffer.
    pub analysis_window: usize,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            silence_rms_floor: 0.01,
            min_confidence: 0.6,
            peak_cutoff: 0.93,
            min_periods: 3.0,
            analysis_window: 8192,
        }
    }
}

impl EstimatorConfig {
    pub fn validate(&self) -> SeekResult<()> {
        if !(self.silence_rms_floor >= 0.0 && self.silence_rms_floor.is_finite()) {
            return Err(invalid("silence_rms_floor must be a finite value >= 0"));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(invalid("min_confidence must be within [0, 1]"));
        }
        if !(self.peak_cutoff > 0.0 && self.peak_cutoff <= 1.0) {
            return Err(invalid("peak_cutoff must be within (0, 1]"));
        }
        if !(self.min_periods >= 1.0 && self.min_periods.is_finite()) {
            return Err(invalid("min_periods must be at least 1"));
        }
        if self.analysis_window < 64 {
            return Err(invalid("analysis_window must hold at least 64 samples"));
        }
        Ok(())
    }
}

/// Settings for one hide-and-seek run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Allowed distance from the target, in cents. Inclusive.
    pub tolerance_cents: f32,
    /// Sample rate requested from the recording device.
    pub sample_rate: u32,
    pub intro_tone_secs: f32,
    pub intro_gap_secs: f32,
    /// Pause between the introduction and the first round.
    pub intro_outro_secs: f32,
    pub target_tone_secs: f32,
    pub record_secs: f32,
    /// Lower edge of the detection band in Hz.
    pub min_hz: f32,
    /// Upper edge of the detection band in Hz.
    pub max_hz: f32,
    /// Play the target again before the second attempt.
    pub replay_on_retry: bool,
    /// Play a short melody when every note was found.
    pub celebration_melody: bool,
    pub estimator: EstimatorConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tolerance_cents: 40.0,
            sample_rate: 44_100,
            intro_tone_secs: 1.0,
            intro_gap_secs: 0.5,
            intro_outro_secs: 2.0,
            target_tone_secs: 2.0,
            record_secs: 3.0,
            min_hz: 190.0,
            max_hz: 1000.0,
            replay_on_retry: true,
            celebration_melody: true,
            estimator: EstimatorConfig::default(),
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> SeekResult<()> {
        if !(self.tolerance_cents > 0.0 && self.tolerance_cents.is_finite()) {
            return Err(invalid(format!(
                "tolerance must be a positive number of cents, got {}",
                self.tolerance_cents
            )));
        }
        if self.sample_rate == 0 {
            return Err(invalid("sample_rate must be positive"));
        }
        positive("intro_tone_secs", self.intro_tone_secs)?;
        positive("target_tone_secs", self.target_tone_secs)?;
        positive("record_secs", self.record_secs)?;
        non_negative("intro_gap_secs", self.intro_gap_secs)?;
        non_negative("intro_outro_secs", self.intro_outro_secs)?;
        if !(self.min_hz > 0.0 && self.max_hz > self.min_hz && self.max_hz.is_finite()) {
            return Err(invalid(format!(
                "detection band must satisfy 0 < min_hz < max_hz, got [{}, {}]",
                self.min_hz, self.max_hz
            )));
        }
        self.estimator.validate()
    }
}

/// Settings for the Scale Detective exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectiveConfig {
    /// How far the hidden note is detuned, in cents.
    pub cents_off: f32,
    /// Require the player to say whether the note was sharp or flat.
    pub hard_mode: bool,
    pub note_secs: f32,
    pub note_gap_secs: f32,
}

impl Default for DetectiveConfig {
    fn default() -> Self {
        Self {
            cents_off: 50.0,
            hard_mode: false,
            note_secs: 1.0,
            note_gap_secs: 0.2,
        }
    }
}

impl DetectiveConfig {
    pub fn validate(&self) -> SeekResult<()> {
        positive("cents_off", self.cents_off)?;
        positive("note_secs", self.note_secs)?;
        non_negative("note_gap_secs", self.note_gap_secs)
    }
}

fn invalid(message: impl Into<String>) -> SeekError {
    SeekError::InvalidConfiguration(message.into())
}

fn positive(name: &str, value: f32) -> SeekResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be positive, got {value}")))
    }
}

fn non_negative(name: &str, value: f32) -> SeekResult<()> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(invalid(format!("{name} must not be negative, got {value}")))
    }
}
