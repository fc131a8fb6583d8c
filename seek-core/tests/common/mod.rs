#![allow(dead_code)]

use std::collections::VecDeque;

use seek_core::scale::{Answer, AnswerSource};
use seek_core::{AudioBuffer, AudioIo, DetectiveConfig, GameConfig, SeekError, SeekResult};

pub const SAMPLE_RATE: u32 = 44_100;

/// An [`AudioIo`] that replays scripted recordings and logs every call.
/// Once the script runs out it records silence.
#[derive(Debug, Default)]
pub struct ScriptedAudio {
    recordings: VecDeque<SeekResult<AudioBuffer>>,
    pub plays: Vec<(f32, f32)>,
    pub rests: Vec<f32>,
    pub records: usize,
    /// Fail the play call with this index (0-based).
    pub fail_play_at: Option<usize>,
}

impl ScriptedAudio {
    pub fn new(recordings: Vec<SeekResult<AudioBuffer>>) -> Self {
        Self {
            recordings: recordings.into(),
            ..Self::default()
        }
    }

    /// Records silence and fails the play call with index `index` (0-based).
    pub fn failing_play_at(index: usize) -> Self {
        Self {
            fail_play_at: Some(index),
            ..Self::default()
        }
    }

    /// A player who sings the given frequencies, one per attempt.
    pub fn singing(frequencies: &[f32]) -> Self {
        Self::new(frequencies.iter().map(|&f| Ok(tone(f))).collect())
    }
}

impl AudioIo for ScriptedAudio {
    fn play(&mut self, frequency_hz: f32, duration_secs: f32) -> SeekResult<()> {
        if self.fail_play_at == Some(self.plays.len()) {
            return Err(SeekError::Device("output stream closed".to_string()));
        }
        self.plays.push((frequency_hz, duration_secs));
        Ok(())
    }

    fn record(&mut self, duration_secs: f32, sample_rate: u32) -> SeekResult<AudioBuffer> {
        self.records += 1;
        self.recordings
            .pop_front()
            .unwrap_or_else(|| Ok(AudioBuffer::silence(duration_secs.min(0.5), sample_rate)))
    }

    fn rest(&mut self, secs: f32) {
        self.rests.push(secs);
    }
}

/// Half a second of a clean sine.
pub fn tone(frequency: f32) -> AudioBuffer {
    AudioBuffer::sine(frequency, 0.5, SAMPLE_RATE, 0.5)
}

pub fn silence() -> AudioBuffer {
    AudioBuffer::silence(0.5, SAMPLE_RATE)
}

/// Answers from a script, then "in tune" forever.
#[derive(Debug, Default)]
pub struct ScriptedAnswers {
    answers: VecDeque<SeekResult<Answer>>,
    pub asked: Vec<usize>,
}

impl ScriptedAnswers {
    pub fn new(answers: &[Answer]) -> Self {
        Self {
            answers: answers.iter().map(|&a| Ok(a)).collect(),
            asked: Vec::new(),
        }
    }

    pub fn failing() -> Self {
        Self {
            answers: VecDeque::from([Err(SeekError::Input("stdin closed".to_string()))]),
            asked: Vec::new(),
        }
    }
}

impl AnswerSource for ScriptedAnswers {
    fn answer(&mut self, position: usize) -> SeekResult<Answer> {
        self.asked.push(position);
        self.answers.pop_front().unwrap_or(Ok(Answer::InTune))
    }
}

/// Default game settings with the pauses and the melody turned off.
pub fn quick_config() -> GameConfig {
    GameConfig {
        intro_gap_secs: 0.0,
        intro_outro_secs: 0.0,
        celebration_melody: false,
        ..GameConfig::default()
    }
}

pub fn quick_detective(hard_mode: bool) -> DetectiveConfig {
    DetectiveConfig {
        hard_mode,
        note_gap_secs: 0.0,
        ..DetectiveConfig::default()
    }
}
