//! # Game Module
//!
//! A full hide-and-seek run: introduce the notes, seek each one in turn,
//! then celebrate or summarize.

use serde::Serialize;
use tracing::{debug, warn};

use crate::audio::AudioIo;
use crate::config::GameConfig;
use crate::error::{SeekError, SeekResult};
use crate::pitch::PitchEstimator;
use crate::report::{GameEvent, Reporter};
use crate::round::{RoundOutcome, RoundResult, RoundSession};
use crate::tuning::Note;

/// Notes played as a small fanfare when every note was found:
/// A4 B4 C5 D5 E5, then back down.
const CELEBRATION_MELODY: [f32; 5] = [440.0, 493.9, 523.3, 587.3, 659.3];
const CELEBRATION_NOTE_SECS: f32 = 0.3;
const CELEBRATION_GAP_SECS: f32 = 0.1;

/// Running totals of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GameStats {
    pub total_attempts: u32,
    pub successful_notes: u32,
    pub total_notes: u32,
}

impl GameStats {
    /// Adds a finished round to the totals.
    pub fn record(&mut self, result: &RoundResult) {
        self.total_attempts += result.attempts.count();
        self.total_notes += 1;
        if result.outcome == RoundOutcome::Matched {
            self.successful_notes += 1;
        }
    }

    /// True when at least one note was played and all of them were found.
    pub fn all_found(&self) -> bool {
        self.total_notes > 0 && self.successful_notes == self.total_notes
    }

    /// Percentage of notes found, 0.0 when nothing was played.
    pub fn success_rate(&self) -> f32 {
        if self.total_notes == 0 {
            return 0.0;
        }
        self.successful_notes as f32 * 100.0 / self.total_notes as f32
    }
}

/// The top-level state of a hide-and-seek run.
///
/// A session owns its statistics and result log. Nothing survives between
/// calls to [`GameSession::run`].
#[derive(Debug, Clone)]
pub struct GameSession {
    config: GameConfig,
    estimator: PitchEstimator,
    results: Vec<RoundResult>,
    stats: GameStats,
}

impl GameSession {
    /// Creates a session, rejecting an invalid configuration.
    pub fn new(config: GameConfig) -> SeekResult<Self> {
        config.validate()?;
        let estimator = PitchEstimator::new(config.estimator.clone());
        Ok(Self {
            config,
            estimator,
            results: Vec::new(),
            stats: GameStats::default(),
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Rounds completed so far, in play order. After a device failure this
    /// holds the rounds that finished before it.
    pub fn results(&self) -> &[RoundResult] {
        &self.results
    }

    pub fn stats(&self) -> GameStats {
        self.stats
    }

    /// Plays a full run over `notes`, strictly in the given order.
    ///
    /// # Returns
    /// * `Ok(stats)` - The run completed
    /// * `Err(InvalidConfiguration)` - `notes` is empty; no audio was touched
    /// * `Err(Device)` - An audio call failed; the run was aborted and a
    ///   `DeviceFailure` event was announced
    pub fn run<A, R>(&mut self, audio: &mut A, reporter: &mut R, notes: &[Note]) -> SeekResult<GameStats>
    where
        A: AudioIo + ?Sized,
        R: Reporter<GameEvent> + ?Sized,
    {
        if notes.is_empty() {
            return Err(SeekError::InvalidConfiguration(
                "a run needs at least one note".to_string(),
            ));
        }

        self.results.clear();
        self.stats = GameStats::default();

        match self.play_run(audio, reporter, notes) {
            Ok(stats) => Ok(stats),
            Err(err) => {
                if let SeekError::Device(message) = &err {
                    warn!("Run aborted after {} rounds: {}", self.results.len(), message);
                    reporter.announce(&GameEvent::DeviceFailure { message: message.clone() });
                }
                Err(err)
            }
        }
    }

    fn play_run<A, R>(&mut self, audio: &mut A, reporter: &mut R, notes: &[Note]) -> SeekResult<GameStats>
    where
        A: AudioIo + ?Sized,
        R: Reporter<GameEvent> + ?Sized,
    {
        // --- Introduction ---
        for (i, note) in notes.iter().enumerate() {
            reporter.announce(&GameEvent::Introduction {
                index: i + 1,
                note: note.clone(),
            });
            audio.play(note.frequency(), self.config.intro_tone_secs)?;
            audio.rest(self.config.intro_gap_secs);
        }
        reporter.announce(&GameEvent::IntroductionDone);
        audio.rest(self.config.intro_outro_secs);

        // --- Hide and seek ---
        for note in notes {
            let result = RoundSession::new(note, &self.config, &self.estimator).run(audio, reporter)?;
            self.stats.record(&result);
            debug!(note = note.name(), outcome = ?result.outcome, stats = ?self.stats, "Round complete");
            self.results.push(result);
        }

        // --- Celebration ---
        let stats = self.stats;
        if stats.all_found() {
            reporter.announce(&GameEvent::Celebration { stats });
            if self.config.celebration_melody {
                play_celebration(audio)?;
            }
        } else {
            reporter.announce(&GameEvent::SessionSummary { stats });
        }
        Ok(stats)
    }
}

fn play_celebration<A: AudioIo + ?Sized>(audio: &mut A) -> SeekResult<()> {
    for &freq in CELEBRATION_MELODY.iter().chain(CELEBRATION_MELODY.iter().rev()) {
        audio.play(freq, CELEBRATION_NOTE_SECS)?;
        audio.rest(CELEBRATION_GAP_SECS);
    }
    Ok(())
}
