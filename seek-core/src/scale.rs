//! # Scale Detective Module
//!
//! The A major scale is played one note at a time, and one note (never the
//! first) is detuned sharp or flat. After each note the player says whether
//! it sounded in tune. In hard mode they must also say which way it was off.
//!
//! The game ends on the first decision about the hidden note, or when the
//! scale runs out. A closing replay then lets the player hear the detuned
//! note next to its correction.

use rand::Rng;
use serde::Serialize;
use tracing::{debug, warn};

use crate::audio::AudioIo;
use crate::cents;
use crate::config::DetectiveConfig;
use crate::error::{SeekError, SeekResult};
use crate::report::{DetectiveEvent, Reporter};
use crate::tuning::{self, Note};

/// The player's call on one note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    InTune,
    OutOfTune,
    /// Out of tune, too high.
    Higher,
    /// Out of tune, too low.
    Lower,
}

impl Answer {
    /// The direction the player claims, if any.
    fn claimed_sharp(self) -> Option<bool> {
        match self {
            Answer::Higher => Some(true),
            Answer::Lower => Some(false),
            Answer::InTune | Answer::OutOfTune => None,
        }
    }
}

/// Where the player's answers come from.
pub trait AnswerSource {
    /// Answer for the note at `position` (1-based).
    fn answer(&mut self, position: usize) -> SeekResult<Answer>;
}

/// Why a game was lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mistake {
    /// The hidden note was called in tune.
    Missed,
    /// The hidden note was found but the direction was wrong.
    WrongDirection,
    /// The scale ended without the hidden note being flagged.
    NeverFound,
}

/// Role of a note in the closing replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayRole {
    Plain,
    OutOfTune,
    Corrected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectiveOutcome {
    Victory,
    GameOver(Mistake),
}

/// Which scale note is detuned, and which way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HiddenNote {
    /// Index into the scale, never 0.
    pub index: usize,
    pub sharp: bool,
}

/// Result of judging one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Keep going. `correct` tells whether the answer about this note was right.
    Continue { correct: bool },
    Finish(DetectiveOutcome),
}

/// Judges one answer. Pure.
pub fn judge(hard_mode: bool, is_hidden: bool, sharp: bool, answer: Answer) -> Step {
    if hard_mode {
        match (is_hidden, answer.claimed_sharp()) {
            (true, Some(claimed)) if claimed == sharp => Step::Finish(DetectiveOutcome::Victory),
            (true, Some(_)) => Step::Finish(DetectiveOutcome::GameOver(Mistake::WrongDirection)),
            (true, None) => Step::Finish(DetectiveOutcome::GameOver(Mistake::Missed)),
            (false, Some(_)) => Step::Continue { correct: false },
            (false, None) => Step::Continue { correct: true },
        }
    } else {
        let flagged = answer != Answer::InTune;
        match (is_hidden, flagged) {
            (true, true) => Step::Finish(DetectiveOutcome::Victory),
            (true, false) => Step::Finish(DetectiveOutcome::GameOver(Mistake::Missed)),
            (false, flagged) => Step::Continue { correct: !flagged },
        }
    }
}

pub struct ScaleDetective {
    config: DetectiveConfig,
    scale: Vec<Note>,
}

impl ScaleDetective {
    /// A game over the A major scale.
    pub fn new(config: DetectiveConfig) -> SeekResult<Self> {
        Self::with_scale(config, tuning::a_major_scale())
    }

    pub fn with_scale(config: DetectiveConfig, scale: Vec<Note>) -> SeekResult<Self> {
        config.validate()?;
        if scale.len() < 2 {
            return Err(SeekError::InvalidConfiguration(
                "a scale needs at least two notes".to_string(),
            ));
        }
        Ok(Self { config, scale })
    }

    pub fn scale(&self) -> &[Note] {
        &self.scale
    }

    /// Picks the hidden note: any note but the first, sharp or flat.
    pub fn hide<R: Rng + ?Sized>(&self, rng: &mut R) -> HiddenNote {
        HiddenNote {
            index: rng.gen_range(1..self.scale.len()),
            sharp: rng.gen_bool(0.5),
        }
    }

    fn detuned_frequency(&self, hidden: HiddenNote) -> f32 {
        let cents = if hidden.sharp {
            self.config.cents_off
        } else {
            -self.config.cents_off
        };
        cents::detune(self.scale[hidden.index].frequency(), cents)
    }

    /// Plays a game with a given hidden note.
    pub fn run<A, S, R>(
        &self,
        hidden: HiddenNote,
        audio: &mut A,
        answers: &mut S,
        reporter: &mut R,
    ) -> SeekResult<DetectiveOutcome>
    where
        A: AudioIo + ?Sized,
        S: AnswerSource + ?Sized,
        R: Reporter<DetectiveEvent> + ?Sized,
    {
        if hidden.index == 0 || hidden.index >= self.scale.len() {
            return Err(SeekError::InvalidConfiguration(format!(
                "hidden note index {} is outside 1..{}",
                hidden.index,
                self.scale.len()
            )));
        }

        match self.play_game(hidden, audio, answers, reporter) {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                if let SeekError::Device(message) = &err {
                    warn!("Scale game aborted: {}", message);
                    reporter.announce(&DetectiveEvent::DeviceFailure { message: message.clone() });
                }
                Err(err)
            }
        }
    }

    fn play_game<A, S, R>(
        &self,
        hidden: HiddenNote,
        audio: &mut A,
        answers: &mut S,
        reporter: &mut R,
    ) -> SeekResult<DetectiveOutcome>
    where
        A: AudioIo + ?Sized,
        S: AnswerSource + ?Sized,
        R: Reporter<DetectiveEvent> + ?Sized,
    {
        let detuned = self.detuned_frequency(hidden);
        let total = self.scale.len();
        debug!(index = hidden.index, sharp = hidden.sharp, detuned, "Hidden note chosen");

        let mut outcome = DetectiveOutcome::GameOver(Mistake::NeverFound);
        for (i, note) in self.scale.iter().enumerate() {
            let position = i + 1;
            let is_hidden = i == hidden.index;
            reporter.announce(&DetectiveEvent::NotePlayed { position, total });

            let freq = if is_hidden { detuned } else { note.frequency() };
            audio.play(freq, self.config.note_secs)?;

            let answer = answers.answer(position)?;
            match judge(self.config.hard_mode, is_hidden, hidden.sharp, answer) {
                Step::Continue { correct: true } => {
                    reporter.announce(&DetectiveEvent::Correct { position });
                }
                Step::Continue { correct: false } => {
                    reporter.announce(&DetectiveEvent::FalseAlarm { position });
                }
                Step::Finish(finished) => {
                    outcome = finished;
                    break;
                }
            }
            audio.rest(self.config.note_gap_secs);
        }

        let note = self.scale[hidden.index].clone();
        let (sharp, cents) = (hidden.sharp, self.config.cents_off);
        match outcome {
            DetectiveOutcome::Victory => {
                reporter.announce(&DetectiveEvent::Victory { note, sharp, cents });
                // What the player heard, twice as fast as the game itself.
                self.replay(hidden, detuned, self.config.note_secs / 2.0, audio, reporter)?;
            }
            DetectiveOutcome::GameOver(mistake) => {
                reporter.announce(&DetectiveEvent::GameOver { note, sharp, cents, mistake });
                self.replay(hidden, detuned, self.config.note_secs, audio, reporter)?;
            }
        }
        Ok(outcome)
    }

    /// Plays the scale with the detuned note followed by its correction.
    /// The hidden pair plays at `pair_secs`, the other notes twice as fast.
    fn replay<A, R>(
        &self,
        hidden: HiddenNote,
        detuned: f32,
        pair_secs: f32,
        audio: &mut A,
        reporter: &mut R,
    ) -> SeekResult<()>
    where
        A: AudioIo + ?Sized,
        R: Reporter<DetectiveEvent> + ?Sized,
    {
        let gap = self.config.note_gap_secs;
        for (i, note) in self.scale.iter().enumerate() {
            if i == hidden.index {
                for (role, freq) in [
                    (ReplayRole::OutOfTune, detuned),
                    (ReplayRole::Corrected, note.frequency()),
                ] {
                    reporter.announce(&DetectiveEvent::ReplayNote { note: note.clone(), role });
                    audio.play(freq, pair_secs)?;
                    audio.rest(gap);
                }
            } else {
                reporter.announce(&DetectiveEvent::ReplayNote {
                    note: note.clone(),
                    role: ReplayRole::Plain,
                });
                audio.play(note.frequency(), pair_secs / 2.0)?;
                audio.rest(gap / 2.0);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn easy_mode_decisions() {
        assert_eq!(
            judge(false, true, true, Answer::OutOfTune),
            Step::Finish(DetectiveOutcome::Victory)
        );
        assert_eq!(
            judge(false, true, false, Answer::InTune),
            Step::Finish(DetectiveOutcome::GameOver(Mistake::Missed))
        );
        assert_eq!(judge(false, false, true, Answer::InTune), Step::Continue { correct: true });
        assert_eq!(
            judge(false, false, true, Answer::OutOfTune),
            Step::Continue { correct: false }
        );
    }

    #[test]
    fn hard_mode_needs_the_direction() {
        assert_eq!(
            judge(true, true, true, Answer::Higher),
            Step::Finish(DetectiveOutcome::Victory)
        );
        assert_eq!(
            judge(true, true, false, Answer::Lower),
            Step::Finish(DetectiveOutcome::Victory)
        );
        assert_eq!(
            judge(true, true, true, Answer::Lower),
            Step::Finish(DetectiveOutcome::GameOver(Mistake::WrongDirection))
        );
        assert_eq!(
            judge(true, true, true, Answer::OutOfTune),
            Step::Finish(DetectiveOutcome::GameOver(Mistake::Missed))
        );
        assert_eq!(judge(true, false, true, Answer::Higher), Step::Continue { correct: false });
        assert_eq!(judge(true, false, true, Answer::OutOfTune), Step::Continue { correct: true });
    }

    #[test]
    fn hidden_note_is_never_the_first() {
        let game = ScaleDetective::new(DetectiveConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let hidden = game.hide(&mut rng);
            assert!(hidden.index >= 1 && hidden.index < game.scale().len());
        }
    }

    #[test]
    fn detuning_follows_the_direction() {
        let game = ScaleDetective::new(DetectiveConfig::default()).unwrap();
        let target = game.scale()[3].frequency();
        let sharp = game.detuned_frequency(HiddenNote { index: 3, sharp: true });
        let flat = game.detuned_frequency(HiddenNote { index: 3, sharp: false });
        assert!((cents::cents_offset(sharp, target) - 50.0).abs() < 1e-2);
        assert!((cents::cents_offset(flat, target) + 50.0).abs() < 1e-2);
    }

    #[test]
    fn rejects_a_one_note_scale() {
        let scale = vec![Note::new("A4", 440.0).unwrap()];
        assert!(ScaleDetective::with_scale(DetectiveConfig::default(), scale).is_err());
    }
}
