//! # Round Module
//!
//! One target note: play it, record an attempt, judge it, and allow a
//! single retry. The round is an explicit state machine. [`RoundState::advance`]
//! is the pure transition out of `Judging`, so a round always ends after
//! one or two attempts.

use serde::{Serialize, Serializer};
use tracing::debug;

use crate::audio::AudioIo;
use crate::cents::{self, Verdict};
use crate::config::GameConfig;
use crate::error::SeekResult;
use crate::pitch::PitchEstimator;
use crate::report::{GameEvent, Reporter};
use crate::tuning::Note;

/// Which attempt of a round. A round has at most two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    First,
    Second,
}

impl Attempt {
    /// 1 or 2.
    pub fn count(self) -> u32 {
        match self {
            Attempt::First => 1,
            Attempt::Second => 2,
        }
    }
}

impl Serialize for Attempt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.count())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundOutcome {
    Matched,
    MissedTwice,
}

/// The record of one finished round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundResult {
    pub note: Note,
    pub attempts: Attempt,
    pub outcome: RoundOutcome,
}

/// States of a round. `Matched` and `MissedFinal` are terminal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoundState {
    AwaitingFirstAttempt,
    Judging { attempt: Attempt, verdict: Verdict },
    AwaitingSecondAttempt,
    Matched(Attempt),
    MissedFinal,
}

impl RoundState {
    /// Transition out of `Judging`. Every other state is returned as is.
    pub fn advance(self) -> RoundState {
        match self {
            RoundState::Judging { attempt, verdict } if verdict.matched => RoundState::Matched(attempt),
            RoundState::Judging { attempt: Attempt::First, .. } => RoundState::AwaitingSecondAttempt,
            RoundState::Judging { attempt: Attempt::Second, .. } => RoundState::MissedFinal,
            other => other,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RoundState::Matched(_) | RoundState::MissedFinal)
    }
}

/// Drives one target note to a [`RoundResult`].
pub struct RoundSession<'a> {
    note: &'a Note,
    config: &'a GameConfig,
    estimator: &'a PitchEstimator,
}

impl<'a> RoundSession<'a> {
    pub fn new(note: &'a Note, config: &'a GameConfig, estimator: &'a PitchEstimator) -> Self {
        Self { note, config, estimator }
    }

    /// Runs the round to completion.
    ///
    /// A device error aborts the round and is returned as is. It is never
    /// counted as a miss.
    pub fn run<A, R>(&self, audio: &mut A, reporter: &mut R) -> SeekResult<RoundResult>
    where
        A: AudioIo + ?Sized,
        R: Reporter<GameEvent> + ?Sized,
    {
        reporter.announce(&GameEvent::RoundStart { note: self.note.clone() });

        let mut state = RoundState::AwaitingFirstAttempt;
        loop {
            state = match state {
                RoundState::AwaitingFirstAttempt => {
                    audio.play(self.note.frequency(), self.config.target_tone_secs)?;
                    self.listen(Attempt::First, audio, reporter)?
                }
                RoundState::AwaitingSecondAttempt => self.listen(Attempt::Second, audio, reporter)?,
                RoundState::Judging { attempt, verdict } => {
                    reporter.announce(&GameEvent::Feedback {
                        attempt,
                        matched: verdict.matched,
                        cents_offset: verdict.cents_offset,
                        detected_hz: verdict.detected_hz,
                    });
                    let next = state.advance();
                    if next == RoundState::AwaitingSecondAttempt && self.config.replay_on_retry {
                        audio.play(self.note.frequency(), self.config.target_tone_secs)?;
                    }
                    next
                }
                RoundState::Matched(attempts) => {
                    return Ok(self.finish(attempts, RoundOutcome::Matched, reporter));
                }
                RoundState::MissedFinal => {
                    return Ok(self.finish(Attempt::Second, RoundOutcome::MissedTwice, reporter));
                }
            };
        }
    }

    /// Records one attempt and judges it.
    fn listen<A, R>(&self, attempt: Attempt, audio: &mut A, reporter: &mut R) -> SeekResult<RoundState>
    where
        A: AudioIo + ?Sized,
        R: Reporter<GameEvent> + ?Sized,
    {
        let config = self.config;
        reporter.announce(&GameEvent::Recording {
            attempt,
            seconds: config.record_secs,
        });
        let buffer = audio.record(config.record_secs, config.sample_rate)?;

        let estimate = self.estimator.estimate(&buffer, config.min_hz, config.max_hz);
        let verdict = cents::compare(self.note.frequency(), &estimate, config.tolerance_cents);
        debug!(
            note = self.note.name(),
            attempt = attempt.count(),
            ?estimate,
            ?verdict,
            "Attempt judged"
        );

        Ok(RoundState::Judging { attempt, verdict })
    }

    fn finish<R>(&self, attempts: Attempt, outcome: RoundOutcome, reporter: &mut R) -> RoundResult
    where
        R: Reporter<GameEvent> + ?Sized,
    {
        let result = RoundResult {
            note: self.note.clone(),
            attempts,
            outcome,
        };
        reporter.announce(&GameEvent::RoundFinal { result: result.clone() });
        result
    }
}
