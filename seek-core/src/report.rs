//! # Reporting Module
//!
//! Everything the player sees flows through a [`Reporter`] as an event.
//! The core never prints; front ends decide how events are rendered.

use serde::Serialize;

use crate::game::GameStats;
use crate::round::{Attempt, RoundResult};
use crate::scale::{Mistake, ReplayRole};
use crate::tuning::Note;

/// Receives progress events. Fire-and-forget: nothing is returned to the
/// caller.
pub trait Reporter<E> {
    fn announce(&mut self, event: &E);
}

/// Collects every event, in order. Handy for tests and replays.
#[derive(Debug, Clone)]
pub struct EventLog<E> {
    pub events: Vec<E>,
}

impl<E> Default for EventLog<E> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<E: Clone> Reporter<E> for EventLog<E> {
    fn announce(&mut self, event: &E) {
        self.events.push(event.clone());
    }
}

/// Events of a hide-and-seek run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    /// A note of the run is presented. `index` starts at 1.
    Introduction { index: usize, note: Note },
    /// All notes have been presented; the rounds are about to begin.
    IntroductionDone,
    RoundStart { note: Note },
    /// The microphone is open for `seconds`.
    Recording { attempt: Attempt, seconds: f32 },
    Feedback {
        attempt: Attempt,
        matched: bool,
        cents_offset: Option<f32>,
        detected_hz: Option<f32>,
    },
    RoundFinal { result: RoundResult },
    /// End of a run where at least one note was missed.
    SessionSummary { stats: GameStats },
    /// End of a run where every note was found.
    Celebration { stats: GameStats },
    /// The run was aborted by an audio device failure.
    DeviceFailure { message: String },
}

/// Events of a Scale Detective game.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DetectiveEvent {
    /// A scale note is about to be judged. `position` starts at 1.
    NotePlayed { position: usize, total: usize },
    /// The player rightly said an in-tune note was in tune.
    Correct { position: usize },
    /// The player flagged an in-tune note.
    FalseAlarm { position: usize },
    Victory { note: Note, sharp: bool, cents: f32 },
    GameOver { note: Note, sharp: bool, cents: f32, mistake: Mistake },
    /// A note of the closing replay.
    ReplayNote { note: Note, role: ReplayRole },
    DeviceFailure { message: String },
}
