// seek-core/src/lib.rs

//! The core logic of the pitch hide-and-seek trainer.
//! This crate holds tone synthesis, pitch estimation, cents comparison
//! and the game state machines. It never prints: everything the player
//! sees is announced through a [`report::Reporter`].

pub mod audio;
pub mod cents;
pub mod config;
pub mod error;
pub mod fft;
pub mod game;
pub mod pitch;
pub mod report;
pub mod round;
pub mod scale;
pub mod tuning;

pub use audio::{AudioBuffer, AudioIo, CpalAudio};
pub use config::{DetectiveConfig, EstimatorConfig, GameConfig};
pub use error::{SeekError, SeekResult};
pub use game::{GameSession, GameStats};
pub use pitch::{PitchEstimate, PitchEstimator};
pub use report::{DetectiveEvent, EventLog, GameEvent, Reporter};
pub use round::{Attempt, RoundOutcome, RoundResult};
pub use scale::{Answer, AnswerSource, DetectiveOutcome, HiddenNote, ScaleDetective};
pub use tuning::Note;
