//! # Error Module
//!
//! Failures that can end a session. A missed or silent attempt is not an
//! error: it is a `PitchEstimate::NotDetected` and counts as a miss.

use thiserror::Error;

pub type SeekResult<T> = Result<T, SeekError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SeekError {
    /// The audio device failed to play or record. Fatal to the current run.
    #[error("audio device error: {0}")]
    Device(String),

    /// Rejected before any audio I/O takes place.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The player's answers could not be read.
    #[error("answer input failed: {0}")]
    Input(String),
}

impl SeekError {
    pub fn is_device(&self) -> bool {
        matches!(self, SeekError::Device(_))
    }
}
