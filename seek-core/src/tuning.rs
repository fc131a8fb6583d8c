//! # Musical Tuning Module
//!
//! Note names and equal-temperament frequencies (A4 = 440 Hz) for the game.
//!
//! ## Features
//! - 88-key note table (A0 to C8) with sharp names
//! - Note name to frequency lookups
//! - Nearest-note lookup for feedback on a detected pitch
//! - The violin range from open A to A on the E string
//! - The A major scale used by both exercises
//! - Random note sequences for a hide-and-seek run

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::error::{SeekError, SeekResult};

/// A named pitch. The frequency is always positive and finite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Note {
    name: String,
    frequency: f32,
}

impl Note {
    /// Creates a note, rejecting a frequency that is not a positive number.
    pub fn new(name: impl Into<String>, frequency: f32) -> SeekResult<Self> {
        let name = name.into();
        if !(frequency > 0.0 && frequency.is_finite()) {
            return Err(SeekError::InvalidConfiguration(format!(
                "note {name} has invalid frequency {frequency}"
            )));
        }
        Ok(Self { name, frequency })
    }

    /// Note name (e.g., "A4", "C#5")
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Frequency in Hz
    pub fn frequency(&self) -> f32 {
        self.frequency
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.1} Hz)", self.name, self.frequency)
    }
}

/// Statically computed notes for a standard 88-key piano (A0 to C8).
///
/// Frequencies follow equal temperament with A4 = 440 Hz. The table is
/// built once, on first use.
static NOTES: Lazy<Vec<Note>> = Lazy::new(|| {
    const PITCH_CLASSES: [&str; 12] = [
        "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
    ];

    // Piano keys are MIDI numbers 21 (A0) to 108 (C8); MIDI 69 is A4.
    PIANO_KEYS
        .map(|midi: u32| {
            let name = format!("{}{}", PITCH_CLASSES[(midi % 12) as usize], midi / 12 - 1);
            let semitones_from_a4 = f64::from(midi) - 69.0;
            let frequency = (440.0 * 2.0_f64.powf(semitones_from_a4 / 12.0)) as f32;
            Note { name, frequency }
        })
        .collect()
});

const PIANO_KEYS: std::ops::RangeInclusive<u32> = 21..=108;

/// Note name to key index.
static NOTE_MAP: Lazy<BTreeMap<String, usize>> = Lazy::new(|| {
    NOTES
        .iter()
        .enumerate()
        .map(|(i, note)| (note.name.clone(), i))
        .collect()
});

const A_MAJOR_SCALE: [&str; 8] = ["A4", "B4", "C#5", "D5", "E5", "F#5", "G#5", "A5"];

/// Looks up a note by name, e.g. "A4" or "C#5". Flats are not recognized.
pub fn find_note(name: &str) -> Option<Note> {
    NOTE_MAP.get(name).map(|&i| NOTES[i].clone())
}

/// Finds the closest note to a given frequency.
///
/// # Arguments
/// * `freq` - Input frequency in Hz
///
/// # Returns
/// * The closest note, or `None` if `freq` is not a positive number
pub fn nearest_note(freq: f32) -> Option<Note> {
    if !(freq > 0.0 && freq.is_finite()) {
        return None;
    }
    NOTES
        .iter()
        .min_by(|a, b| {
            let diff_a = (a.frequency - freq).abs();
            let diff_b = (b.frequency - freq).abs();
            diff_a.total_cmp(&diff_b)
        })
        .cloned()
}

/// Every chromatic note from open A (A4) to A on the E string (A5).
pub fn violin_range() -> Vec<Note> {
    let start = NOTE_MAP["A4"];
    let end = NOTE_MAP["A5"];
    NOTES[start..=end].to_vec()
}

/// A4 B4 C#5 D5 E5 F#5 G#5 A5, ascending.
pub fn a_major_scale() -> Vec<Note> {
    A_MAJOR_SCALE
        .iter()
        .filter_map(|name| find_note(name))
        .collect()
}

/// Draws the notes for a hide-and-seek run.
///
/// Picks `distinct` notes from `pool` at random, uses each of them at
/// least once, fills the remainder of `length` with random picks from the
/// same subset, and shuffles the result.
pub fn draw_sequence<R: Rng + ?Sized>(
    rng: &mut R,
    pool: &[Note],
    distinct: usize,
    length: usize,
) -> SeekResult<Vec<Note>> {
    if distinct == 0 || length == 0 {
        return Err(SeekError::InvalidConfiguration(
            "a run needs at least one note".to_string(),
        ));
    }
    if distinct > pool.len() {
        return Err(SeekError::InvalidConfiguration(format!(
            "cannot pick {distinct} distinct notes from {} available",
            pool.len()
        )));
    }
    if length < distinct {
        return Err(SeekError::InvalidConfiguration(format!(
            "a sequence of {length} notes cannot hold {distinct} distinct notes"
        )));
    }

    let chosen: Vec<Note> = pool.choose_multiple(rng, distinct).cloned().collect();
    let mut sequence = chosen.clone();
    while sequence.len() < length {
        // `chosen` is non-empty, checked above.
        if let Some(note) = chosen.choose(rng) {
            sequence.push(note.clone());
        }
    }
    sequence.shuffle(rng);
    Ok(sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn reference_frequencies() {
        assert!((find_note("A4").unwrap().frequency() - 440.0).abs() < 0.1);
        assert!((find_note("C4").unwrap().frequency() - 261.6).abs() < 0.1);
        assert!((find_note("E5").unwrap().frequency() - 659.3).abs() < 0.1);
        assert!((find_note("A5").unwrap().frequency() - 880.0).abs() < 0.1);
        assert!(find_note("H2").is_none());
    }

    #[test]
    fn table_spans_the_keyboard() {
        assert_eq!(NOTES.len(), 88);
        assert_eq!(NOTES[0].name(), "A0");
        assert_eq!(NOTES[87].name(), "C8");
        assert!(NOTES.iter().all(|n| n.frequency() > 0.0));
    }

    #[test]
    fn octave_numbers_change_at_c() {
        let b3 = NOTE_MAP["B3"];
        assert_eq!(NOTE_MAP["C4"], b3 + 1);
        assert_eq!(find_note("A4").unwrap().frequency(), 440.0);
        for pair in NOTES.windows(2) {
            let ratio = pair[1].frequency() / pair[0].frequency();
            assert!((ratio - 2.0_f32.powf(1.0 / 12.0)).abs() < 1e-5);
        }
    }

    #[test]
    fn nearest_note_snaps_to_the_closest_key() {
        assert_eq!(nearest_note(445.0).unwrap().name(), "A4");
        assert_eq!(nearest_note(460.0).unwrap().name(), "A#4");
        assert!(nearest_note(0.0).is_none());
        assert!(nearest_note(f32::NAN).is_none());
    }

    #[test]
    fn violin_range_is_open_a_to_a() {
        let range = violin_range();
        assert_eq!(range.len(), 13);
        assert_eq!(range.first().unwrap().name(), "A4");
        assert_eq!(range.last().unwrap().name(), "A5");
        assert!(range.windows(2).all(|w| w[0].frequency() < w[1].frequency()));
    }

    #[test]
    fn a_major_scale_has_eight_notes() {
        let names: Vec<String> = a_major_scale().iter().map(|n| n.name().to_string()).collect();
        assert_eq!(names, A_MAJOR_SCALE);
    }

    #[test]
    fn note_rejects_non_positive_frequency() {
        assert!(Note::new("X", 0.0).is_err());
        assert!(Note::new("X", -440.0).is_err());
        assert!(Note::new("X", f32::INFINITY).is_err());
        assert!(Note::new("A4", 440.0).is_ok());
    }

    #[test]
    fn sequence_uses_every_distinct_note() {
        let mut rng = StdRng::seed_from_u64(7);
        let pool = a_major_scale();
        let sequence = draw_sequence(&mut rng, &pool, 4, 8).unwrap();
        assert_eq!(sequence.len(), 8);

        let mut names: Vec<&str> = sequence.iter().map(Note::name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 4);
        assert!(sequence.iter().all(|n| pool.contains(n)));
    }

    #[test]
    fn sequence_is_reproducible_with_a_seed() {
        let pool = a_major_scale();
        let a = draw_sequence(&mut StdRng::seed_from_u64(42), &pool, 3, 6).unwrap();
        let b = draw_sequence(&mut StdRng::seed_from_u64(42), &pool, 3, 6).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn sequence_rejects_impossible_requests() {
        let mut rng = StdRng::seed_from_u64(1);
        let pool = a_major_scale();
        assert!(draw_sequence(&mut rng, &pool, 0, 4).is_err());
        assert!(draw_sequence(&mut rng, &pool, 2, 0).is_err());
        assert!(draw_sequence(&mut rng, &pool, 9, 9).is_err());
        assert!(draw_sequence(&mut rng, &pool, 4, 3).is_err());
    }
}
