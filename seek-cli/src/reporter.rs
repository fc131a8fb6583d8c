//! Renders game events for the player.

use std::io::Write;

use serde::Serialize;
use tracing::warn;

use seek_core::report::{DetectiveEvent, GameEvent, Reporter};
use seek_core::round::Attempt;
use seek_core::scale::{Mistake, ReplayRole};
use seek_core::GameStats;

/// Friendly console text on stdout.
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl Reporter<GameEvent> for ConsoleReporter {
    fn announce(&mut self, event: &GameEvent) {
        match event {
            GameEvent::Introduction { index, note } => {
                if *index == 1 {
                    println!("\n🎵 Let's play Hide and Seek with these notes:");
                }
                println!("  {}. {} ({:.1} Hz)", index, note.name(), note.frequency());
            }
            GameEvent::IntroductionDone => {
                println!("\nNow I'll hide one note at a time. Listen carefully and try to match it!");
            }
            GameEvent::RoundStart { note } => println!("\n🎵 Playing: {}", note.name()),
            GameEvent::Recording { attempt, seconds } => match attempt {
                Attempt::First => println!("🎤 Your turn! Listening for {seconds:.0} seconds..."),
                Attempt::Second => println!("Try again:"),
            },
            GameEvent::Feedback {
                attempt,
                matched,
                cents_offset,
                detected_hz,
            } => {
                if let (Some(hz), Some(cents)) = (detected_hz, cents_offset) {
                    println!("   (heard {hz:.1} Hz, {cents:+.0} cents)");
                } else {
                    println!("   (no clear pitch heard)");
                }
                match (attempt, matched) {
                    (Attempt::First, true) => println!("✅ Perfect! You found the hidden note!"),
                    (Attempt::First, false) => println!("❌ Not quite right. Let me play it again..."),
                    (Attempt::Second, true) => println!("✅ Great! You got it on the second try!"),
                    (Attempt::Second, false) => println!("❌ Let's move on to the next note..."),
                }
            }
            // Feedback has already said everything about the round.
            GameEvent::RoundFinal { .. } => {}
            GameEvent::SessionSummary { stats } => {
                print_results(stats);
                println!(
                    "\nGood job! You found {} out of {} notes.",
                    stats.successful_notes, stats.total_notes
                );
                println!("Keep practicing and you'll get better!");
                println!("\nThanks for playing Hide and Seek! 🎵");
            }
            GameEvent::Celebration { stats } => {
                print_results(stats);
                println!("\n🎉🎉🎉 CONGRATULATIONS! 🎉🎉🎉");
                println!("You found all the hidden notes!");
                println!("🎵🎵🎵🎵🎵🎵🎵🎵🎵🎵🎵🎵🎵🎵🎵🎵");
                println!("\nThanks for playing Hide and Seek! 🎵");
            }
            GameEvent::DeviceFailure { message } => {
                eprintln!("\n⚠️  Audio device failure: {message}");
            }
        }
    }
}

fn print_results(stats: &GameStats) {
    println!("\n🎯 Game Results:");
    println!("   Notes found: {}/{}", stats.successful_notes, stats.total_notes);
    println!("   Total attempts: {}", stats.total_attempts);
    println!("   Success rate: {:.1}%", stats.success_rate());
}

impl Reporter<DetectiveEvent> for ConsoleReporter {
    fn announce(&mut self, event: &DetectiveEvent) {
        match event {
            DetectiveEvent::NotePlayed { position, total } => println!("Note {position}/{total}"),
            DetectiveEvent::Correct { .. } => {
                println!("✅ Correct! That note was in tune.");
                println!("Let's continue...\n");
            }
            DetectiveEvent::FalseAlarm { .. } => {
                println!("❌ Not quite right. That note was actually in tune.");
                println!("Let's continue...\n");
            }
            DetectiveEvent::Victory { .. } => {
                println!("🎉 Well done! You found the out-of-tune note!");
                println!("\n🎉 Victory! Here's what you heard:");
            }
            DetectiveEvent::GameOver {
                note,
                sharp,
                cents,
                mistake,
            } => {
                match mistake {
                    Mistake::Missed => println!("❌ GAME OVER! You missed the out-of-tune note."),
                    Mistake::WrongDirection => println!(
                        "❌ GAME OVER! You found the out-of-tune note but got the direction wrong."
                    ),
                    Mistake::NeverFound => println!(
                        "❌ GAME OVER! You went through the whole scale without finding the out-of-tune note."
                    ),
                }
                let direction = if *sharp { "sharp" } else { "flat" };
                println!("The {} was {direction} by {cents} cents.", note.name());
                println!("\nKeep practicing! Your ear will get stronger! 🎵");
                println!("\n🎵 Here's the scale with the correction:");
            }
            DetectiveEvent::ReplayNote { note, role } => match role {
                ReplayRole::Plain => println!("  {}", note.name()),
                ReplayRole::OutOfTune => println!("  {} (out of tune)", note.name()),
                ReplayRole::Corrected => println!("  {} (correct)", note.name()),
            },
            DetectiveEvent::DeviceFailure { message } => {
                eprintln!("\n⚠️  Audio device failure: {message}");
            }
        }
    }
}

/// One JSON object per line, for scripts and other front ends.
#[derive(Debug)]
pub struct JsonReporter<W: Write> {
    out: W,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write, E: Serialize> Reporter<E> for JsonReporter<W> {
    fn announce(&mut self, event: &E) {
        let written = serde_json::to_writer(&mut self.out, event)
            .map_err(std::io::Error::from)
            .and_then(|()| writeln!(self.out))
            .and_then(|()| self.out.flush());
        if let Err(err) = written {
            warn!("Failed to write event: {}", err);
        }
    }
}
